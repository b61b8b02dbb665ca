use clap::Parser;
use recoserve_tonic_server::server::{
    bootstrap::{self, Subsystem},
    config::{CliArgs, ServerConfig},
    model::load_engine,
    profiler::spawn_runtime_profiler,
    serve_with_incoming,
    service::handler::RecommendationHandler,
    telemetry::{init_telemetry, init_tracer},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    // The tracer must exist before the subscriber is installed; its outcome
    // is logged once logging is up.
    let tracer = bootstrap::start(
        Subsystem::Tracer,
        &config.features,
        Subsystem::Tracer.retry_policy(),
        || async { init_tracer() },
    )
    .await;
    let providers = init_telemetry(tracer.value().cloned(), config.log_format)?;

    log_startup_info(&config);
    tracer.log(Subsystem::Tracer);

    let profiler = bootstrap::start(
        Subsystem::Profiler,
        &config.features,
        Subsystem::Profiler.retry_policy(),
        || async { spawn_runtime_profiler(config.profiler_interval) },
    )
    .await;
    profiler.log(Subsystem::Profiler);

    let engine = load_engine(&config)?;
    let handler = RecommendationHandler::new(
        Arc::new(engine),
        config.num_workers,
        config.shutdown_timeout,
    );

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let result = serve_with_incoming(
        TcpListenerStream::new(listener),
        handler,
        &config.features,
        shutdown_signal(),
    )
    .await;

    if let Some(handle) = profiler.into_option() {
        handle.abort();
    }
    providers.shutdown();

    result
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting recommendation service on {} with full config: {:#?}",
            config.listen_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting recommendation service on {} with {} workers (catalog at {})",
            config.listen_addr,
            config.num_workers,
            config.catalog_addr
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                core::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = core::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            core::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
