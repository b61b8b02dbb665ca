use crate::server::bootstrap::{OptionalFeatures, Subsystem};
use crate::server::telemetry::LogFormat;
use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use core::time::Duration;
use std::ffi::OsString;
use recoserve_tonic_core::recoserve::{DEFAULT_FALLBACK, DEFAULT_TOP_K, FallbackList};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Runtime configuration for the `recoserve-tonic-server` binary.
///
/// Every setting can be given as a CLI flag or as an environment variable;
/// a `.env` file in the working directory is loaded first.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "recoserve-tonic-server",
    version,
    about = "A gRPC service that recommends catalog products"
)]
pub struct CliArgs {
    /// Host address to listen on.
    ///
    /// Environment variable: `HOST`
    #[arg(long, env = "HOST", default_value = "::")]
    pub host: IpAddr,

    /// TCP port to listen on.
    ///
    /// Environment variable: `PORT`
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Address of the product catalog service. Required: the server refuses
    /// to start without it.
    ///
    /// Environment variable: `PRODUCT_CATALOG_SERVICE_ADDR`
    #[arg(long, env = "PRODUCT_CATALOG_SERVICE_ADDR")]
    pub product_catalog_service_addr: Option<String>,

    /// Number of worker tasks serving recommendation calls.
    ///
    /// Calls beyond this many in flight wait for a free worker.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 10)]
    pub num_workers: usize,

    /// Path to the JSON model artifact produced by the training job.
    ///
    /// Without it the server runs an untrained model and every call is
    /// answered from the fallback list.
    ///
    /// Environment variable: `MODEL_PATH`
    #[arg(long, env = "MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Size of the user universe when no model artifact is given.
    ///
    /// Environment variable: `NUM_USERS`
    #[arg(long, env = "NUM_USERS", default_value_t = 943)]
    pub num_users: u64,

    /// Maximum number of products per response.
    ///
    /// Environment variable: `TOP_K`
    #[arg(long, env = "TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Products served, in order, when ranking is unavailable.
    ///
    /// Environment variable: `FALLBACK_PRODUCT_IDS` (comma separated)
    #[arg(
        long,
        env = "FALLBACK_PRODUCT_IDS",
        value_delimiter = ',',
        default_values_t = DEFAULT_FALLBACK.map(String::from)
    )]
    pub fallback_product_ids: Vec<String>,

    /// Seconds to wait for in-flight calls to finish during shutdown.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: u64,

    /// Seconds between two profiler samples.
    ///
    /// Environment variable: `PROFILER_INTERVAL`
    #[arg(long, env = "PROFILER_INTERVAL", default_value_t = 60)]
    pub profiler_interval: u64,

    /// Console log format.
    ///
    /// Environment variable: `LOG_FORMAT` (`json` or `pretty`)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// Do not start the runtime profiler.
    ///
    /// Setting `DISABLE_PROFILER` to any value, even an empty one, does the
    /// same.
    #[arg(long, action = ArgAction::SetTrue)]
    pub disable_profiler: bool,

    /// Do not start the OpenTelemetry tracer.
    ///
    /// Setting `DISABLE_TRACING` to any value, even an empty one, does the
    /// same.
    #[arg(long, action = ArgAction::SetTrue)]
    pub disable_tracing: bool,

    /// Do not expose the gRPC reflection (debugging) service.
    ///
    /// Setting `DISABLE_DEBUGGER` to any value, even an empty one, does the
    /// same.
    #[arg(long, action = ArgAction::SetTrue)]
    pub disable_debugger: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub catalog_addr: String,
    pub num_workers: usize,
    pub model_path: Option<PathBuf>,
    pub num_users: u64,
    pub top_k: usize,
    pub fallback: FallbackList,
    pub shutdown_timeout: Duration,
    pub profiler_interval: Duration,
    pub log_format: LogFormat,
    pub features: OptionalFeatures,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        Self::from_args(args, |var| std::env::var_os(var))
    }
}

impl ServerConfig {
    /// Validates `args`. Opt-out variables are looked up through `env`: a
    /// subsystem is disabled when its variable is present, whatever the
    /// value.
    pub fn from_args(
        args: CliArgs,
        env: impl Fn(&str) -> Option<OsString>,
    ) -> anyhow::Result<Self> {
        let opted_out =
            |flag: bool, subsystem: Subsystem| flag || env(subsystem.opt_out_var()).is_some();

        let catalog_addr = match args.product_catalog_service_addr {
            Some(addr) if !addr.trim().is_empty() => addr.trim().to_owned(),
            _ => bail!("PRODUCT_CATALOG_SERVICE_ADDR environment variable not set"),
        };

        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.top_k == 0 {
            bail!("TOP_K must be greater than 0");
        }

        if args.num_users == 0 {
            bail!("NUM_USERS must be greater than 0");
        }

        let fallback = FallbackList::new(
            args.fallback_product_ids
                .into_iter()
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty()),
        )
        .context("invalid FALLBACK_PRODUCT_IDS")?;

        Ok(Self {
            listen_addr: SocketAddr::new(args.host, args.port),
            catalog_addr,
            num_workers: args.num_workers,
            model_path: args.model_path,
            num_users: args.num_users,
            top_k: args.top_k,
            fallback,
            shutdown_timeout: Duration::from_secs(args.shutdown_timeout),
            profiler_interval: Duration::from_secs(args.profiler_interval),
            log_format: args.log_format,
            features: OptionalFeatures {
                profiler: !opted_out(args.disable_profiler, Subsystem::Profiler),
                tracer: !opted_out(args.disable_tracing, Subsystem::Tracer),
                debugger: !opted_out(args.disable_debugger, Subsystem::Debugger),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        parse_with_env(args, &[])
    }

    fn parse_with_env(args: &[&str], vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let argv = core::iter::once("recoserve-tonic-server").chain(args.iter().copied());
        ServerConfig::from_args(CliArgs::try_parse_from(argv)?, |name| {
            vars.iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| OsString::from(value))
        })
    }

    #[test]
    fn missing_catalog_address_is_fatal() {
        let err = parse(&["--port", "9000"]).unwrap_err();
        assert!(err.to_string().contains("PRODUCT_CATALOG_SERVICE_ADDR"));
    }

    #[test]
    fn blank_catalog_address_is_fatal() {
        let err = parse(&["--product-catalog-service-addr", "   "]).unwrap_err();
        assert!(err.to_string().contains("PRODUCT_CATALOG_SERVICE_ADDR"));
    }

    #[test]
    fn builds_listen_address_and_features() {
        let config = parse(&[
            "--product-catalog-service-addr",
            "productcatalogservice:3550",
            "--host",
            "127.0.0.1",
            "--port",
            "9090",
            "--num-workers",
            "4",
            "--disable-profiler",
        ])
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.catalog_addr, "productcatalogservice:3550");
        assert_eq!(config.num_workers, 4);
        assert!(!config.features.profiler);
    }

    #[test]
    fn fallback_list_is_parsed_from_a_comma_list() {
        let config = parse(&[
            "--product-catalog-service-addr",
            "catalog:3550",
            "--fallback-product-ids",
            "A, B,C",
        ])
        .unwrap();
        assert_eq!(config.fallback, FallbackList::new(["A", "B", "C"]).unwrap());

        let err = parse(&[
            "--product-catalog-service-addr",
            "catalog:3550",
            "--fallback-product-ids",
            "A,B,A",
        ])
        .unwrap_err();
        assert!(format!("{err:#}").contains("duplicate"));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        for flag in ["--num-workers", "--top-k", "--num-users"] {
            let result = parse(&["--product-catalog-service-addr", "catalog:3550", flag, "0"]);
            assert!(result.is_err(), "{flag} 0 accepted");
        }
    }

    #[test]
    fn opt_out_variables_disable_on_presence() {
        let base = ["--product-catalog-service-addr", "catalog:3550"];
        for var in ["DISABLE_PROFILER", "DISABLE_TRACING", "DISABLE_DEBUGGER"] {
            for value in ["", "0", "false", "no", "off", "1"] {
                let config = parse_with_env(&base, &[(var, value)]).unwrap();
                let subsystem = [Subsystem::Profiler, Subsystem::Tracer, Subsystem::Debugger]
                    .into_iter()
                    .find(|s| s.opt_out_var() == var)
                    .unwrap();
                assert!(
                    !config.features.is_enabled(subsystem),
                    "{var}={value:?} left {subsystem} enabled"
                );
            }
        }

        let config = parse(&base).unwrap();
        assert_eq!(config.features, OptionalFeatures::default());
    }

    #[test]
    fn log_format_defaults_to_json() {
        let config = parse(&["--product-catalog-service-addr", "catalog:3550"]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);

        let config = parse(&[
            "--product-catalog-service-addr",
            "catalog:3550",
            "--log-format",
            "pretty",
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Pretty);

        let result = parse(&[
            "--product-catalog-service-addr",
            "catalog:3550",
            "--log-format",
            "xml",
        ]);
        assert!(result.is_err());
    }
}
