/// Builds the gRPC client and server code for `proto/recoserve.proto` using
/// `tonic-prost-build`.
///
/// Besides the Rust bindings, a serialized `FileDescriptorSet` is written to
/// `OUT_DIR/recoserve_descriptor.bin` so the server can expose the schema over
/// gRPC reflection.
///
/// # Files and Paths
///
/// - Proto file: `proto/recoserve.proto`
/// - Includes: `proto/`
///
/// # Output
///
/// Generated code is included in the crate via:
///
/// ```rust,ignore
/// pub mod proto {
///     tonic::include_proto!("recoserve.v1");
/// }
/// ```
use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let descriptor_path = out_dir.join("recoserve_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure().compile_with_config(
        config,
        &["proto/recoserve.proto"],
        &["proto"],
    )?;

    println!("cargo:rerun-if-changed=proto/recoserve.proto");
    Ok(())
}
