fn main() -> Result<(), Box<dyn std::error::Error>> {
    // protoc is not guaranteed to be installed on the build host; vendor it.
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    // Compile proto files to OUT_DIR (used by tonic::include_proto!)
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/ordering/v1/ordering.proto"], &["proto"])?;

    // Tell Cargo to rerun if proto files change
    println!("cargo:rerun-if-changed=proto/");

    Ok(())
}
