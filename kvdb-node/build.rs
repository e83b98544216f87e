fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use the vendored protoc unless the environment provides one
    if std::env::var_os("PROTOC").is_none() {
        let protoc = protoc_bin_vendored::protoc_bin_path().map_err(|e| e.to_string())?;
        std::env::set_var("PROTOC", protoc);
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/consensus.proto"], &["proto"])?;

    Ok(())
}
