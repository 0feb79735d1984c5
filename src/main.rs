//! asap CLI binary.
//!
//! This is the minimal entrypoint; all logic lives in the library's `cli` module.

#[tokio::main]
async fn main() -> std::process::ExitCode {
    match asap_pipeline::cli::run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(code) => code,
    }
}
