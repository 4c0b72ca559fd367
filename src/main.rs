//! `runtime_bundler` binary.

use runtime_bundler::cli;
use std::process;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for suggestion in e.recovery_suggestions() {
                eprintln!("  Advice: {}", suggestion);
            }
            1
        }
    };

    process::exit(exit_code);
}
