pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod session;
pub mod util;

// === CLI entrypoint ===
pub mod cli;

/// Entrypoint used by `main.rs` to run the full CLI.
pub async fn run_cli() -> std::process::ExitCode {
    cli::cli().await
}
