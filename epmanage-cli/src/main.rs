use std::process::ExitCode;

use epmanage_cli::run_cli;
use epmanage_cli::util::logging::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    run_cli().await
}
