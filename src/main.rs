use clap::Parser;
use priority::cli::commands::Cli;
use priority::cli::handlers;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    // diagnostics go to stderr so stdout stays clean for --json
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
