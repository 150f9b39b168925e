use cimport::cli::{Args, initialize};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    // Setup logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let config = match initialize(&args) {
        Ok(Some(config)) => config,
        Ok(None) => return,
        Err(e) => {
            error!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = cimport::run(&config) {
        error!("Error: {e}");
        std::process::exit(1);
    }
}
