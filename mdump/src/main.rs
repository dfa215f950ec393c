mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    let cli = Cli::parse_from(wild::args_os());

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli::log_level(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract(args) => commands::extract(args)?,
        Commands::List(args) => commands::list(args)?,
    };

    Ok(())
}
