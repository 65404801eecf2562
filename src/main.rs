mod cli;
mod error;
mod fmt;
mod importer;
mod models;
mod payee;
mod settings;
mod table;
mod writer;

use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn init_logging(verbose: bool) {
    let default = if verbose { "ynabify=debug" } else { "ynabify=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = cli::convert::run(
        &cli.src,
        cli.mapping.as_deref(),
        cli.destination.as_deref(),
        cli.format.as_deref(),
    );

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
