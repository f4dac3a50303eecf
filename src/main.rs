mod array;
mod catalog;
mod cli;
mod config;
mod download;
mod errors;
mod meteorology;
mod pipeline;
mod reading;
mod store;
#[cfg(test)]
mod testing;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Download(args) => match command::download(args).await {
            Ok(summary) => println!("{summary}"),
            Err(e) => {
                eprintln!("Error: {e:#}");
                std::process::exit(1);
            }
        },
        Commands::Models {} => print!("{}", command::models()),
    }

    Ok(())
}
