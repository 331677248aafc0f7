//! Entry point for the `dynload` tool.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Set up logging with `tracing-subscriber`.
//! 3. Load the first usable library among the candidates, reporting failed attempts.
//! 4. Bind each requested symbol and print its address.
//! 5. Close the library.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dynload::config::Config;
use dynload::Loader;

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log level {:?}", config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let loader = Loader::new();
    let mut library = loader
        .load(config.candidates.as_slice())
        .context("no candidate library could be loaded")?;

    for record in library.errors() {
        println!("skipped {record}");
    }
    println!("loaded {}", library.name());

    let mut failed = 0;
    for symbol in &config.symbols {
        match loader.bind(&library, symbol) {
            Ok(address) => println!("{symbol} = {address:p}"),
            Err(e) if config.keep_going => {
                tracing::error!("{}", e);
                failed += 1;
            }
            Err(e) => {
                loader.close(&mut library);
                return Err(e.into());
            }
        }
    }

    loader
        .try_close(&mut library)
        .context("failed to release library")?;

    if failed > 0 {
        anyhow::bail!("{} of {} symbol(s) could not be bound", failed, config.symbols.len());
    }
    Ok(())
}
