//! Configuration module.
//!
//! This module defines the command-line interface (CLI) for the `dynload` tool using `clap`.
//! It handles parsing the candidate library names and the symbols to bind.

use clap::Parser;

/// Load a shared library from a list of candidates and bind symbols from it.
///
/// Candidates are tried in order; the first one the platform loader accepts wins. Every failed
/// attempt is reported along with the platform's error message.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Candidate library names, most preferred first
    #[arg(required = true, num_args = 1..)]
    pub candidates: Vec<String>,

    /// Symbol to bind (repeatable)
    #[arg(short, long = "symbol", value_name = "NAME")]
    pub symbols: Vec<String>,

    /// Keep binding the remaining symbols after one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}
