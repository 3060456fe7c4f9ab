//! Command-line arguments for the c4nav MCP server.

use std::str::FromStr;

use clap::Parser;
use log::LevelFilter;

/// MCP server for navigating a C4 diagram hierarchy over stdio
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "C4NAV_LOG", default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// The requested level, or `warn` if it does not parse.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or_else(|_| {
            eprintln!("Invalid log level: {}. Using 'warn' instead.", self.log_level);
            LevelFilter::Warn
        })
    }
}
