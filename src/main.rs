//! Tail a growing log file and colour lines by log level.
//!
//! Usage: `logview [OPTIONS] <LOG_FILE>`
//! Prints the last lines of the file, then polls it for appended lines until
//! an error or Ctrl+C.

mod app;
mod cli;
mod config;
mod constants;
mod error;
mod highlight;
mod tail;
mod theme;

use std::io::{self, Write};

use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use crate::cli::Invocation;
use crate::constants::{EXIT_FAILURE, LOG_ENV};

/// Diagnostics go to stderr; stdout carries the log lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let (path, config) = match cli::parse()? {
        Invocation::Print(text) => {
            let mut stdout = io::stdout();
            write!(stdout, "{text}")?;
            stdout.flush()?;
            std::process::exit(EXIT_FAILURE);
        }
        Invocation::Follow { path, config } => (path, config),
    };
    tracing::debug!(?config, path = %path.display(), "starting");

    // The follow future is dropped when the interrupt wins, so no file handle
    // outlives it.
    app::follow(&path, &config, io::stdout(), tokio::signal::ctrl_c())
        .await
        .wrap_err_with(|| format!("following {}", path.display()))?;
    tracing::info!("interrupted");
    std::process::exit(EXIT_FAILURE);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(report) = run().await {
        println!("{report:?}");
        std::process::exit(EXIT_FAILURE);
    }
}
