#![allow(dead_code)]
#[macro_use]
mod errors;
mod command;
mod repl;
mod sql;
mod storage;

use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "rustlite",
    version = VERSION,
    about = "Single-file B-tree row store with a SQL-ish prompt."
)]
struct Cli {
    /// Path to the database file. Created on first open.
    file: PathBuf,

    /// Append-mode log file; the console itself stays clean.
    #[arg(long, env = "RUSTLITE_LOG", default_value = "rustlite.log")]
    log: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&cli.log)
        .expect("Failed to open log file");

    tracing_subscriber::fmt()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), errors::Error> {
    let mut table = storage::Table::open(cli.file.as_path())?;
    repl::console::start(&mut table)?;
    table.close()
}
