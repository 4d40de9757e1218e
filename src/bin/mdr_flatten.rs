//! mdr-flatten: Flatten a directory of adverse-event JSON documents into a spreadsheet
//!
//! Usage:
//!   # Every *.json file in the directory, one workbook out
//!   mdr-flatten ./device-events FinalOutput.xlsx
//!
//!   # Same rows as CSV or JSON Lines, chosen by extension
//!   mdr-flatten ./device-events rows.csv
//!
//! Set RUST_LOG=debug for per-file report counts.

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use mdr_flatten::{convert, FlattenConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mdr-flatten")]
#[command(about = "Flatten adverse-event JSON reports into a spreadsheet", long_about = None)]
struct Args {
    /// Directory containing the .json input documents
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Output file (.xlsx, .csv or .jsonl)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    convert(&args.input_dir, &args.output, &FlattenConfig::default())?;

    Ok(())
}
