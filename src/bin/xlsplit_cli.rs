//! CLI tool for xlsplit - splits an XLSX file into a ZIP of smaller workbooks
//!
//! Usage:
//!   xlsplit_cli <input.xlsx> --name report rows 500          # report_1.zip
//!   xlsplit_cli <input.xlsx> --name report -o out column Region
//!   xlsplit_cli <input.xlsx> columns                          # list the header

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use xlsplit::{parser, split_xlsx, SplitPolicy, XlsplitError};

#[derive(Parser)]
#[command(author, version, about = "Split an XLSX workbook into a ZIP of smaller workbooks", long_about = None)]
struct Cli {
    /// Workbook to split
    input: PathBuf,
    /// Prefix for the output file names (no path separators)
    #[arg(long, short = 'n', default_value = "", value_parser = parse_base_name)]
    name: String,
    /// Directory the archive is written to
    #[arg(long, short = 'o', default_value = ".")]
    out_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fixed number of rows per output file
    Rows {
        /// Rows per file (positive)
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// One output file per distinct value of a column
    Column {
        /// Column name, exactly as in the header row
        name: String,
    },
    /// Print the header and row count, then exit
    Columns,
}

/// The archive lands in `--out-dir`, so the prefix must not name a path.
fn parse_base_name(name: &str) -> Result<String, String> {
    if name.contains(['/', '\\']) {
        return Err(format!("'{name}' contains a path separator"));
    }
    Ok(name.to_string())
}

fn register_logger() {
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), XlsplitError> {
    let data = fs::read(&cli.input)
        .map_err(|e| XlsplitError::Unexpected(format!("{}: {e}", cli.input.display())))?;

    let policy = match cli.command {
        Commands::Columns => {
            let summary = parser::inspect(&data)?;
            for column in &summary.columns {
                println!("{column}");
            }
            eprintln!("{} data rows", summary.row_count);
            return Ok(());
        }
        Commands::Rows { count } => SplitPolicy::by_row_count(count)?,
        Commands::Column { name } => SplitPolicy::by_column(name),
    };

    let output = split_xlsx(&data, &policy, &cli.name)?;
    let path = cli.out_dir.join(&output.file_name);
    fs::write(&path, &output.archive)
        .map_err(|e| XlsplitError::Unexpected(format!("{}: {e}", path.display())))?;

    for entry in &output.entries {
        println!("{entry}");
    }
    eprintln!("Written: {}", path.display());
    Ok(())
}

fn main() -> ExitCode {
    register_logger();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
