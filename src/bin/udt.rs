//! Command-line front end for UDT sources.
//!
//! Usage:
//!   udt fmt FILE.udt ... [--write]       normalize (parse + serialize)
//!   udt size FILE.udt ...                plain and packed byte sizes
//!   udt flatten FILE.udt [--json]        leaf paths with their types
//!   udt sql FILE.udt                     SQL column definitions
//!
//! `--reference-dir DIR` resolves `"Other"` references in DIR instead of next to
//! each file. Logging goes to stderr (`RUST_LOG`, or `-v` for debug).

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use udtdef::{parse_file, parse_file_with_references, serialize, sql, Marker, UdtType};

#[derive(Parser)]
#[command(name = "udt", version, about = "Inspect and normalize PLC UDT sources")]
struct Cli {
    /// Directory used to resolve `Name : "Other";` references
    #[arg(long, global = true)]
    reference_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and re-serialize; print to stdout unless --write
    Fmt {
        files: Vec<PathBuf>,
        /// Rewrite the files in place
        #[arg(short, long)]
        write: bool,
    },
    /// Print plain and packed byte sizes
    Size { files: Vec<PathBuf> },
    /// List every leaf with its path
    Flatten {
        file: PathBuf,
        #[arg(short, long, default_value_t = '.')]
        separator: char,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print SQL column definitions for every leaf
    Sql {
        file: PathBuf,
        #[arg(short, long, default_value_t = '.')]
        separator: char,
    },
}

#[derive(Serialize)]
struct LeafRow {
    path: Marker,
    #[serde(rename = "type")]
    sql_type: String,
    comment: String,
}

fn load(path: &Path, reference_dir: Option<&Path>) -> anyhow::Result<UdtType> {
    let udt = match reference_dir {
        Some(dir) => parse_file_with_references(path, dir),
        None => parse_file(path),
    };
    udt.with_context(|| format!("{}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let reference_dir = cli.reference_dir.as_deref();
    match cli.command {
        Command::Fmt { files, write } => {
            for path in &files {
                let udt = load(path, reference_dir)?;
                let text = serialize(&udt);
                if write {
                    std::fs::write(path, &text).with_context(|| format!("{}: write failed", path.display()))?;
                    log::info!("{}: formatted", path.display());
                } else {
                    print!("{}", text);
                }
            }
        }
        Command::Size { files } => {
            for path in &files {
                let udt = load(path, reference_dir)?;
                println!(
                    "{}: {} v{} plain={} packed={}",
                    path.display(),
                    udt.name(),
                    udt.version(),
                    udt.plain_size(),
                    udt.packed_size()
                );
            }
        }
        Command::Flatten { file, separator, json } => {
            let udt = load(&file, reference_dir)?;
            let leaves = udt.flatten_relative();
            if json {
                let rows: Vec<LeafRow> = leaves
                    .iter()
                    .map(|m| LeafRow {
                        path: m.marker.clone(),
                        sql_type: sql::sql_type(&m.field),
                        comment: m.field.comment().to_string(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for m in &leaves {
                    println!("{}\t{}", m.marker.to_string_with(separator), sql::sql_type(&m.field));
                }
            }
        }
        Command::Sql { file, separator } => {
            let udt = load(&file, reference_dir)?;
            let columns = sql::column_definitions(&udt, separator);
            println!("{}", columns.join(",\n"));
        }
    }
    Ok(())
}
