//! pwdb: CLI tool for checking passwords against a sorted hash dump.

use clap::{Args, Parser, Subcommand};
use pwdb::{Backend, MalformedPolicy, Record, RecordStore, StoreConfig};
use serde_json::json;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pwdb")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Check passwords against a sorted fixed-width SHA-1 hash dump", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up passwords (read from stdin, one per line, when none are given)
    Check {
        /// Password dump ordered by hash
        file: PathBuf,

        /// Passwords to test
        passwords: Vec<String>,

        /// Print one JSON object per password
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Scan the whole dump for malformed or out-of-order records
    Verify {
        /// Password dump ordered by hash
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// YAML store configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record width in bytes
    #[arg(long)]
    record_width: Option<usize>,

    /// How records are read from the dump
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// What to do with malformed records
    #[arg(long, value_enum)]
    on_malformed: Option<MalformedPolicy>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl StoreArgs {
    fn to_config(&self) -> Result<StoreConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::load(path)?,
            None => StoreConfig::default(),
        };

        if let Some(width) = self.record_width {
            config.record_width = width;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(policy) = self.on_malformed {
            config.on_malformed = policy;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Check { store, .. } | Commands::Verify { store, .. } => store.verbose,
    };
    let filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let result = match cli.command {
        Commands::Check {
            file,
            passwords,
            json,
            store,
        } => check(&file, passwords, json, &store),
        Commands::Verify { file, json, store } => verify(&file, json, &store),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Returns `Ok(false)` if any lookup was indeterminate.
fn check(
    file: &Path,
    mut passwords: Vec<String>,
    json: bool,
    args: &StoreArgs,
) -> Result<bool, Box<dyn std::error::Error>> {
    let config = args.to_config()?;
    let store = RecordStore::open_with_config(file, &config)?;

    if passwords.is_empty() {
        for line in io::stdin().lock().lines() {
            passwords.push(line?);
        }
    }

    let mut clean = true;
    for (password, result) in passwords.iter().zip(store.search_many(passwords.as_slice())) {
        if result.is_err() {
            clean = false;
        }
        if json {
            println!("{}", json_line(password, &result));
        } else {
            match result {
                Ok(Some(record)) => println!("{}: FOUND ({})", password, record.count),
                Ok(None) => println!("{}: not found", password),
                Err(e) => println!("{}: ERROR ({})", password, e),
            }
        }
    }

    Ok(clean)
}

fn json_line(password: &str, result: &pwdb::Result<Option<Record>>) -> serde_json::Value {
    match result {
        Ok(Some(record)) => json!({
            "password": password,
            "found": true,
            "hash": record.hash,
            "count": record.count,
        }),
        Ok(None) => json!({ "password": password, "found": false }),
        Err(e) => json!({ "password": password, "error": e.to_string() }),
    }
}

/// Returns `Ok(false)` if the dump has problems.
fn verify(file: &Path, json: bool, args: &StoreArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let config = args.to_config()?;
    let store = RecordStore::open_with_config(file, &config)?;
    let report = pwdb::verify(&store)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Records:      {}", report.records);
        println!("Malformed:    {} {:?}", report.malformed_count, report.malformed);
        println!("Out of order: {} {:?}", report.unsorted_count, report.unsorted);
        println!("Duplicates:   {}", report.duplicates);
        println!("{}", if report.is_ok() { "OK" } else { "FAILED" });
    }

    Ok(report.is_ok())
}
