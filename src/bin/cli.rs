//! minicask CLI
//!
//! Command-line interface for a local minicask store.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use minicask::{Config, Store, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// minicask CLI
#[derive(Parser, Debug)]
#[command(name = "minicask")]
#[command(about = "CLI for the minicask key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./minicask_data")]
    data_dir: String,

    /// fsync after every write
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Compact the data file
    Merge,

    /// List all live keys
    Keys,

    /// Show key count and data file size
    Stats,

    /// Run a put/get/delete/merge/close walkthrough
    Demo,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,minicask=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .sync_strategy(if args.sync {
            SyncStrategy::EveryWrite
        } else {
            SyncStrategy::OnClose
        })
        .build();

    let store = match Store::open(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = match run(&store, args.command) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    };

    if let Err(e) = store.close() {
        tracing::error!("Failed to close store: {}", e);
        return ExitCode::FAILURE;
    }

    code
}

fn run(store: &Store, command: Commands) -> minicask::Result<ExitCode> {
    match command {
        Commands::Get { key } => match store.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => {
                println!("(nil)");
                return Ok(ExitCode::from(1));
            }
        },
        Commands::Put { key, value } => {
            store.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            store.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::Merge => {
            let stats = store.merge()?;
            println!(
                "merged: {} of {} records live, {} bytes reclaimed",
                stats.live_entries,
                stats.entries_scanned,
                stats.bytes_reclaimed()
            );
        }
        Commands::Keys => {
            for key in store.keys()? {
                println!("{}", String::from_utf8_lossy(&key));
            }
        }
        Commands::Stats => {
            println!("keys:      {}", store.len());
            println!("log bytes: {}", store.log_size()?);
            println!("data file: {}", store.data_file_path().display());
        }
        Commands::Demo => demo(store)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn demo(store: &Store) -> minicask::Result<()> {
    let (key, value) = (b"key", b"value");

    store.put(key, value)?;
    println!("Put key: key, value: value success");

    let current = store.get_required(key)?;
    println!("Get key: key, value: {} success", String::from_utf8_lossy(&current));

    store.delete(key)?;
    println!("Delete key: key success");

    let stats = store.merge()?;
    println!(
        "Merge success: compacted {} -> {} bytes",
        stats.bytes_before, stats.bytes_after
    );

    Ok(())
}
