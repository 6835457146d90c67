//! spoecfg CLI
//!
//! Command-line tools for staged editing of HAProxy SPOE configuration files.
//!
//! # Commands
//!
//! - `version` - Show tool and configuration versions
//! - `bump-version` - Increment the configuration version
//! - `transactions` - List staged and failed transactions
//! - `begin` / `commit` / `abort` - Transaction lifecycle
//! - `scopes` / `sections` / `show` - Read configuration objects
//! - `delete-section` - Delete a section in a transaction

mod commands;

use clap::{Parser, Subcommand};
use commands::{parse_kind, Format};
use spoecfg_core::{Params, SpoeClient, TransactionId, TransactionRef};
use spoecfg_document::SectionKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// spoecfg command-line configuration tools.
#[derive(Parser)]
#[command(name = "spoecfg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SPOE configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Directory holding staged transactions
    #[arg(global = true, long)]
    transaction_dir: Option<PathBuf>,

    /// Keep transactions in memory only
    #[arg(global = true, long)]
    ephemeral: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show tool and configuration versions
    Version,

    /// Increment the configuration version
    BumpVersion,

    /// List staged and failed transactions
    Transactions,

    /// Start a transaction against the given configuration version
    Begin {
        /// Configuration version the transaction is based on
        #[arg(long)]
        version: i64,
    },

    /// Commit a transaction
    Commit {
        /// Transaction id
        id: String,
    },

    /// Abort a transaction and remove its files
    Abort {
        /// Transaction id
        id: String,
    },

    /// List scopes
    Scopes {
        /// Read from this transaction instead of master
        #[arg(short, long)]
        transaction: Option<String>,
    },

    /// List sections of one kind in a scope
    Sections {
        /// Scope name
        scope: String,

        /// Section kind (spoe-agent, spoe-message, spoe-group)
        #[arg(value_parser = parse_kind)]
        kind: SectionKind,

        /// Read from this transaction instead of master
        #[arg(short, long)]
        transaction: Option<String>,
    },

    /// Show one section
    Show {
        /// Scope name
        scope: String,

        /// Section kind (spoe-agent, spoe-message, spoe-group)
        #[arg(value_parser = parse_kind)]
        kind: SectionKind,

        /// Section name
        name: String,

        /// Read from this transaction instead of master
        #[arg(short, long)]
        transaction: Option<String>,
    },

    /// Delete a section
    DeleteSection {
        /// Scope name
        scope: String,

        /// Section kind (spoe-agent, spoe-message, spoe-group)
        #[arg(value_parser = parse_kind)]
        kind: SectionKind,

        /// Section name
        name: String,

        /// Edit inside this transaction
        #[arg(short, long, conflicts_with = "version")]
        transaction: Option<String>,

        /// Apply as a single-shot edit against this configuration version
        #[arg(long)]
        version: Option<i64>,
    },
}

impl Cli {
    fn open(&self) -> Result<SpoeClient, Box<dyn std::error::Error>> {
        let config = self
            .config
            .clone()
            .ok_or("Configuration file required (--config)")?;
        let mut params = Params::new(config).persistent_transactions(!self.ephemeral);
        if let Some(dir) = &self.transaction_dir {
            params = params.transaction_dir(dir);
        }
        Ok(SpoeClient::open(params)?)
    }
}

fn transaction_ref(
    transaction: Option<String>,
    version: Option<i64>,
) -> Result<TransactionRef, Box<dyn std::error::Error>> {
    match (transaction, version) {
        (Some(id), _) => Ok(TransactionRef::explicit(id)),
        (None, Some(version)) => Ok(TransactionRef::implicit(version)),
        (None, None) => Err("Either --transaction or --version is required".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format;
    match &cli.command {
        Commands::Version => {
            println!("spoecfg CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("spoecfg core v{}", spoecfg_core::VERSION);
            if cli.config.is_some() {
                let client = cli.open()?;
                println!("Configuration version: {}", client.current_version(None)?);
            }
        }
        Commands::BumpVersion => {
            let mut client = cli.open()?;
            commands::version::bump(&mut client, format)?;
        }
        Commands::Transactions => {
            let client = cli.open()?;
            commands::transactions::list(&client, format)?;
        }
        Commands::Begin { version } => {
            let mut client = cli.open()?;
            commands::transactions::begin(&mut client, *version, format)?;
        }
        Commands::Commit { id } => {
            let mut client = cli.open()?;
            commands::transactions::commit(&mut client, &TransactionId::new(id.as_str()), format)?;
        }
        Commands::Abort { id } => {
            let mut client = cli.open()?;
            commands::transactions::abort(&mut client, &TransactionId::new(id.as_str()))?;
        }
        Commands::Scopes { transaction } => {
            let client = cli.open()?;
            let id = transaction.as_deref().map(TransactionId::from);
            commands::sections::scopes(&client, id.as_ref(), format)?;
        }
        Commands::Sections {
            scope,
            kind,
            transaction,
        } => {
            let client = cli.open()?;
            let id = transaction.as_deref().map(TransactionId::from);
            commands::sections::list(&client, scope, *kind, id.as_ref(), format)?;
        }
        Commands::Show {
            scope,
            kind,
            name,
            transaction,
        } => {
            let client = cli.open()?;
            let id = transaction.as_deref().map(TransactionId::from);
            commands::sections::show(&client, scope, *kind, name, id.as_ref(), format)?;
        }
        Commands::DeleteSection {
            scope,
            kind,
            name,
            transaction,
            version,
        } => {
            let txn = transaction_ref(transaction.clone(), *version)?;
            let mut client = cli.open()?;
            commands::sections::delete(&mut client, scope, *kind, name, &txn)?;
        }
    }

    Ok(())
}
