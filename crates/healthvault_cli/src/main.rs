//! Command-line surface over the record API.
//!
//! # Responsibility
//! - Resolve configuration from flags and `HEALTHVAULT_*` variables.
//! - Run one record operation as one caller and print the outcome.
//!
//! # Invariants
//! - Envelope outcomes print as JSON; scalars print as plain text.
//! - Exit status is non-zero whenever an envelope reports `success=false`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use healthvault_core::db::open_db;
use healthvault_core::{
    core_version, health_check, init_logging, AddRecordRequest, ApiResponse, CoreConfig,
    FixedIdentity, IdentityContext, Principal, RecordApi, RecordService, SqliteRecordStore,
    SqliteSequenceIdGenerator, ANONYMOUS_PRINCIPAL_TEXT,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "healthvault", version, about = "Per-identity health record metadata store")]
struct Cli {
    /// SQLite database file (default: $HEALTHVAULT_DB_PATH or a temp-dir file).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without one.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Verified principal the operation runs as.
    #[arg(long, global = true, default_value = ANONYMOUS_PRINCIPAL_TEXT)]
    caller: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a record for the caller.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        record_type: String,
        #[arg(long)]
        encrypted_url: String,
        #[arg(long)]
        file_size: Option<u64>,
        /// Logical date in Unix seconds; defaults to the creation time.
        #[arg(long)]
        date: Option<u64>,
    },
    /// List the caller's records.
    List,
    /// Fetch one of the caller's records.
    Get { id: String },
    /// Delete one of the caller's records.
    Delete { id: String },
    /// Print how many records the caller owns.
    Count,
    /// Print the liveness string.
    Health,
    /// Print the caller principal.
    Whoami,
}

type SqliteRecordApi<'conn> = RecordApi<SqliteRecordStore<'conn>, SqliteSequenceIdGenerator<'conn>>;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = resolve_config(&cli, CoreConfig::from_env());

    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(&config.log_level, log_dir)?;
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let identity = FixedIdentity::new(Principal::from_text(cli.caller.as_str()));

    match cli.command {
        Command::Add {
            title,
            record_type,
            encrypted_url,
            file_size,
            date,
        } => {
            let request = AddRecordRequest {
                title,
                record_type,
                encrypted_url,
                file_size,
                date,
            };
            print_envelope(&with_record_api(&config, |api| {
                api.add_record(&identity, request)
            })?)
        }
        Command::List => print_envelope(&with_record_api(&config, |api| {
            api.get_my_records(&identity)
        })?),
        Command::Get { id } => print_envelope(&with_record_api(&config, |api| {
            api.get_record_by_id(&identity, &id)
        })?),
        Command::Delete { id } => print_envelope(&with_record_api(&config, |api| {
            api.delete_record(&identity, &id)
        })?),
        Command::Count => {
            let count = with_record_api(&config, |api| api.get_record_count(&identity))?;
            println!("{count}");
            Ok(ExitCode::SUCCESS)
        }
        // Stateless: never opens the database.
        Command::Health => {
            println!("{}", health_check());
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => {
            println!("{}", identity.caller());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn with_record_api<T>(
    config: &CoreConfig,
    f: impl FnOnce(&SqliteRecordApi<'_>) -> T,
) -> Result<T> {
    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open `{}`", config.db_path.display()))?;
    let api = RecordApi::new(RecordService::new(
        SqliteRecordStore::try_new(&conn)?,
        SqliteSequenceIdGenerator::try_new(&conn)?,
    ));
    Ok(f(&api))
}

/// Layers command-line flags over `base`, normally [`CoreConfig::from_env`].
fn resolve_config(cli: &Cli, base: CoreConfig) -> CoreConfig {
    let mut config = base;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    config
}

fn print_envelope(response: &ApiResponse) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(if response.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
