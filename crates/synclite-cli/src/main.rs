// crates/synclite-cli/src/main.rs
// ============================================================================
// Module: Synclite CLI Entry Point
// Description: Command dispatcher for store naming, migration, and status.
// Purpose: Operate local sync cache stores outside of a host application.
// Dependencies: clap, serde_json, synclite-config, synclite-core,
//               synclite-store-sqlite, thiserror, tracing, tracing-subscriber.
// ============================================================================

//! ## Overview
//! The synclite CLI resolves store file names and functions endpoints, and
//! opens configured stores to migrate them or report their status. Machine
//! readable output goes to stdout; logs go to stderr, filtered by
//! `SYNCLITE_LOG`.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use synclite_config::SyncliteConfig;
use synclite_core::DEFAULT_PERSISTENCE_KEY;
use synclite_core::DatabaseId;
use synclite_core::MigrationRunner;
use synclite_core::PersistenceKey;
use synclite_core::ProjectId;
use synclite_core::SchemaVersionTracker;
use synclite_core::functions_url;
use synclite_core::resolve_store_name;
use synclite_store_sqlite::SqliteLocalStore;
use synclite_store_sqlite::SqliteRowStore;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "SYNCLITE_LOG";
/// Log filter used when `SYNCLITE_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "synclite", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the store file name for an identity.
    StoreName(StoreNameCommand),
    /// Print the callable functions endpoint URL.
    FunctionsUrl(FunctionsUrlCommand),
    /// Migrate the configured store.
    Migrate(MigrateCommand),
    /// Print the configured store's schema and counters as JSON.
    Status(StatusCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `store-name`.
#[derive(Args, Debug)]
struct StoreNameCommand {
    /// Application instance key.
    #[arg(long, value_name = "KEY", default_value = DEFAULT_PERSISTENCE_KEY)]
    key: String,
    /// Backend project id.
    #[arg(long, value_name = "PROJECT")]
    project: String,
    /// Database id (defaults to the project's default database).
    #[arg(long, value_name = "DATABASE")]
    database: Option<String>,
}

/// Arguments for `functions-url`.
#[derive(Args, Debug)]
struct FunctionsUrlCommand {
    /// Backend project id.
    #[arg(long, value_name = "PROJECT")]
    project: String,
    /// Function name.
    #[arg(long, value_name = "NAME")]
    endpoint: String,
    /// Deployment region (defaults to us-central1).
    #[arg(long, value_name = "REGION")]
    region: Option<String>,
}

/// Arguments for `migrate`.
#[derive(Args, Debug)]
struct MigrateCommand {
    /// Optional config file path (defaults to synclite.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Target schema version (defaults to the newest version).
    #[arg(long, value_name = "VERSION")]
    to: Option<u32>,
}

/// Arguments for `status`.
#[derive(Args, Debug)]
struct StatusCommand {
    /// Optional config file path (defaults to synclite.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a synclite configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to synclite.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point.
fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("synclite {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        return Err(CliError::new("no command given; run `synclite --help`".to_string()));
    };
    match command {
        Commands::StoreName(command) => command_store_name(&command),
        Commands::FunctionsUrl(command) => command_functions_url(&command),
        Commands::Migrate(command) => command_migrate(&command),
        Commands::Status(command) => command_status(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// SECTION: Identity Commands
// ============================================================================

/// Prints the resolved store file name.
fn command_store_name(command: &StoreNameCommand) -> CliResult<ExitCode> {
    let name = store_name_for(command)?;
    write_stdout_line(&name).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Resolves the store name for `store-name` arguments.
fn store_name_for(command: &StoreNameCommand) -> CliResult<String> {
    if command.key.is_empty() || command.project.is_empty() {
        return Err(CliError::new("key and project must be non-empty".to_string()));
    }
    let project = ProjectId::new(command.project.as_str());
    let database = match &command.database {
        Some(database) if database.is_empty() => {
            return Err(CliError::new("database must be non-empty".to_string()));
        }
        Some(database) => DatabaseId::named(project, database.as_str()),
        None => DatabaseId::default_database(project),
    };
    Ok(resolve_store_name(&PersistenceKey::new(command.key.as_str()), &database))
}

/// Prints the functions endpoint URL.
fn command_functions_url(command: &FunctionsUrlCommand) -> CliResult<ExitCode> {
    let url = functions_url(
        command.region.as_deref(),
        &ProjectId::new(command.project.as_str()),
        &command.endpoint,
    )
    .map_err(|err| CliError::new(err.to_string()))?;
    write_stdout_line(url.as_str()).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Commands
// ============================================================================

/// Migrates the configured store and prints the migration report.
fn command_migrate(command: &MigrateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let path = SqliteLocalStore::store_path(
        config.store_config(),
        &config.persistence_key(),
        &config.database_id(),
    );
    info!(path = %path.display(), "migrating store");
    let mut store = SqliteRowStore::open(&path, config.store_config())
        .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
    let runner = MigrationRunner::default();
    let report = match command.to {
        Some(to) => {
            let from = SchemaVersionTracker::read_current(&mut store)
                .map_err(|err| CliError::new(format!("failed to read schema version: {err}")))?;
            runner.run_migrations_range(&mut store, from, to)
        }
        None => runner.run_migrations(&mut store),
    }
    .map_err(|err| CliError::new(format!("migration failed: {err}")))?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Opens the configured store and prints its status.
fn command_status(command: &StatusCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let mut store = SqliteLocalStore::open(
        config.store_config(),
        &config.persistence_key(),
        &config.database_id(),
    )
    .map_err(|err| CliError::new(format!("failed to open store: {err}")))?;
    let status =
        store.status().map_err(|err| CliError::new(format!("failed to read status: {err}")))?;
    write_json(&status)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line("Config valid").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads configuration with CLI error mapping.
fn load_config(path: Option<&Path>) -> CliResult<SyncliteConfig> {
    SyncliteConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
