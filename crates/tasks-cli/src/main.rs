//! Tasks client CLI.
//!
//! Provides the `tasks` binary:
//! - `save` loads a store fixture, runs one save session against the tasks
//!   server (or the offline archive) and prints the report as JSON.
//! - `list` prints the records held by an offline archive.
//!
//! Flags override the `TASKS_*` environment variables read by
//! [`SyncConfig::from_env`]. Logs go to stderr, filtered by `RUST_LOG`.

mod fixture;

use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use tasks_core::RecordKind;
use tasks_store::{InMemoryStore, SqliteArchive, SyntheticProjects};
use tasks_sync::config::timeout_from_secs;
use tasks_sync::{HttpRemote, LocalRemote, Mode, Remote, SaveError, SyncConfig, TasksService};

const EXIT_SAVE_FAILED: i32 = 1;
const EXIT_BAD_INPUT: i32 = 2;
const EXIT_IO: i32 = 3;

/// Tasks client tools.
#[derive(Parser)]
#[command(name = "tasks", about = "Tasks client tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save the dirty records of a fixture.
    Save {
        /// JSON fixture describing the store before the save.
        #[arg(short, long)]
        fixture: String,

        /// Save into this offline archive.
        #[arg(short, long, conflicts_with = "server")]
        db: Option<String>,

        /// Save to this tasks server.
        #[arg(short, long)]
        server: Option<String>,

        /// Per-commit timeout in seconds (0 disables).
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List the records held by an offline archive.
    List {
        /// Path to the archive database file.
        #[arg(short, long)]
        db: String,

        /// Only list records of this kind (user, project, task, watch).
        #[arg(short, long)]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Save {
            fixture,
            db,
            server,
            timeout,
        } => run_save(&fixture, db, server, timeout).await,
        Commands::List { db, kind } => run_list(&db, kind.as_deref()),
    };
    process::exit(exit_code);
}

/// Execute the save subcommand.
///
/// Returns exit code: 0 = saved, 1 = save failed, 2 = bad input,
/// 3 = I/O or storage error.
async fn run_save(
    fixture_path: &str,
    db: Option<String>,
    server: Option<String>,
    timeout: Option<u64>,
) -> i32 {
    let mut config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_BAD_INPUT;
        }
    };
    if let Some(db) = db {
        config.mode = Mode::Offline;
        config.db_path = db;
    }
    if let Some(server) = server {
        config.mode = Mode::Online;
        config.server_url = server;
    }
    if let Some(secs) = timeout {
        config.commit_timeout = timeout_from_secs(secs);
    }

    let entries = match fixture::read(fixture_path) {
        Ok(entries) => entries,
        Err(fixture::FixtureError::Io(e)) => {
            eprintln!("Error: failed to read fixture '{}': {}", fixture_path, e);
            return EXIT_IO;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_BAD_INPUT;
        }
    };
    let (store, synthetic) = match fixture::load(entries) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_BAD_INPUT;
        }
    };

    tracing::info!(mode = %config.mode, "running save session");
    match config.mode {
        Mode::Offline => {
            let archive = match SqliteArchive::open(&config.db_path) {
                Ok(archive) => archive,
                Err(e) => {
                    eprintln!(
                        "Error: failed to open archive '{}': {}",
                        config.db_path, e
                    );
                    return EXIT_IO;
                }
            };
            save_with(store, synthetic, LocalRemote::new(archive), &config).await
        }
        Mode::Online => {
            let remote = HttpRemote::new(config.server_url.clone());
            save_with(store, synthetic, remote, &config).await
        }
    }
}

async fn save_with<R>(
    store: InMemoryStore,
    synthetic: SyntheticProjects,
    remote: R,
    config: &SyncConfig,
) -> i32
where
    R: Remote + Sync,
{
    let service = match TasksService::new(Arc::new(Mutex::new(store)), remote, synthetic, config)
    {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_SAVE_FAILED;
        }
    };

    match service.request_save().await {
        Ok(report) => {
            print_json(&report);
            0
        }
        Err(e @ SaveError::Store(_)) => {
            eprintln!("Error: {}", e);
            EXIT_IO
        }
        Err(e) => {
            eprintln!("Save failed: {}", e);
            EXIT_SAVE_FAILED
        }
    }
}

/// Execute the list subcommand.
fn run_list(db_path: &str, kind: Option<&str>) -> i32 {
    let kind = match kind {
        Some(name) => match RecordKind::from_resource_name(name) {
            Some(kind) => Some(kind),
            None => {
                eprintln!(
                    "Error: unknown kind '{}', expected user/project/task/watch",
                    name
                );
                return EXIT_BAD_INPUT;
            }
        },
        None => None,
    };

    let archive = match SqliteArchive::open(db_path) {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("Error: failed to open archive '{}': {}", db_path, e);
            return EXIT_IO;
        }
    };

    match archive.list(kind) {
        Ok(records) => {
            print_json(&records);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to list records: {}", e);
            EXIT_IO
        }
    }
}

/// Prints a value as pretty JSON to stdout for machine-readable output.
fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize output: {}\"}}", e));
    println!("{}", json);
}
