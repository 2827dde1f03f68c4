//! # vfhash CLI
//!
//! Mount host directories under virtual prefixes and hash files through the
//! same asynchronous service the host embeds.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use vfhash_config::Config;
use vfhash_core::{FileHashService, HashState};

mod mount;

/// vfhash - SHA-256 of files on mounted virtual volumes
#[derive(Parser)]
#[command(name = "vfhash")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Mount a host directory under a virtual prefix (repeatable)
    #[arg(
        long = "mount",
        value_name = "PREFIX=DIR",
        value_parser = mount::parse_mount,
        global = true
    )]
    mounts: Vec<(String, PathBuf)>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash one or more virtual paths
    Hash {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,

        /// Give up waiting after this many milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
    },

    /// Hash every file under a mounted prefix
    Scan {
        #[arg(value_name = "PREFIX")]
        prefix: String,

        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print configuration file locations
    Path,
}

/// One line of output
#[derive(Debug, Serialize)]
struct HashRow {
    path: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<String>,
}

impl HashRow {
    fn rejected(path: String) -> Self {
        Self {
            path,
            status: "rejected",
            digest: None,
        }
    }

    fn from_state(path: String, state: Option<HashState>) -> Self {
        let (status, digest) = match state {
            Some(HashState::Ready(digest)) => ("ready", Some(digest.to_string())),
            Some(HashState::Missing) => ("missing", None),
            Some(HashState::ReadError { .. }) => ("error", None),
            Some(HashState::Cancelled) => ("cancelled", None),
            Some(HashState::Pending) | None => ("timeout", None),
        };
        Self {
            path,
            status,
            digest,
        }
    }
}

fn main() -> Result<()> {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("VFHASH_LOG")
                .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load().context("Failed to load configuration")?;
    config.mounts = mount::merge_mounts(&config.mounts, &cli.mounts);

    match cli.command {
        Commands::Hash { paths, timeout_ms } => {
            let rows = hash_paths(&config, paths, Duration::from_millis(timeout_ms))?;
            print_rows(&rows, cli.json)
        }
        Commands::Scan { prefix, timeout_ms } => {
            let paths = scan_prefix(&config, &prefix)?;
            vfhash_config::log_cli_info!(
                "Scan collected files",
                prefix = prefix.as_str(),
                files = paths.len()
            );
            let rows = hash_paths(&config, paths, Duration::from_millis(timeout_ms))?;
            print_rows(&rows, cli.json)
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            ConfigCommands::Path => {
                match Config::global_config_path() {
                    Some(p) => println!("Global:  {}", p.display()),
                    None => println!("Global:  (no home directory)"),
                }
                println!("Project: .vfhash/config.toml");
                Ok(())
            }
        },
    }
}

/// Run one session over `paths` and collect a row per path, in input order.
fn hash_paths(config: &Config, paths: Vec<String>, timeout: Duration) -> Result<Vec<HashRow>> {
    let table = mount::build_table(&config.mounts)?;
    let service = FileHashService::new(&config.hasher, std::sync::Arc::new(table));
    service
        .on_session_ready()
        .context("Failed to start hash worker")?;

    let accepted: Vec<(String, bool)> = paths
        .into_iter()
        .map(|path| {
            let ok = service.submit_fetch(&path);
            (path, ok)
        })
        .collect();

    // None: the timeout is too large to have a deadline
    let deadline = Instant::now().checked_add(timeout);
    let rows = accepted
        .into_iter()
        .map(|(path, ok)| {
            if !ok {
                return HashRow::rejected(path);
            }
            let left = deadline.map_or(Duration::MAX, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });
            let state = service.wait_until_ready(&path, left);
            HashRow::from_state(path, state)
        })
        .collect();

    let drained = service.on_session_shutdown();
    if drained > 0 {
        vfhash_config::log_cli_info!("Timed out with work queued", drained = drained);
    }
    service.shutdown()?;
    Ok(rows)
}

/// Virtual paths of every regular file under the directory mounted at `prefix`
fn scan_prefix(config: &Config, prefix: &str) -> Result<Vec<String>> {
    let root = mount::host_dir(&config.mounts, prefix)?;
    let mut paths = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match mount::virtual_path(prefix, root, entry.path()) {
            Some(path) => paths.push(path),
            None => tracing::warn!("Skipping non-UTF-8 path {}", entry.path().display()),
        }
    }
    Ok(paths)
}

fn print_rows(rows: &[HashRow], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    for row in rows {
        match &row.digest {
            Some(digest) => println!("{}\t{}", row.path, digest),
            None => println!("{}\t{}", row.path, row.status),
        }
    }
    Ok(())
}
