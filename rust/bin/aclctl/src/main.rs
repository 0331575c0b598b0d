//! `aclctl`: read or replace the ACL policy stored in the control server
//! database.
//!
//! Usage:
//!   aclctl [-a get|set] [-f policy.json] [-w] [--db db.sqlite] [-v]
//!
//! Relative paths resolve against the directory holding the executable.
//! stdout carries only the policy JSON; logs go to stderr.

mod commands;
mod config;

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{Action, ToolConfig};

/// Get or set the stored ACL policy.
#[derive(Parser, Debug)]
#[command(name = "aclctl", about = "Get or set the stored ACL policy")]
struct Cli {
    /// Action to run.
    #[arg(short = 'a', long = "action", value_enum, default_value_t = Action::Get)]
    action: Action,

    /// Policy JSON file: read by `set`, written by `get -w`.
    #[arg(short = 'f', long = "file", default_value = "policy.json")]
    file: PathBuf,

    /// On `get`, also write the policy to the file.
    #[arg(short = 'w', long = "write")]
    write: bool,

    /// SQLite database file.
    #[arg(long = "db", default_value = "db.sqlite")]
    db: PathBuf,

    /// Debug logging (RUST_LOG overrides).
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .init();

    let base = config::app_dir()?;
    let config = ToolConfig::resolve(cli.action, &cli.file, &cli.db, cli.write, &base);
    debug!(?config, "resolved configuration");

    match config.action {
        Action::Get => commands::get::run(&config),
        Action::Set => commands::set::run(&config),
    }
}
