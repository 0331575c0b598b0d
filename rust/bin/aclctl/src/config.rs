//! Per-invocation configuration: the action and the resolved file paths.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Print the stored policy.
    Get,
    /// Replace the stored policy from the policy file.
    Set,
}

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub action: Action,

    /// Policy JSON file read by `set` and written by `get -w`.
    pub policy_path: PathBuf,

    /// SQLite database file.
    pub db_path: PathBuf,

    /// On `get`, also write the policy to `policy_path`.
    pub write_back: bool,
}

impl ToolConfig {
    /// Build the configuration, resolving relative paths against `base`.
    pub fn resolve(
        action: Action,
        policy: &Path,
        db: &Path,
        write_back: bool,
        base: &Path,
    ) -> Self {
        Self {
            action,
            policy_path: resolve_in(base, policy),
            db_path: resolve_in(base, db),
            write_back,
        }
    }
}

/// Directory containing the running executable.
pub fn app_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe().context("failed to locate executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent()
        .map(Path::to_path_buf)
        .context("executable has no parent directory")
}

fn resolve_in(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
