//! `aclctl -a get`: print the stored policy, optionally saving it to the
//! policy file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use meshacl_acl::{PolicyStore, codec, write_policy_file};

use crate::config::ToolConfig;

pub fn run(config: &ToolConfig) -> Result<()> {
    let store = PolicyStore::open(&config.db_path)?;
    let write_to = config.write_back.then_some(config.policy_path.as_path());
    let stdout = std::io::stdout();
    execute(&store, &mut stdout.lock(), write_to)
}

/// Print the pretty policy to `out`; when `write_to` is set, write the same
/// text to that file.
pub fn execute<W: Write>(store: &PolicyStore, out: &mut W, write_to: Option<&Path>) -> Result<()> {
    let policy = store.fetch_policy()?;
    let text = codec::encode_pretty(&policy).context("failed to encode policy")?;

    writeln!(out, "{}", text)?;
    if let Some(path) = write_to {
        write_policy_file(path, &text)?;
    }
    Ok(())
}
