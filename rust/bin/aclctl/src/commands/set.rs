//! `aclctl -a set`: replace the stored policy with the policy file's contents.

use std::io::Write;

use anyhow::Result;
use meshacl_acl::{AclPolicy, PolicyStore, load_policy_file};
use tracing::info;

use crate::config::ToolConfig;

pub fn run(config: &ToolConfig) -> Result<()> {
    // The file is read and validated before the database is opened.
    let policy = load_policy_file(&config.policy_path)?;
    let store = PolicyStore::open(&config.db_path)?;
    let stderr = std::io::stderr();
    execute(&store, &policy, &mut stderr.lock())?;
    Ok(())
}

/// Store `policy` on every organization and report the row count to
/// `report`. Zero rows is reported too: nothing was stored.
pub fn execute<W: Write>(store: &PolicyStore, policy: &AclPolicy, report: &mut W) -> Result<u64> {
    let rows = store.replace_policy(policy)?;
    info!(rows, "policy stored");
    writeln!(report, "policy stored on {} organization record(s)", rows)?;
    Ok(rows)
}
