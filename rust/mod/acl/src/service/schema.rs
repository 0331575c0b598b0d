use meshacl_sql::{SQLError, SQLStore};

/// Create the organizations table and its indexes if absent. Never drops data.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), SQLError> {
    let statements = [
        // One row per (name, provider); acl_policy holds the encoded policy.
        "CREATE TABLE IF NOT EXISTS organizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            stable_id TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            provider TEXT NOT NULL DEFAULT '',
            expiry_duration INTEGER NOT NULL DEFAULT 180,
            enable_magic INTEGER NOT NULL DEFAULT 0,
            magic_dns_domain TEXT NOT NULL DEFAULT '',
            override_local INTEGER NOT NULL DEFAULT 0,
            acl_policy TEXT,
            navi_deploy_key TEXT NOT NULL DEFAULT '',
            navi_deploy_pub TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_name_provider ON organizations(name, provider)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])?;
    }

    Ok(())
}
