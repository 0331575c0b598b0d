use meshacl_sql::{Row, Value};
use tracing::debug;

use crate::codec;
use crate::error::AclError;
use crate::model::{NewOrganization, Organization};
use crate::service::{PolicyStore, new_id, now_rfc3339};

const COLUMNS: &str = "id, stable_id, name, provider, expiry_duration, enable_magic, \
    magic_dns_domain, override_local, acl_policy, navi_deploy_key, navi_deploy_pub, \
    created_at, updated_at";

impl PolicyStore {
    /// Insert an organization record. A duplicate `(name, provider)` is a conflict.
    pub fn create_organization(&self, input: NewOrganization) -> Result<Organization, AclError> {
        let stable_id = new_id();
        let now = now_rfc3339();
        let acl_policy = match &input.acl_policy {
            Some(policy) => {
                codec::encode_column(policy).map_err(|e| AclError::Encode(e.to_string()))?
            }
            None => Value::Null,
        };

        let sql = format!(
            "INSERT INTO organizations ({}) VALUES (NULL, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            COLUMNS
        );
        self.sql
            .exec(
                &sql,
                &[
                    Value::Text(stable_id.clone()),
                    Value::Text(input.name.clone()),
                    Value::Text(input.provider.clone()),
                    Value::Integer(i64::from(input.expiry_duration)),
                    Value::Integer(i64::from(input.enable_magic)),
                    Value::Text(input.magic_dns_domain),
                    Value::Integer(i64::from(input.override_local)),
                    acl_policy,
                    Value::Text(input.navi_deploy_key),
                    Value::Text(input.navi_deploy_pub),
                    Value::Text(now.clone()),
                    Value::Text(now),
                ],
            )
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE constraint") {
                    AclError::Conflict(format!(
                        "organization {}/{}: {}",
                        input.name, input.provider, msg
                    ))
                } else {
                    AclError::Storage(msg)
                }
            })?;

        debug!(name = %input.name, provider = %input.provider, "organization created");
        self.find_one("stable_id = ?1", &[Value::Text(stable_id)])
    }

    /// Look up the organization for a `(name, provider)` pair.
    pub fn get_organization(&self, name: &str, provider: &str) -> Result<Organization, AclError> {
        self.find_one(
            "name = ?1 AND provider = ?2",
            &[Value::Text(name.to_string()), Value::Text(provider.to_string())],
        )
    }

    /// All organization records, ordered by id.
    pub fn list_organizations(&self) -> Result<Vec<Organization>, AclError> {
        let sql = format!("SELECT {} FROM organizations ORDER BY id", COLUMNS);
        let rows = self
            .sql
            .query(&sql, &[])
            .map_err(|e| AclError::Storage(e.to_string()))?;
        rows.iter().map(organization_from_row).collect()
    }

    fn find_one(&self, where_sql: &str, params: &[Value]) -> Result<Organization, AclError> {
        let sql = format!("SELECT {} FROM organizations WHERE {}", COLUMNS, where_sql);
        let rows = self
            .sql
            .query(&sql, params)
            .map_err(|e| AclError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| AclError::NotFound(format!("organization where {}", where_sql)))?;
        organization_from_row(row)
    }
}

fn organization_from_row(row: &Row) -> Result<Organization, AclError> {
    let text = |name: &str| row.text(name).unwrap_or_default().to_string();

    let id = row
        .integer("id")
        .ok_or_else(|| AclError::Storage("missing id column".into()))?;
    let expiry_duration = row
        .integer("expiry_duration")
        .map(u32::try_from)
        .transpose()
        .map_err(|e| AclError::Storage(format!("expiry_duration: {}", e)))?
        .unwrap_or(crate::model::organization::DEFAULT_EXPIRY_DURATION);
    let acl_policy = codec::decode_column(row.get("acl_policy").unwrap_or(&Value::Null))?;

    Ok(Organization {
        id,
        stable_id: text("stable_id"),
        name: text("name"),
        provider: text("provider"),
        expiry_duration,
        enable_magic: row.flag("enable_magic").unwrap_or(false),
        magic_dns_domain: text("magic_dns_domain"),
        override_local: row.flag("override_local").unwrap_or(false),
        acl_policy,
        navi_deploy_key: text("navi_deploy_key"),
        navi_deploy_pub: text("navi_deploy_pub"),
        created_at: text("created_at"),
        updated_at: text("updated_at"),
    })
}
