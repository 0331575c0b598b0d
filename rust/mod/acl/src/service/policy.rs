use meshacl_sql::Value;
use tracing::{debug, warn};

use crate::codec;
use crate::error::AclError;
use crate::model::AclPolicy;
use crate::service::{PolicyStore, now_rfc3339};

impl PolicyStore {
    /// Read the policy stored on an organization record.
    ///
    /// Takes whichever row SQLite returns first; there is no row-selection key.
    /// No rows is `NotFound`. A NULL column yields the empty policy.
    pub fn fetch_policy(&self) -> Result<AclPolicy, AclError> {
        let rows = self
            .sql
            .query("SELECT acl_policy FROM organizations LIMIT 1", &[])
            .map_err(|e| AclError::Storage(e.to_string()))?;

        let row = rows
            .first()
            .ok_or_else(|| AclError::NotFound("no organization record".into()))?;

        match codec::decode_column(row.get("acl_policy").unwrap_or(&Value::Null))? {
            Some(policy) => Ok(policy),
            None => {
                debug!("organization has no stored policy");
                Ok(AclPolicy::default())
            }
        }
    }

    /// Store `policy` on every organization record, in one transaction.
    ///
    /// The update has no WHERE clause: all rows change or none do. Returns the
    /// number of rows updated.
    pub fn replace_policy(&self, policy: &AclPolicy) -> Result<u64, AclError> {
        let encoded = codec::encode_column(policy).map_err(|e| AclError::Encode(e.to_string()))?;
        let params = [encoded, Value::Text(now_rfc3339())];

        let updated = self
            .sql
            .exec_tx(&[(
                "UPDATE organizations SET acl_policy = ?1, updated_at = ?2",
                &params[..],
            )])
            .map_err(|e| AclError::Update(e.to_string()))?;

        if updated == 0 {
            warn!("no organization records; policy not stored");
        } else {
            debug!(rows = updated, "policy replaced");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeError;
    use crate::model::{AclRule, NewOrganization};

    fn org(name: &str) -> NewOrganization {
        NewOrganization {
            name: name.to_string(),
            provider: "oidc".to_string(),
            ..Default::default()
        }
    }

    fn policy_with_action(action: &str) -> AclPolicy {
        AclPolicy {
            acls: vec![AclRule {
                action: action.to_string(),
                sources: vec!["*".to_string()],
                destinations: vec!["*:*".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_fetch_without_rows_is_not_found() {
        let store = PolicyStore::open_in_memory().unwrap();
        let err = store.fetch_policy().unwrap_err();
        assert!(matches!(err, AclError::NotFound(_)));
    }

    #[test]
    fn test_fetch_null_column_is_empty_policy() {
        let store = PolicyStore::open_in_memory().unwrap();
        store.create_organization(org("alpha")).unwrap();
        assert!(store.fetch_policy().unwrap().is_empty());
    }

    #[test]
    fn test_replace_then_fetch() {
        let store = PolicyStore::open_in_memory().unwrap();
        store.create_organization(org("alpha")).unwrap();

        let policy = policy_with_action("accept");
        assert_eq!(store.replace_policy(&policy).unwrap(), 1);
        assert_eq!(store.fetch_policy().unwrap(), policy);
    }

    #[test]
    fn test_replace_stores_text() {
        let store = PolicyStore::open_in_memory().unwrap();
        store.create_organization(org("alpha")).unwrap();
        store.replace_policy(&policy_with_action("accept")).unwrap();

        let rows = store
            .sql
            .query("SELECT typeof(acl_policy) AS t FROM organizations", &[])
            .unwrap();
        assert_eq!(rows[0].text("t"), Some("text"));
    }

    // replace_policy has no row-selection key and rewrites every organization.
    // This mirrors the single-organization deployment the tool was built for;
    // a targeted single-row update would be a behavior change.
    #[test]
    fn test_replace_updates_every_organization() {
        let store = PolicyStore::open_in_memory().unwrap();
        store
            .create_organization(NewOrganization {
                acl_policy: Some(policy_with_action("alpha-only")),
                ..org("alpha")
            })
            .unwrap();
        store
            .create_organization(NewOrganization {
                acl_policy: Some(policy_with_action("beta-only")),
                ..org("beta")
            })
            .unwrap();

        let policy = policy_with_action("accept");
        assert_eq!(store.replace_policy(&policy).unwrap(), 2);

        let orgs = store.list_organizations().unwrap();
        assert_eq!(orgs.len(), 2);
        for o in &orgs {
            assert_eq!(o.acl_policy.as_ref(), Some(&policy), "org {}", o.name);
        }
    }

    #[test]
    fn test_replace_is_all_or_nothing() {
        let store = PolicyStore::open_in_memory().unwrap();
        let before = policy_with_action("before");
        for name in ["alpha", "beta"] {
            store
                .create_organization(NewOrganization {
                    acl_policy: Some(before.clone()),
                    ..org(name)
                })
                .unwrap();
        }
        store
            .sql
            .exec(
                "CREATE TRIGGER refuse_beta BEFORE UPDATE OF acl_policy ON organizations
                 WHEN OLD.name = 'beta'
                 BEGIN SELECT RAISE(ABORT, 'refused'); END",
                &[],
            )
            .unwrap();

        let err = store.replace_policy(&policy_with_action("after")).unwrap_err();
        assert!(matches!(err, AclError::Update(_)));

        for o in store.list_organizations().unwrap() {
            assert_eq!(o.acl_policy, Some(before.clone()), "org {}", o.name);
        }
    }

    #[test]
    fn test_replace_without_rows() {
        let store = PolicyStore::open_in_memory().unwrap();
        assert_eq!(store.replace_policy(&policy_with_action("accept")).unwrap(), 0);
        assert!(matches!(store.fetch_policy(), Err(AclError::NotFound(_))));
    }

    #[test]
    fn test_fetch_blob_column() {
        let store = PolicyStore::open_in_memory().unwrap();
        store.create_organization(org("alpha")).unwrap();

        let policy = policy_with_action("accept");
        let text = codec::encode(&policy).unwrap();
        store
            .sql
            .exec(
                "UPDATE organizations SET acl_policy = ?1",
                &[Value::Blob(text.into_bytes())],
            )
            .unwrap();

        assert_eq!(store.fetch_policy().unwrap(), policy);
    }

    #[test]
    fn test_fetch_corrupt_column() {
        let store = PolicyStore::open_in_memory().unwrap();
        store.create_organization(org("alpha")).unwrap();

        store
            .sql
            .exec(
                "UPDATE organizations SET acl_policy = ?1",
                &[Value::Text("{\"hosts\": {\"db\": \"10.0.0.1\"}}".to_string())],
            )
            .unwrap();
        assert!(matches!(
            store.fetch_policy(),
            Err(AclError::Decode(DecodeError::Json { .. }))
        ));
    }
}
