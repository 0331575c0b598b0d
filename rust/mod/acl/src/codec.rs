//! JSON encoding of [`AclPolicy`] for policy files and the `acl_policy` column.
//!
//! Files and the column share one schema, so a value read from either can be
//! written to the other unchanged.

use std::fmt;
use std::path::PathBuf;

use meshacl_sql::Value;
use thiserror::Error;

use crate::model::AclPolicy;

/// Fully qualified name of the column holding the encoded policy.
pub const POLICY_COLUMN: &str = "organizations.acl_policy";

/// Where an encoded policy was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Input,
    File(PathBuf),
    Column(&'static str),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Input => write!(f, "input"),
            Origin::File(path) => write!(f, "file {}", path.display()),
            Origin::Column(name) => write!(f, "column {}", name),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    /// Malformed JSON or a field of the wrong type. The serde_json message
    /// carries the line and column.
    #[error("unmarshal policy from {origin} failed: {cause}")]
    Json {
        origin: Origin,
        cause: serde_json::Error,
    },

    /// The column held something other than text or bytes.
    #[error("unmarshal policy from {origin} failed: unexpected data type {found}")]
    UnexpectedType {
        origin: Origin,
        found: &'static str,
    },
}

impl DecodeError {
    pub fn origin(&self) -> &Origin {
        match self {
            DecodeError::Json { origin, .. } | DecodeError::UnexpectedType { origin, .. } => {
                origin
            }
        }
    }

    /// 1-based line of the offending token, for JSON errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            DecodeError::Json { cause, .. } => Some(cause.line()),
            DecodeError::UnexpectedType { .. } => None,
        }
    }
}

/// Compact JSON, as stored in the column.
pub fn encode(policy: &AclPolicy) -> Result<String, serde_json::Error> {
    serde_json::to_string(policy)
}

/// Two-space indented JSON, as printed by `get` and written to policy files.
pub fn encode_pretty(policy: &AclPolicy) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(policy)
}

pub fn decode(text: &str) -> Result<AclPolicy, DecodeError> {
    decode_from(text.as_bytes(), Origin::Input)
}

pub fn decode_bytes(bytes: &[u8]) -> Result<AclPolicy, DecodeError> {
    decode_from(bytes, Origin::Input)
}

/// Decode JSON, tagging any error with `origin`.
pub fn decode_from(bytes: &[u8], origin: Origin) -> Result<AclPolicy, DecodeError> {
    serde_json::from_slice(bytes).map_err(|cause| DecodeError::Json { origin, cause })
}

/// Decode the policy column as read from the database.
///
/// Text and blob storage both go through the same JSON path. NULL means the
/// row has no policy. Any other storage class is a type mismatch.
pub fn decode_column(value: &Value) -> Result<Option<AclPolicy>, DecodeError> {
    let origin = Origin::Column(POLICY_COLUMN);
    let bytes: &[u8] = match value {
        Value::Text(text) => text.as_bytes(),
        Value::Blob(bytes) => bytes,
        Value::Null => return Ok(None),
        other => {
            return Err(DecodeError::UnexpectedType {
                origin,
                found: other.type_name(),
            });
        }
    };
    decode_from(bytes, origin).map(Some)
}

/// Encode for the policy column. Always text.
pub fn encode_column(policy: &AclPolicy) -> Result<Value, serde_json::Error> {
    encode(policy).map(Value::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AclRule, AclTest, AutoApprovers, SshRule};

    fn sample_policy() -> AclPolicy {
        let mut policy = AclPolicy::default();
        policy.groups.insert(
            "group:eng".to_string(),
            vec!["alice@example.com".to_string(), "bob@example.com".to_string()],
        );
        policy.groups.insert("group:empty".to_string(), vec![]);
        policy
            .hosts
            .insert("db".to_string(), "10.0.0.5/32".parse().unwrap());
        policy
            .hosts
            .insert("lab".to_string(), "fd7a:115c:a1e0::/48".parse().unwrap());
        policy
            .tag_owners
            .insert("tag:prod".to_string(), vec!["group:eng".to_string()]);
        policy.acls.push(AclRule {
            action: "accept".to_string(),
            protocol: "tcp".to_string(),
            sources: vec!["group:eng".to_string()],
            destinations: vec!["db:5432".to_string(), "lab:*".to_string()],
        });
        policy.tests.push(AclTest {
            source: "alice@example.com".to_string(),
            accept: vec!["db:5432".to_string()],
            deny: vec!["db:22".to_string()],
        });
        policy.auto_approvers = AutoApprovers {
            routes: [(
                "10.0.0.0/16".to_string(),
                vec!["tag:prod".to_string()],
            )]
            .into_iter()
            .collect(),
            exit_node: vec!["group:eng".to_string()],
        };
        policy.ssh.push(SshRule {
            action: "check".to_string(),
            sources: vec!["group:eng".to_string()],
            destinations: vec!["tag:prod".to_string()],
            users: vec!["root".to_string(), "autogroup:nonroot".to_string()],
            check_period: Some("12h".to_string()),
        });
        policy
    }

    #[test]
    fn test_round_trip() {
        let policy = sample_policy();
        assert_eq!(decode(&encode(&policy).unwrap()).unwrap(), policy);
        assert_eq!(decode(&encode_pretty(&policy).unwrap()).unwrap(), policy);

        let empty = AclPolicy::default();
        assert_eq!(decode(&encode(&empty).unwrap()).unwrap(), empty);
    }

    #[test]
    fn test_pretty_uses_two_space_indent_in_schema_order() {
        let text = encode_pretty(&AclPolicy::default()).unwrap();
        assert!(text.starts_with("{\n  \"groups\": {},\n  \"hosts\": {},"));
        let keys = ["groups", "hosts", "tagOwners", "acls", "tests", "autoApprovers", "ssh"];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| text.find(&format!("\"{}\"", k)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_text_and_blob_columns_decode_identically() {
        let text = encode(&sample_policy()).unwrap();
        let from_text = decode_column(&Value::Text(text.clone())).unwrap();
        let from_blob = decode_column(&Value::Blob(text.into_bytes())).unwrap();
        assert_eq!(from_text, from_blob);
        assert_eq!(from_text, Some(sample_policy()));
    }

    #[test]
    fn test_column_null_is_no_policy() {
        assert_eq!(decode_column(&Value::Null).unwrap(), None);
    }

    #[test]
    fn test_column_unexpected_type() {
        let err = decode_column(&Value::Integer(7)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedType { found: "integer", .. }
        ));
        assert_eq!(err.origin(), &Origin::Column(POLICY_COLUMN));
        assert!(decode_column(&Value::Real(1.5)).is_err());
    }

    #[test]
    fn test_encode_column_is_text() {
        let value = encode_column(&sample_policy()).unwrap();
        assert!(matches!(value, Value::Text(_)));
    }

    #[test]
    fn test_rejects_bad_cidr() {
        let err = decode(r#"{"hosts": {"a": "not-a-cidr"}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Json { .. }));
        assert_eq!(err.line(), Some(1));
        assert!(err.to_string().contains("not-a-cidr"));
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(decode(r#"{"acls": "not-a-list"}"#).is_err());
        assert!(decode(r#"{"acls": [{"action": 1}]}"#).is_err());
        assert!(decode(r#"{"groups": {"g": [1, 2]}}"#).is_err());
        assert!(decode(r#"["not", "an", "object"]"#).is_err());
    }

    #[test]
    fn test_rejects_non_json() {
        let err = decode("groups = eng").unwrap_err();
        assert!(err.to_string().starts_with("unmarshal policy from input failed"));
        assert!(decode_bytes(b"").is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let policy = decode(r#"{"randomizeClientPort": true, "groups": {"g": ["a"]}}"#).unwrap();
        assert_eq!(policy.groups["g"], vec!["a".to_string()]);
    }

    #[test]
    fn test_capitalized_keys_are_not_dropped() {
        let policy = decode(
            r#"{"ACLs":[{"action":"accept","src":["*"],"dst":["*:*"]}],"TagOwners":{"tag:a":["x"]}}"#,
        )
        .unwrap();
        assert_eq!(policy.acls.len(), 1);
        assert_eq!(policy.tag_owners.len(), 1);

        // Re-encoding normalizes to the canonical key names.
        let text = encode(&policy).unwrap();
        assert!(text.contains("\"acls\":[") && text.contains("\"tagOwners\":{"));
    }

    #[test]
    fn test_duplicate_key_is_accepted() {
        let policy = decode(r#"{"groups":{"g":["a"]},"groups":{"h":["b"]}}"#).unwrap();
        assert_eq!(policy.groups.keys().collect::<Vec<_>>(), vec!["h"]);
    }

    #[test]
    fn test_decodes_rows_with_null_sections() {
        // Empty sections written as null, as older rows have them.
        let stored = r#"{"groups":null,"hosts":null,"tagOwners":null,
            "acls":[{"action":"accept","proto":"","src":["*"],"dst":null}],
            "tests":null,"autoApprovers":{"routes":null,"exitNode":null},"ssh":null}"#;
        let policy = decode_column(&Value::Text(stored.to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(policy.acls.len(), 1);
        assert!(policy.acls[0].destinations.is_empty());
        assert!(policy.auto_approvers.routes.is_empty());
    }
}
