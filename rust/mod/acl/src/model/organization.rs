use serde::{Deserialize, Serialize};

use super::policy::AclPolicy;

/// Default node key expiry, in days.
pub const DEFAULT_EXPIRY_DURATION: u32 = 180;

/// An organization record. `(name, provider)` is unique; `stable_id` is
/// unique across all rows.
///
/// Only `acl_policy` is read or written by the policy commands; the other
/// columns belong to the control server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub stable_id: String,
    pub name: String,
    pub provider: String,

    /// Node key expiry in days.
    pub expiry_duration: u32,
    pub enable_magic: bool,
    pub magic_dns_domain: String,
    pub override_local: bool,

    /// None when the column is NULL.
    pub acl_policy: Option<AclPolicy>,

    pub navi_deploy_key: String,
    pub navi_deploy_pub: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrganization {
    pub name: String,
    pub provider: String,
    pub expiry_duration: u32,
    pub enable_magic: bool,
    pub magic_dns_domain: String,
    pub override_local: bool,
    pub acl_policy: Option<AclPolicy>,
    pub navi_deploy_key: String,
    pub navi_deploy_pub: String,
}

impl Default for NewOrganization {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: String::new(),
            expiry_duration: DEFAULT_EXPIRY_DURATION,
            enable_magic: false,
            magic_dns_domain: String::new(),
            override_local: false,
            acl_policy: None,
            navi_deploy_key: String::new(),
            navi_deploy_pub: String::new(),
        }
    }
}
