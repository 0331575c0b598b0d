use std::collections::BTreeMap;
use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use super::prefix::HostPrefix;

/// Group alias → member identifiers, e.g. `"group:eng": ["alice@example.com"]`.
pub type Groups = BTreeMap<String, Vec<String>>;

/// Host alias → address with prefix length.
pub type Hosts = BTreeMap<String, HostPrefix>;

/// Tag → identities allowed to apply it.
pub type TagOwners = BTreeMap<String, Vec<String>>;

/// A tailnet ACL policy document.
///
/// Every field is optional on input: a missing key or an explicit `null`
/// decodes to an empty container. Keys match without regard to ASCII case,
/// a repeated key keeps its last value, and unknown keys are ignored.
/// Mappings are ordered by key so the encoded form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AclPolicy {
    pub groups: Groups,
    pub hosts: Hosts,
    pub tag_owners: TagOwners,
    pub acls: Vec<AclRule>,
    pub tests: Vec<AclTest>,
    pub auto_approvers: AutoApprovers,
    pub ssh: Vec<SshRule>,
}

/// One `acls` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AclRule {
    pub action: String,

    #[serde(rename = "proto")]
    pub protocol: String,

    #[serde(rename = "src")]
    pub sources: Vec<String>,

    #[serde(rename = "dst")]
    pub destinations: Vec<String>,
}

/// A policy self-check. Stored and returned as-is, never evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AclTest {
    #[serde(rename = "src")]
    pub source: String,

    pub accept: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

/// Identities whose advertised routes or exit-node status are approved
/// automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoApprovers {
    /// Route CIDR → approvers. Keys are kept as written.
    pub routes: BTreeMap<String, Vec<String>>,
    pub exit_node: Vec<String>,
}

/// One `ssh` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SshRule {
    pub action: String,

    #[serde(rename = "src")]
    pub sources: Vec<String>,

    #[serde(rename = "dst")]
    pub destinations: Vec<String>,
    pub users: Vec<String>,

    #[serde(rename = "checkPeriod", skip_serializing_if = "Option::is_none")]
    pub check_period: Option<String>,
}

impl AclPolicy {
    /// True when no section holds anything.
    pub fn is_empty(&self) -> bool {
        self == &AclPolicy::default()
    }
}

/// A field value where `null` decodes like a missing key. Older rows store
/// empty sections as `null`.
struct OrEmpty<T>(T);

impl<'de, T> Deserialize<'de> for OrEmpty<T>
where
    T: Default + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(OrEmpty(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
    }
}

/// Implements `Deserialize` for a policy struct from its wire keys.
///
/// Policy files are hand-written, so `"ACLs"` and `"TagOwners"` must land in
/// the same fields as `"acls"` and `"tagOwners"`. Wire keys within one struct
/// never collide once case is ignored.
macro_rules! policy_deserialize {
    ($name:ident { $($field:ident => $key:literal),+ $(,)? }) => {
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                struct FieldsVisitor;

                impl<'de> Visitor<'de> for FieldsVisitor {
                    type Value = $name;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        f.write_str(concat!("a JSON object for ", stringify!($name)))
                    }

                    fn visit_map<A>(self, mut map: A) -> Result<$name, A::Error>
                    where
                        A: MapAccess<'de>,
                    {
                        let mut out = <$name>::default();
                        while let Some(key) = map.next_key::<String>()? {
                            $(
                                if key.eq_ignore_ascii_case($key) {
                                    out.$field = map.next_value::<OrEmpty<_>>()?.0;
                                    continue;
                                }
                            )+
                            map.next_value::<IgnoredAny>()?;
                        }
                        Ok(out)
                    }
                }

                deserializer.deserialize_map(FieldsVisitor)
            }
        }
    };
}

policy_deserialize!(AclPolicy {
    groups => "groups",
    hosts => "hosts",
    tag_owners => "tagOwners",
    acls => "acls",
    tests => "tests",
    auto_approvers => "autoApprovers",
    ssh => "ssh",
});

policy_deserialize!(AclRule {
    action => "action",
    protocol => "proto",
    sources => "src",
    destinations => "dst",
});

policy_deserialize!(AclTest {
    source => "src",
    accept => "accept",
    deny => "deny",
});

policy_deserialize!(AutoApprovers {
    routes => "routes",
    exit_node => "exitNode",
});

policy_deserialize!(SshRule {
    action => "action",
    sources => "src",
    destinations => "dst",
    users => "users",
    check_period => "checkPeriod",
});
