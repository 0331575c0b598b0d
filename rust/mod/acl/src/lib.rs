//! ACL policy storage for a mesh control server.
//!
//! The policy document (groups, hosts, tag owners, ACL rules, tests, auto
//! approvers, SSH rules) lives as JSON in the `acl_policy` column of the
//! `organizations` table of an embedded SQLite database.
//!
//! # Usage
//!
//! ```ignore
//! use meshacl_acl::{PolicyStore, load_policy_file};
//!
//! let policy = load_policy_file(&policy_path)?;
//! let store = PolicyStore::open(&db_path)?;
//! store.replace_policy(&policy)?; // every organization row
//! let stored = store.fetch_policy()?;
//! ```

pub mod codec;
pub mod error;
pub mod file;
pub mod model;
pub mod service;

pub use codec::{DecodeError, Origin};
pub use error::AclError;
pub use file::{load_policy_file, write_policy_file};
pub use model::{AclPolicy, HostPrefix, NewOrganization, Organization};
pub use service::PolicyStore;
