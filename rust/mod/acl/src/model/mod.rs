pub mod organization;
pub mod policy;
pub mod prefix;

pub use organization::{NewOrganization, Organization};
pub use policy::{AclPolicy, AclRule, AclTest, AutoApprovers, Groups, Hosts, SshRule, TagOwners};
pub use prefix::{HostPrefix, PrefixError};
