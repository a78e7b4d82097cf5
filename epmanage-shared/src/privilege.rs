use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Prefix carried by every privilege entry in a token's audience list.
pub const PRIVILEGE_PREFIX: &str = "urn:cmi_";

/// Audience entry marking a token that still needs a second factor.
pub const MFA_AUDIENCE: &str = "urn:cmi_mfa";

/// Privileges the backend grants through the token audience.
///
/// Unlike a role hierarchy these are independent grants: holding `superadmin`
/// does not imply `ro`. The backend lists every privilege a user has.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    #[serde(rename = "ro")]
    ReadOnly,
    #[serde(rename = "rw")]
    ReadWrite,
    Admin,
    SuperAdmin,
}

impl Privilege {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::ReadOnly => "ro",
            Privilege::ReadWrite => "rw",
            Privilege::Admin => "admin",
            Privilege::SuperAdmin => "superadmin",
        }
    }

    pub fn granted_by<S: AsRef<str>>(&self, privileges: &[S]) -> bool {
        privileges.iter().any(|p| p.as_ref() == self.as_str())
    }
}

impl Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
