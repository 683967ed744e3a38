//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity class of a user.
///
/// Ordered from least to most privileged, so `Role::Guest < Role::Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Guest,
    Staff,
    Owner,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0:?}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Every role, most privileged first
    pub const ALL: [Role; 4] = [Role::Admin, Role::Owner, Role::Staff, Role::Guest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
            Role::Staff => "STAFF",
            Role::Guest => "GUEST",
        }
    }

    /// Map a role string from the earlier `admin/manager/user/guest` scheme.
    ///
    /// Current role names are accepted as well, so this can sit at any
    /// boundary that may still see older records or tokens.
    pub fn from_legacy(s: &str) -> Result<Self, UnknownRole> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" | "owner" => Ok(Role::Owner),
            "user" | "staff" => Ok(Role::Staff),
            "guest" => Ok(Role::Guest),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "OWNER" => Ok(Role::Owner),
            "STAFF" => Ok(Role::Staff),
            "GUEST" => Ok(Role::Guest),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
