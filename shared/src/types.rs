//! Common types for the shared crate
//!
//! Utility types used across the workspace

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timestamp type (Unix milliseconds)
pub type Timestamp = i64;

/// A parsed `module:action` permission.
///
/// Token claims and persisted records carry permissions as plain strings;
/// they are parsed into this type once at the boundary so the resolver
/// never re-splits strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Permission {
    module: String,
    action: String,
}

/// Error when a string is not of the `module:action` shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed permission: {0:?}")]
pub struct PermissionParseError(pub String);

impl Permission {
    pub fn new(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Split a raw string into its module and action halves.
    ///
    /// Exactly one `:` separator is required and neither half may be empty.
    pub fn split(raw: &str) -> Option<(&str, &str)> {
        let (module, action) = raw.split_once(':')?;
        if module.is_empty() || action.is_empty() || action.contains(':') {
            return None;
        }
        Some((module, action))
    }

    /// Check if this permission is the given raw string
    pub fn matches(&self, raw: &str) -> bool {
        Self::split(raw).is_some_and(|(m, a)| m == self.module && a == self.action)
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::split(s)
            .map(|(module, action)| Self::new(module, action))
            .ok_or_else(|| PermissionParseError(s.to_string()))
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(p: Permission) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}
