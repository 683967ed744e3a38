//! Data models
//!
//! Shared between the auth core and the client (via API and local cache).
//! Wire field names are camelCase.

pub mod employee;
pub mod package;
pub mod permission_group;
pub mod role;

// Re-exports
pub use employee::*;
pub use package::*;
pub use permission_group::*;
pub use role::*;
