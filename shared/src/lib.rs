//! Shared types for the BizDesk client
//!
//! Common types used across the auth and client crates: the access-control
//! data model (roles, permissions, overrides, permission groups, packages),
//! error codes and the unified error type.

pub mod error;
pub mod models;
pub mod types;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use models::{
    CustomModulePermissions, Employee, GroupModuleGrant, ModuleOverride, PackageLimits,
    PermissionGroup, PermissionGroupCreate, PermissionGroupUpdate, PlanType, Role,
};
pub use types::{Permission, PermissionParseError};
