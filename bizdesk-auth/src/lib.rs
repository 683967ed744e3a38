//! BizDesk authorization core
//!
//! Decides which `module:action` permissions a user may exercise:
//! - [`registry`] - catalogue of modules and the permissions they define
//! - [`roles`] - default permissions of each [`Role`](shared::Role)
//! - [`hierarchy`] - which roles a role may assign to others
//! - [`resolver`] - the grant decision (token claims, role defaults, custom overrides)
//! - [`session`] - [`AuthSession`], the single owner of the current user's auth state
//! - [`token`] - permission claims extracted from access tokens
//! - [`modules`] - navigation modules and their advisory dependencies
//! - [`package`] - subscription package ceiling on customization features

pub mod hierarchy;
pub mod modules;
pub mod package;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod token;

pub use hierarchy::{assignable_roles, can_assign, ensure_can_assign};
pub use modules::{DependencyWarning, ModuleConfig, ModuleRegistry};
pub use package::{can_customize, constrain_group, effective_package_id, ensure_custom_form_slot};
pub use registry::{
    MODULE_PERMISSIONS, ModulePermissionConfig, all_permissions, is_valid_permission,
};
pub use resolver::{AuthContext, PermissionChecker, is_granted, is_granted_all, is_granted_any};
pub use roles::{ADMIN_ONLY_PERMISSIONS, RoleTable, permissions_for_role};
pub use session::AuthSession;
pub use token::{
    Claims, JwtConfig, JwtDecoder, PermissionClaim, TokenDecoder, TokenError,
    UnverifiedClaimsDecoder,
};
