//! Permission Resolver
//!
//! The central grant decision. Resolution order (first match wins):
//!
//! 1. permissions not loaded yet → granted (optimistic loading window)
//! 2. token-issued permissions contain the permission → granted
//! 3. the role's default list contains the permission → granted
//! 4. a custom override for the permission's module lists its action → granted
//! 5. otherwise → denied
//!
//! Overrides are additive only: they never take away a role default.
//! Step 1 is a usability default, not a security boundary; real enforcement
//! is server-side.

use shared::{CustomModulePermissions, ModuleOverride, Permission, Role};
use std::collections::HashSet;

use crate::roles::permissions_for_role;

/// Authorization state of one user, consumed by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    role: Role,
    token_permissions: Option<HashSet<Permission>>,
    custom_permissions: Option<CustomModulePermissions>,
    permissions_loaded: bool,
}

impl AuthContext {
    /// Context for `role` with nothing loaded yet
    pub fn new(role: Role) -> Self {
        Self {
            role,
            token_permissions: None,
            custom_permissions: None,
            permissions_loaded: false,
        }
    }

    pub fn with_token_permissions<I>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        self.token_permissions = Some(permissions.into_iter().collect());
        self
    }

    pub fn with_custom_permissions(mut self, custom: CustomModulePermissions) -> Self {
        self.custom_permissions = Some(custom);
        self
    }

    pub fn with_permissions_loaded(mut self, loaded: bool) -> Self {
        self.permissions_loaded = loaded;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token_permissions(&self) -> Option<&HashSet<Permission>> {
        self.token_permissions.as_ref()
    }

    pub fn custom_permissions(&self) -> Option<&CustomModulePermissions> {
        self.custom_permissions.as_ref()
    }

    pub fn permissions_loaded(&self) -> bool {
        self.permissions_loaded
    }

    pub(crate) fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub(crate) fn set_token_permissions(&mut self, permissions: Option<HashSet<Permission>>) {
        self.token_permissions = permissions;
    }

    pub(crate) fn custom_permissions_mut(&mut self) -> &mut CustomModulePermissions {
        self.custom_permissions.get_or_insert_with(CustomModulePermissions::new)
    }

    pub(crate) fn set_custom_permissions(&mut self, custom: Option<CustomModulePermissions>) {
        self.custom_permissions = custom;
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.permissions_loaded = true;
    }

    /// Steps 2-5 for an already parsed permission
    pub fn grants(&self, permission: &Permission) -> bool {
        if let Some(token) = &self.token_permissions
            && token.contains(permission)
        {
            return true;
        }

        if permissions_for_role(self.role).contains(permission) {
            return true;
        }

        self.custom_permissions
            .as_ref()
            .and_then(|custom| custom.get(permission.module()))
            .is_some_and(|o: &ModuleOverride| o.allows(permission.action()))
    }
}

/// Check a `module:action` string against a context.
///
/// A string that cannot be parsed is denied once permissions are loaded.
pub fn is_granted(permission: &str, ctx: &AuthContext) -> bool {
    if !ctx.permissions_loaded {
        return true;
    }
    match permission.parse::<Permission>() {
        Ok(p) => ctx.grants(&p),
        Err(_) => false,
    }
}

/// True if any of the permissions is granted
pub fn is_granted_any<S: AsRef<str>>(permissions: &[S], ctx: &AuthContext) -> bool {
    permissions.iter().any(|p| is_granted(p.as_ref(), ctx))
}

/// True if every permission is granted
pub fn is_granted_all<S: AsRef<str>>(permissions: &[S], ctx: &AuthContext) -> bool {
    permissions.iter().all(|p| is_granted(p.as_ref(), ctx))
}

/// Anything that can answer "may the current user do this?"
pub trait PermissionChecker {
    fn can(&self, permission: &str) -> bool;

    fn can_any(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.can(p))
    }

    fn can_all(&self, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.can(p))
    }
}

impl PermissionChecker for AuthContext {
    fn can(&self, permission: &str) -> bool {
        is_granted(permission, self)
    }
}

impl<F> PermissionChecker for F
where
    F: Fn(&str) -> bool,
{
    fn can(&self, permission: &str) -> bool {
        self(permission)
    }
}
