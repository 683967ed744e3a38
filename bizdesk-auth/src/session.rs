//! Auth Session
//!
//! Single owner of the current user's authorization state. Token-issued
//! permissions and custom overrides change only through the methods here:
//! login, session restore, token refresh, group application, impersonation
//! and logout.
//!
//! UI code asks [`AuthSession::can`] and friends; it never compares roles
//! directly.

use shared::{AppError, CustomModulePermissions, ErrorCode, Permission, PermissionGroup, Role};
use std::collections::HashSet;
use std::sync::Arc;

use crate::hierarchy::ensure_can_assign;
use crate::resolver::{AuthContext, PermissionChecker, is_granted};
use crate::token::{TokenDecoder, UnverifiedClaimsDecoder};

#[derive(Debug, Clone)]
struct ActiveSession {
    user_id: String,
    context: AuthContext,
    /// Context saved while impersonating another role
    original: Option<AuthContext>,
}

/// 当前用户的认证会话
pub struct AuthSession {
    decoder: Arc<dyn TokenDecoder>,
    active: Option<ActiveSession>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new(UnverifiedClaimsDecoder)
    }
}

impl AuthSession {
    pub fn new(decoder: impl TokenDecoder + 'static) -> Self {
        Self::with_decoder(Arc::new(decoder))
    }

    pub fn with_decoder(decoder: Arc<dyn TokenDecoder>) -> Self {
        Self {
            decoder,
            active: None,
        }
    }

    /// Start a session after a successful login.
    ///
    /// A token that cannot be decoded leaves the session without token
    /// permissions; role defaults still apply once overrides are loaded.
    pub fn login(&mut self, user_id: impl Into<String>, role: Role, token: &str) {
        let user_id = user_id.into();
        self.start(user_id, role, token);
        tracing::info!(role = %role, "Login session started");
    }

    /// Start a session from persisted credentials (silent login)
    pub fn restore(&mut self, user_id: impl Into<String>, role: Role, token: &str) {
        let user_id = user_id.into();
        self.start(user_id, role, token);
        tracing::info!(role = %role, "Session restored");
    }

    fn start(&mut self, user_id: String, role: Role, token: &str) {
        let mut context = AuthContext::new(role);
        if let Some(permissions) = self.decode_permissions(token) {
            context.set_token_permissions(Some(permissions));
            context.mark_loaded();
        }
        self.active = Some(ActiveSession {
            user_id,
            context,
            original: None,
        });
    }

    fn decode_permissions(&self, token: &str) -> Option<HashSet<Permission>> {
        match self.decoder.permissions(token) {
            Ok(permissions) => {
                tracing::debug!(count = permissions.len(), "Token permissions decoded");
                Some(permissions)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token permissions unavailable, using role defaults");
                None
            }
        }
    }

    /// Replace token permissions after a successful token refresh
    pub fn refresh_token(&mut self, token: &str) -> Result<(), AppError> {
        let permissions = self.decode_permissions(token);
        let context = self.context_mut()?;
        match permissions {
            Some(p) => {
                context.set_token_permissions(Some(p));
                context.mark_loaded();
            }
            None => context.set_token_permissions(None),
        }
        Ok(())
    }

    /// Install the employee's persisted custom overrides
    pub fn load_custom_permissions(
        &mut self,
        custom: CustomModulePermissions,
    ) -> Result<(), AppError> {
        let context = self.context_mut()?;
        tracing::debug!(modules = custom.len(), "Custom permissions loaded");
        context.set_custom_permissions(Some(custom));
        context.mark_loaded();
        Ok(())
    }

    /// Apply a permission group to the current user's overrides.
    ///
    /// Modules the group declares are replaced; other modules are untouched.
    pub fn apply_group(&mut self, group: &PermissionGroup) -> Result<(), AppError> {
        let context = self.context_mut()?;
        group.apply_to(context.custom_permissions_mut());
        context.mark_loaded();
        tracing::info!(group_id = %group.id, "Permission group applied to session");
        Ok(())
    }

    /// View the app as another role.
    ///
    /// Only roles the real role may assign can be impersonated. Token and
    /// custom permissions are set aside until [`stop_impersonating`](Self::stop_impersonating).
    pub fn impersonate(&mut self, role: Role) -> Result<(), AppError> {
        let active = self.active_mut()?;
        let real = active
            .original
            .as_ref()
            .map(AuthContext::role)
            .unwrap_or(active.context.role());
        ensure_can_assign(real, role)?;

        let mut context = AuthContext::new(role);
        context.mark_loaded();
        let previous = std::mem::replace(&mut active.context, context);
        if active.original.is_none() {
            active.original = Some(previous);
        }
        tracing::info!(real = %real, role = %role, "Impersonation started");
        Ok(())
    }

    /// Return to the real role; a no-op when not impersonating
    pub fn stop_impersonating(&mut self) -> Result<(), AppError> {
        let active = self.active_mut()?;
        if let Some(original) = active.original.take() {
            active.context = original;
            tracing::info!("Impersonation ended");
        }
        Ok(())
    }

    /// End the session, clearing token permissions and overrides
    pub fn logout(&mut self) {
        if self.active.take().is_some() {
            tracing::info!("Session ended");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_impersonating(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.original.is_some())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.user_id.as_str())
    }

    /// Effective role (the impersonated one while impersonating)
    pub fn role(&self) -> Option<Role> {
        self.context().map(AuthContext::role)
    }

    pub fn are_permissions_loaded(&self) -> bool {
        self.context().is_some_and(AuthContext::permissions_loaded)
    }

    pub fn context(&self) -> Option<&AuthContext> {
        self.active.as_ref().map(|a| &a.context)
    }

    /// Check one permission; always denied without a session
    pub fn can(&self, permission: &str) -> bool {
        self.context().is_some_and(|ctx| is_granted(permission, ctx))
    }

    pub fn can_any(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|p| self.can(p))
    }

    pub fn can_all(&self, permissions: &[&str]) -> bool {
        self.context().is_some() && permissions.iter().all(|p| self.can(p))
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession, AppError> {
        self.active
            .as_mut()
            .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated))
    }

    fn context_mut(&mut self) -> Result<&mut AuthContext, AppError> {
        Ok(&mut self.active_mut()?.context)
    }
}

impl PermissionChecker for AuthSession {
    fn can(&self, permission: &str) -> bool {
        AuthSession::can(self, permission)
    }

    fn can_any(&self, permissions: &[&str]) -> bool {
        AuthSession::can_any(self, permissions)
    }

    fn can_all(&self, permissions: &[&str]) -> bool {
        AuthSession::can_all(self, permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Claims, TokenError};
    use shared::ModuleOverride;

    /// Decoder that treats the token text as a comma-joined permission list
    struct PlainDecoder;

    impl TokenDecoder for PlainDecoder {
        fn decode(&self, token: &str) -> Result<Claims, TokenError> {
            if token == "garbage" {
                return Err(TokenError::InvalidToken("garbage".to_string()));
            }
            Ok(Claims {
                sub: "emp-1".to_string(),
                username: None,
                role: None,
                permissions: Some(crate::token::PermissionClaim::Joined(token.to_string())),
                exp: None,
                iat: None,
                iss: None,
                aud: None,
            })
        }
    }

    fn staff_session(token: &str) -> AuthSession {
        let mut session = AuthSession::new(PlainDecoder);
        session.login("emp-1", Role::Staff, token);
        session
    }

    #[test]
    fn test_no_session_denies_everything() {
        let session = AuthSession::new(PlainDecoder);
        assert!(!session.can("sales:view"));
        assert!(!session.can_any(&["sales:view"]));
        assert!(!session.can_all(&[]));
        assert_eq!(session.role(), None);
        assert!(!session.are_permissions_loaded());
    }

    #[test]
    fn test_login_with_token_permissions() {
        let session = staff_session("stock:create");
        assert!(session.are_permissions_loaded());
        assert_eq!(session.role(), Some(Role::Staff));
        assert!(session.can("stock:create"));
        assert!(session.can("sales:view"));
        assert!(!session.can("stock:delete"));
    }

    #[test]
    fn test_undecodable_token_waits_for_overrides() {
        let mut session = staff_session("garbage");
        // Loading window: optimistic until something is loaded
        assert!(!session.are_permissions_loaded());
        assert!(session.can("stock:delete"));

        session
            .load_custom_permissions(CustomModulePermissions::new())
            .unwrap();
        assert!(session.are_permissions_loaded());
        assert!(!session.can("stock:delete"));
        assert!(session.can("stock:view"));
    }

    #[test]
    fn test_refresh_replaces_token_permissions() {
        let mut session = staff_session("stock:create");
        session.refresh_token("stock:delete").unwrap();
        assert!(session.can("stock:delete"));
        assert!(!session.can("stock:create"));

        session.refresh_token("garbage").unwrap();
        assert!(!session.can("stock:delete"));
        assert!(session.are_permissions_loaded());
    }

    #[test]
    fn test_apply_group_replaces_declared_modules() {
        let mut session = staff_session("");
        let mut custom = CustomModulePermissions::new();
        custom.insert(
            "suppliers".to_string(),
            ModuleOverride::with_actions(["view", "edit"]),
        );
        custom.insert("customers".to_string(), ModuleOverride::with_actions(["delete"]));
        session.load_custom_permissions(custom).unwrap();

        let group = PermissionGroup::new("g", "Buyer").grant("suppliers", ["view"]);
        session.apply_group(&group).unwrap();

        assert!(session.can("suppliers:view"));
        assert!(!session.can("suppliers:edit"));
        assert!(session.can("customers:delete"));
    }

    #[test]
    fn test_mutations_without_session_fail() {
        let mut session = AuthSession::new(PlainDecoder);
        let err = session.refresh_token("stock:view").unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);
        assert!(session.load_custom_permissions(CustomModulePermissions::new()).is_err());
        assert!(session.impersonate(Role::Guest).is_err());
    }

    #[test]
    fn test_impersonation_round_trip() {
        let mut session = AuthSession::new(PlainDecoder);
        session.login("owner-1", Role::Owner, "");
        assert!(session.can("employees:manage"));

        session.impersonate(Role::Staff).unwrap();
        assert!(session.is_impersonating());
        assert_eq!(session.role(), Some(Role::Staff));
        assert!(!session.can("employees:manage"));
        assert!(session.can("sales:create"));

        // Still bounded by the real role
        assert!(session.impersonate(Role::Admin).is_err());
        session.impersonate(Role::Guest).unwrap();
        assert!(!session.can("sales:view"));

        session.stop_impersonating().unwrap();
        assert!(!session.is_impersonating());
        assert_eq!(session.role(), Some(Role::Owner));
        assert!(session.can("employees:manage"));
    }

    #[test]
    fn test_staff_cannot_impersonate() {
        let mut session = staff_session("");
        let err = session.impersonate(Role::Guest).unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleNotAssignable);
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut session = staff_session("stock:create");
        session
            .load_custom_permissions(CustomModulePermissions::new())
            .unwrap();
        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.context().is_none());
        assert!(!session.can("stock:create"));
        assert!(!session.can("sales:view"));
    }
}
