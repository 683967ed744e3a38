//! Role Assignment Hierarchy
//!
//! Which roles a user may grant when creating or editing another user.
//! Strictly nested: ADMIN ⊇ OWNER ⊇ STAFF ⊇ GUEST (empty), and no role can
//! grant a role above itself.

use shared::{AppError, ErrorCode, Role};

const ADMIN_ASSIGNABLE: &[Role] = &[Role::Admin, Role::Owner, Role::Staff, Role::Guest];
const OWNER_ASSIGNABLE: &[Role] = &[Role::Staff, Role::Guest];
const STAFF_ASSIGNABLE: &[Role] = &[];
const GUEST_ASSIGNABLE: &[Role] = &[];

/// Roles `acting` may assign, most privileged first
pub fn assignable_roles(acting: Role) -> &'static [Role] {
    match acting {
        Role::Admin => ADMIN_ASSIGNABLE,
        Role::Owner => OWNER_ASSIGNABLE,
        Role::Staff => STAFF_ASSIGNABLE,
        Role::Guest => GUEST_ASSIGNABLE,
    }
}

pub fn can_assign(acting: Role, target: Role) -> bool {
    assignable_roles(acting).contains(&target)
}

/// Reject a role assignment the acting role is not allowed to make
pub fn ensure_can_assign(acting: Role, target: Role) -> Result<(), AppError> {
    if can_assign(acting, target) {
        return Ok(());
    }
    tracing::warn!(acting = %acting, target = %target, "role_assignment_denied");
    Err(AppError::with_message(
        ErrorCode::RoleNotAssignable,
        format!("{} cannot assign role {}", acting, target),
    )
    .with_detail("role", target.as_str()))
}
