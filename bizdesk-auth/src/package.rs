//! Package Gate
//!
//! Subscription package ceiling on customization features. The gate never
//! grants anything and never touches ordinary module permissions.

use shared::models::is_customization_action;
use shared::{AppError, ErrorCode, PackageLimits, Permission, PermissionGroup, Role};

use crate::resolver::PermissionChecker;

/// Package that applies to a user.
///
/// STAFF never has an independent package and always uses the owner's.
/// GUEST has none.
pub fn effective_package_id<'a>(
    role: Role,
    own: Option<&'a str>,
    owner: Option<&'a str>,
) -> Option<&'a str> {
    match role {
        Role::Admin | Role::Owner => own,
        Role::Staff => owner,
        Role::Guest => None,
    }
}

/// Strip customization actions the package does not allow.
///
/// Every module the group declares stays declared, possibly with no actions
/// left, so applying the result still replaces those modules on the target.
pub fn constrain_group(group: &PermissionGroup, limits: &PackageLimits) -> PermissionGroup {
    let mut constrained = group.clone();
    for (module, grant) in constrained.permissions.iter_mut() {
        if !limits.allows_form_module(module) {
            grant.actions.retain(|a| !is_customization_action(a));
        }
    }
    constrained
}

/// Whether the user may use a customization permission under the package
pub fn can_customize<C>(checker: &C, limits: &PackageLimits, permission: &str) -> bool
where
    C: PermissionChecker + ?Sized,
{
    let Ok(parsed) = permission.parse::<Permission>() else {
        return false;
    };
    limits.permits(&parsed) && checker.can(permission)
}

/// Reject creating a custom form once the package limit is reached
pub fn ensure_custom_form_slot(limits: &PackageLimits, current: u32) -> Result<(), AppError> {
    if limits.can_add_custom_form(current) {
        return Ok(());
    }
    Err(AppError::with_message(
        ErrorCode::CustomFormLimitReached,
        format!("Custom form limit of {} reached", limits.max_custom_forms),
    )
    .with_detail("max", limits.max_custom_forms)
    .with_detail("current", current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PlanType;

    #[test]
    fn test_staff_uses_owner_package() {
        assert_eq!(
            effective_package_id(Role::Staff, Some("enterprise"), Some("basic")),
            Some("basic")
        );
        assert_eq!(effective_package_id(Role::Staff, Some("pro"), None), None);
        assert_eq!(effective_package_id(Role::Owner, Some("pro"), Some("basic")), Some("pro"));
        assert_eq!(effective_package_id(Role::Guest, Some("pro"), Some("pro")), None);
    }

    #[test]
    fn test_constrain_group_keeps_ordinary_actions() {
        let group = PermissionGroup::new("g", "Everything")
            .grant("stock", ["view", "custom_fields"])
            .grant("sales", ["custom_form"])
            .grant("reports", ["view"])
            .grant("expenses", ["custom_form"]);
        let constrained = constrain_group(&group, &PlanType::Basic.limits());

        assert_eq!(constrained.permissions["stock"].actions, vec!["view"]);
        assert_eq!(constrained.permissions["sales"].actions, vec!["custom_form"]);
        assert_eq!(constrained.permissions["reports"].actions, vec!["view"]);
        assert!(constrained.permissions["expenses"].actions.is_empty());
        assert_eq!(constrained.permissions.len(), group.permissions.len());
    }

    #[test]
    fn test_constrain_group_unrestricted_package() {
        let group = PermissionGroup::new("g", "Forms").grant("expenses", ["custom_form"]);
        assert_eq!(constrain_group(&group, &PlanType::Enterprise.limits()), group);
    }

    #[test]
    fn test_can_customize_needs_grant_and_package() {
        let limits = PlanType::Basic.limits();
        let allow_all = |_: &str| true;
        let deny_all = |_: &str| false;
        assert!(can_customize(&allow_all, &limits, "sales:custom_form"));
        assert!(!can_customize(&allow_all, &limits, "stock:custom_fields"));
        assert!(!can_customize(&deny_all, &limits, "sales:custom_form"));
        // Ordinary permissions pass the package ceiling
        assert!(can_customize(&allow_all, &limits, "stock:view"));
        assert!(!can_customize(&allow_all, &limits, "garbage"));
    }

    #[test]
    fn test_custom_form_slots() {
        let basic = PlanType::Basic.limits();
        assert!(ensure_custom_form_slot(&basic, 0).is_ok());
        let err = ensure_custom_form_slot(&basic, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::CustomFormLimitReached);

        let enterprise = PlanType::Enterprise.limits();
        assert!(ensure_custom_form_slot(&enterprise, 10_000).is_ok());
    }
}
