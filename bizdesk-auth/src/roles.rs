//! Role Table
//!
//! Default permissions of each role. ADMIN and OWNER lists are computed from
//! the registry so they grow with it; only STAFF defaults are hand-written.
//!
//! ## 设计原则
//! - ADMIN: every permission in the registry
//! - OWNER: every permission except [`ADMIN_ONLY_PERMISSIONS`]
//! - STAFF: day-to-day operations, extended per employee by custom overrides
//! - GUEST: nothing

use shared::{Permission, Role};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::registry::{self, MODULE_PERMISSIONS, ModulePermissionConfig};

/// Admin 专属权限
pub const ADMIN_ONLY_PERMISSIONS: &[&str] = &[
    "settings:manage",            // 系统级设置
    "stock:manage_global_fields", // 全局商品字段
];

/// 员工默认权限
pub const DEFAULT_STAFF_PERMISSIONS: &[&str] = &[
    "sales:view",
    "sales:create",
    "customers:view",
    "customers:create",
    "customers:edit",
    "stock:view",
    "revenue:view",
    "revenue:create",
    "expenses:view",
    "expenses:create",
    "purchases:view",
    "reports:view",
    "settings:view",
];

/// Default permissions of every role, derived from one registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    admin: BTreeSet<Permission>,
    owner: BTreeSet<Permission>,
    staff: BTreeSet<Permission>,
    guest: BTreeSet<Permission>,
}

impl RoleTable {
    /// Build the table for a registry.
    ///
    /// Hand-written defaults that the registry does not define are dropped,
    /// so every role list is always a subset of the registry.
    pub fn build(registry: &[ModulePermissionConfig]) -> Self {
        let admin = registry::flatten(registry);

        let admin_only: BTreeSet<Permission> = parse_all(ADMIN_ONLY_PERMISSIONS);
        let owner = admin.difference(&admin_only).cloned().collect();

        let staff = parse_all(DEFAULT_STAFF_PERMISSIONS)
            .into_iter()
            .filter(|p| admin.contains(p))
            .collect();

        Self {
            admin,
            owner,
            staff,
            guest: BTreeSet::new(),
        }
    }

    pub fn permissions(&self, role: Role) -> &BTreeSet<Permission> {
        match role {
            Role::Admin => &self.admin,
            Role::Owner => &self.owner,
            Role::Staff => &self.staff,
            Role::Guest => &self.guest,
        }
    }

    pub fn grants(&self, role: Role, permission: &Permission) -> bool {
        self.permissions(role).contains(permission)
    }
}

fn parse_all(raw: &[&str]) -> BTreeSet<Permission> {
    raw.iter().filter_map(|p| p.parse().ok()).collect()
}

static ROLE_TABLE: LazyLock<RoleTable> = LazyLock::new(|| RoleTable::build(MODULE_PERMISSIONS));

/// The role table of the built-in registry
pub fn role_table() -> &'static RoleTable {
    &ROLE_TABLE
}

/// Default permissions of a role
pub fn permissions_for_role(role: Role) -> &'static BTreeSet<Permission> {
    ROLE_TABLE.permissions(role)
}
