//! Built-in permission groups
//!
//! Used when neither the remote service nor the local cache has any groups.

use shared::PermissionGroup;

pub const MOBILE_SELLER: &str = "mobile-seller";
pub const CASHIER: &str = "cashier";
pub const WAREHOUSE: &str = "warehouse";
pub const ACCOUNTANT: &str = "accountant";
pub const STORE_MANAGER: &str = "store-manager";

/// The five built-in groups
pub fn default_groups() -> Vec<PermissionGroup> {
    vec![
        PermissionGroup::new(MOBILE_SELLER, "Mobile Seller")
            .with_description("Field sales: take orders and register customers")
            .grant("sales", ["view", "create"])
            .grant("customers", ["view", "create"])
            .grant("stock", ["view"]),
        PermissionGroup::new(CASHIER, "Cashier")
            .with_description("Counter sales, refunds and daily takings")
            .grant("sales", ["view", "create", "refund", "discount"])
            .grant("customers", ["view"])
            .grant("revenue", ["view", "create"]),
        PermissionGroup::new(WAREHOUSE, "Warehouse Clerk")
            .with_description("Receive goods and keep stock levels right")
            .grant("stock", ["view", "create", "edit", "adjust"])
            .grant("purchases", ["view", "create"])
            .grant("suppliers", ["view"]),
        PermissionGroup::new(ACCOUNTANT, "Accountant")
            .with_description("Income, expenses and financial reports")
            .grant("revenue", ["view", "create", "edit", "export", "calendar"])
            .grant("expenses", ["view", "create", "edit", "export", "calendar"])
            .grant("reports", ["view", "export", "finance"]),
        PermissionGroup::new(STORE_MANAGER, "Store Manager")
            .with_description("Runs a store day to day without system settings")
            .grant("sales", ["view", "create", "edit", "refund", "discount", "export"])
            .grant("customers", ["view", "create", "edit"])
            .grant("stock", ["view", "create", "edit", "adjust"])
            .grant("purchases", ["view", "create", "approve"])
            .grant("employees", ["view", "calendar"])
            .grant("reports", ["view", "sales", "stock"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizdesk_auth::is_valid_permission;
    use std::collections::HashSet;

    #[test]
    fn test_five_groups_with_content() {
        let groups = default_groups();
        assert_eq!(groups.len(), 5);
        for g in &groups {
            assert!(!g.id.is_empty());
            assert!(!g.name.is_empty());
            assert!(!g.permissions.is_empty());
            assert!(!g.is_default);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<_> = default_groups().into_iter().map(|g| g.id).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_every_grant_is_a_registry_permission() {
        for g in default_groups() {
            for p in g.permission_list() {
                assert!(is_valid_permission(&p.to_string()), "{} grants unknown {}", g.id, p);
            }
        }
    }
}
