//! Permission Registry
//!
//! Static catalogue of business modules and the permissions each defines.
//! The union of all lists is the universe of valid permission strings;
//! anything referenced elsewhere that is missing here is invalid input.
//!
//! ## Action vocabulary
//! - common: `view`, `create`, `edit`, `delete`, `export`
//! - customization: `custom_form`, `custom_fields`, `custom_value`,
//!   `add_product_custom_fields`, `manage_global_fields`
//! - module specific: `calendar`, `refund`, `discount`, `adjust`, `approve`, `manage`, ...

use shared::Permission;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Permissions defined by one business module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModulePermissionConfig {
    pub module: &'static str,
    pub permissions: &'static [&'static str],
}

/// 模块权限表 (10 modules)
pub const MODULE_PERMISSIONS: &[ModulePermissionConfig] = &[
    ModulePermissionConfig {
        module: "sales",
        permissions: &[
            "sales:view",
            "sales:create",
            "sales:edit",
            "sales:delete",
            "sales:refund",
            "sales:discount",
            "sales:export",
            "sales:custom_form",
            "sales:custom_fields",
            "sales:custom_value",
        ],
    },
    ModulePermissionConfig {
        module: "customers",
        permissions: &[
            "customers:view",
            "customers:create",
            "customers:edit",
            "customers:delete",
            "customers:export",
            "customers:custom_fields",
            "customers:custom_value",
        ],
    },
    ModulePermissionConfig {
        module: "suppliers",
        permissions: &[
            "suppliers:view",
            "suppliers:create",
            "suppliers:edit",
            "suppliers:delete",
            "suppliers:export",
            "suppliers:custom_fields",
            "suppliers:custom_value",
        ],
    },
    ModulePermissionConfig {
        module: "expenses",
        permissions: &[
            "expenses:view",
            "expenses:create",
            "expenses:edit",
            "expenses:delete",
            "expenses:export",
            "expenses:calendar",
            "expenses:custom_form",
            "expenses:custom_fields",
        ],
    },
    ModulePermissionConfig {
        module: "revenue",
        permissions: &[
            "revenue:view",
            "revenue:create",
            "revenue:edit",
            "revenue:delete",
            "revenue:export",
            "revenue:calendar",
            "revenue:custom_form",
            "revenue:custom_fields",
        ],
    },
    ModulePermissionConfig {
        module: "stock",
        permissions: &[
            "stock:view",
            "stock:create",
            "stock:edit",
            "stock:delete",
            "stock:export",
            "stock:adjust",
            "stock:custom_fields",
            "stock:add_product_custom_fields",
            "stock:manage_global_fields",
        ],
    },
    ModulePermissionConfig {
        module: "purchases",
        permissions: &[
            "purchases:view",
            "purchases:create",
            "purchases:edit",
            "purchases:delete",
            "purchases:approve",
            "purchases:custom_form",
            "purchases:custom_fields",
        ],
    },
    ModulePermissionConfig {
        module: "employees",
        permissions: &[
            "employees:view",
            "employees:create",
            "employees:edit",
            "employees:delete",
            "employees:manage",
            "employees:calendar",
            "employees:custom_fields",
        ],
    },
    ModulePermissionConfig {
        module: "reports",
        permissions: &[
            "reports:view",
            "reports:export",
            "reports:sales",
            "reports:stock",
            "reports:finance",
        ],
    },
    ModulePermissionConfig {
        module: "settings",
        permissions: &[
            "settings:view",
            "settings:edit",
            "settings:notifications",
            "settings:manage",
        ],
    },
];

static ALL_PERMISSIONS: LazyLock<BTreeSet<Permission>> =
    LazyLock::new(|| flatten(MODULE_PERMISSIONS));

/// Flatten a registry into its permission set.
///
/// Entries that are malformed or do not belong to their module's namespace
/// are skipped with a warning.
pub fn flatten(registry: &[ModulePermissionConfig]) -> BTreeSet<Permission> {
    let mut all = BTreeSet::new();
    for config in registry {
        for raw in config.permissions {
            match raw.parse::<Permission>() {
                Ok(p) if p.module() == config.module => {
                    all.insert(p);
                }
                _ => {
                    tracing::warn!(
                        module = config.module,
                        permission = raw,
                        "Invalid registry entry skipped"
                    );
                }
            }
        }
    }
    all
}

/// The flattened registry
pub fn all_permissions() -> &'static BTreeSet<Permission> {
    &ALL_PERMISSIONS
}

/// Module names in registry order
pub fn module_names() -> impl Iterator<Item = &'static str> {
    MODULE_PERMISSIONS.iter().map(|c| c.module)
}

/// Validate if a permission string is defined in the registry
pub fn is_valid_permission(permission: &str) -> bool {
    permission
        .parse::<Permission>()
        .is_ok_and(|p| ALL_PERMISSIONS.contains(&p))
}

/// Return every entry that is not a registry permission
pub fn validate_permissions<'a, I>(permissions: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    permissions
        .into_iter()
        .filter(|p| !is_valid_permission(p))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_has_no_duplicates() {
        let mut seen = HashSet::new();
        for config in MODULE_PERMISSIONS {
            for p in config.permissions {
                assert!(seen.insert(*p), "duplicate registry entry: {}", p);
            }
        }
        assert_eq!(seen.len(), all_permissions().len());
    }

    #[test]
    fn test_every_entry_is_in_its_module_namespace() {
        for config in MODULE_PERMISSIONS {
            for p in config.permissions {
                let parsed: Permission = p.parse().unwrap();
                assert_eq!(parsed.module(), config.module, "{} misplaced", p);
            }
        }
    }

    #[test]
    fn test_modules_are_unique() {
        let modules: HashSet<_> = module_names().collect();
        assert_eq!(modules.len(), MODULE_PERMISSIONS.len());
        assert_eq!(modules.len(), 10);
    }

    #[test]
    fn test_is_valid_permission() {
        assert!(is_valid_permission("stock:create"));
        assert!(is_valid_permission("employees:custom_fields"));
        assert!(!is_valid_permission("stock:fly"));
        assert!(!is_valid_permission("garden:view"));
        assert!(!is_valid_permission("stock"));
    }

    #[test]
    fn test_validate_permissions_reports_offenders() {
        let bad = validate_permissions(["sales:view", "sales:teleport", "nope"]);
        assert_eq!(bad, vec!["sales:teleport".to_string(), "nope".to_string()]);
    }

    #[test]
    fn test_flatten_skips_misplaced_entries() {
        const REGISTRY: &[ModulePermissionConfig] = &[ModulePermissionConfig {
            module: "sales",
            permissions: &["sales:view", "stock:view", "broken"],
        }];
        let all = flatten(REGISTRY);
        assert_eq!(all.len(), 1);
        assert!(all.contains(&Permission::new("sales", "view")));
    }
}
