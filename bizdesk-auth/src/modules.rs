//! Module Registry & Dependency Resolver
//!
//! Navigation modules, the permission that makes each one visible, and the
//! other modules whose data it relies on. Dependencies are advisory: a
//! missing one produces a warning banner, never a denial.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::resolver::PermissionChecker;

/// One navigable business module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub key: String,
    pub route_name: String,
    pub required_permission: String,
    /// Keys of modules whose records this module uses
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ModuleConfig {
    pub fn new(
        key: impl Into<String>,
        route_name: impl Into<String>,
        required_permission: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            route_name: route_name.into(),
            required_permission: required_permission.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

/// Missing prerequisites of one visible module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyWarning {
    pub module: String,
    pub missing: Vec<String>,
}

/// Ordered set of navigation modules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRegistry {
    modules: Vec<ModuleConfig>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new(vec![
            ModuleConfig::new("sales", "Sales", "sales:view").depends_on(["customers", "stock"]),
            ModuleConfig::new("customers", "Customers", "customers:view"),
            ModuleConfig::new("suppliers", "Suppliers", "suppliers:view"),
            ModuleConfig::new("expenses", "Expenses", "expenses:view").depends_on(["suppliers"]),
            ModuleConfig::new("revenue", "Revenue", "revenue:view").depends_on(["customers"]),
            ModuleConfig::new("stock", "Stock", "stock:view"),
            ModuleConfig::new("purchases", "Purchases", "purchases:view")
                .depends_on(["suppliers", "stock"]),
            ModuleConfig::new("employees", "Employees", "employees:view"),
            ModuleConfig::new("reports", "Reports", "reports:view")
                .depends_on(["sales", "expenses", "revenue"]),
            ModuleConfig::new("settings", "Settings", "settings:view"),
        ])
    }
}

impl ModuleRegistry {
    pub fn new(modules: Vec<ModuleConfig>) -> Self {
        Self { modules }
    }

    pub fn get(&self, key: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleConfig> {
        self.modules.iter()
    }

    /// Dependencies of `module_key` that are unavailable to the user.
    ///
    /// A dependency is missing when its route is not registered or its
    /// required permission is not granted. Dependencies unknown to this
    /// registry are skipped.
    pub fn missing_dependencies<C>(
        &self,
        module_key: &str,
        available_routes: &HashSet<String>,
        checker: &C,
    ) -> Vec<String>
    where
        C: PermissionChecker + ?Sized,
    {
        let Some(module) = self.get(module_key) else {
            tracing::debug!(module = module_key, "Unknown module, no dependencies");
            return Vec::new();
        };

        let mut missing = Vec::new();
        for dep_key in &module.dependencies {
            let Some(dep) = self.get(dep_key) else {
                tracing::debug!(
                    module = module_key,
                    dependency = %dep_key,
                    "Dependency not in module registry, skipped"
                );
                continue;
            };
            if !available_routes.contains(&dep.route_name) || !checker.can(&dep.required_permission)
            {
                missing.push(dep.key.clone());
            }
        }
        missing
    }

    /// Modules whose route is registered and whose permission is granted
    pub fn visible_modules<C>(
        &self,
        checker: &C,
        available_routes: &HashSet<String>,
    ) -> Vec<&ModuleConfig>
    where
        C: PermissionChecker + ?Sized,
    {
        self.modules
            .iter()
            .filter(|m| {
                available_routes.contains(&m.route_name) && checker.can(&m.required_permission)
            })
            .collect()
    }

    /// One warning per visible module with at least one missing dependency
    pub fn dependency_warnings<C>(
        &self,
        checker: &C,
        available_routes: &HashSet<String>,
    ) -> Vec<DependencyWarning>
    where
        C: PermissionChecker + ?Sized,
    {
        self.visible_modules(checker, available_routes)
            .into_iter()
            .filter_map(|m| {
                let missing = self.missing_dependencies(&m.key, available_routes, checker);
                (!missing.is_empty()).then(|| DependencyWarning {
                    module: m.key.clone(),
                    missing,
                })
            })
            .collect()
    }
}
