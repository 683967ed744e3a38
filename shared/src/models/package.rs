//! Subscription Package Model

use serde::{Deserialize, Serialize};

use crate::types::Permission;

/// Actions that customize a module rather than use it
pub const CUSTOMIZATION_ACTIONS: &[&str] = &[
    "custom_form",
    "custom_fields",
    "custom_value",
    "add_product_custom_fields",
    "manage_global_fields",
];

/// Whether an action is a customization action
pub fn is_customization_action(action: &str) -> bool {
    CUSTOMIZATION_ACTIONS.contains(&action)
}

/// Plan type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Basic,
    Pro,
    Enterprise,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Basic => "basic",
            PlanType::Pro => "pro",
            PlanType::Enterprise => "enterprise",
        }
    }

    /// Look up a plan by package id; unknown ids yield `None`
    pub fn from_package_id(id: &str) -> Option<Self> {
        match id.to_ascii_lowercase().as_str() {
            "basic" => Some(PlanType::Basic),
            "pro" => Some(PlanType::Pro),
            "enterprise" => Some(PlanType::Enterprise),
            _ => None,
        }
    }

    /// Built-in limits of this plan
    pub fn limits(&self) -> PackageLimits {
        match self {
            PlanType::Basic => PackageLimits {
                max_custom_forms: 1,
                allowed_form_modules: vec!["sales".into(), "customers".into()],
            },
            PlanType::Pro => PackageLimits {
                max_custom_forms: 10,
                allowed_form_modules: vec![
                    "sales".into(),
                    "customers".into(),
                    "suppliers".into(),
                    "stock".into(),
                    "purchases".into(),
                    "employees".into(),
                ],
            },
            PlanType::Enterprise => PackageLimits {
                max_custom_forms: 0, // 无限
                allowed_form_modules: Vec::new(),
            },
        }
    }
}

/// Customization ceiling derived from a subscription package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLimits {
    /// Maximum custom form templates, 0 = unlimited
    pub max_custom_forms: u32,
    /// Modules allowed to carry custom behavior; empty = unrestricted
    #[serde(default)]
    pub allowed_form_modules: Vec<String>,
}

impl Default for PackageLimits {
    fn default() -> Self {
        PlanType::Basic.limits()
    }
}

impl PackageLimits {
    /// Empty allow-list means every module is allowed
    pub fn allows_form_module(&self, module: &str) -> bool {
        self.allowed_form_modules.is_empty()
            || self.allowed_form_modules.iter().any(|m| m == module)
    }

    /// Whether one more custom form fits under the limit
    pub fn can_add_custom_form(&self, current: u32) -> bool {
        self.max_custom_forms == 0 || current < self.max_custom_forms
    }

    /// Ceiling check for a single permission.
    ///
    /// Ordinary module permissions always pass; only customization actions
    /// are constrained by the allow-list.
    pub fn permits(&self, permission: &Permission) -> bool {
        !is_customization_action(permission.action())
            || self.allows_form_module(permission.module())
    }
}
