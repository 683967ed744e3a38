//! Employee Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::role::Role;

/// Per-module custom grant for one employee
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleOverride {
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<String>>,
}

impl ModuleOverride {
    pub fn with_actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            fields: None,
            notifications: None,
        }
    }

    pub fn allows(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

/// Custom overrides keyed by module name
pub type CustomModulePermissions = BTreeMap<String, ModuleOverride>;

/// Employee record (overrides persist with it across sessions)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Subscription package; only meaningful for OWNER and ADMIN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    /// Owning OWNER/ADMIN account for STAFF members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub custom_module_permissions: CustomModulePermissions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_wire_shape() {
        let json = r#"{
            "id": "e-1",
            "name": "Ayla",
            "role": "STAFF",
            "ownerId": "o-1",
            "customModulePermissions": {
                "stock": { "actions": ["view"], "fields": ["barcode"] }
            }
        }"#;
        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.role, Role::Staff);
        assert_eq!(employee.owner_id.as_deref(), Some("o-1"));
        assert!(employee.package_id.is_none());

        let stock = &employee.custom_module_permissions["stock"];
        assert!(stock.allows("view"));
        assert!(!stock.allows("create"));
        assert_eq!(stock.fields.as_deref(), Some(&["barcode".to_string()][..]));
        assert!(stock.notifications.is_none());
    }

    #[test]
    fn test_employee_without_overrides() {
        let json = r#"{ "id": "e-2", "name": "Can", "role": "OWNER", "packageId": "pro" }"#;
        let employee: Employee = serde_json::from_str(json).unwrap();
        assert!(employee.custom_module_permissions.is_empty());
    }
}
