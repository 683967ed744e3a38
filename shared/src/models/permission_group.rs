//! Permission Group Model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::employee::{CustomModulePermissions, ModuleOverride};
use crate::types::{Permission, Timestamp};

/// Actions a group grants within one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupModuleGrant {
    pub actions: Vec<String>,
}

/// Named, reusable bundle of module grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroup {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permissions: BTreeMap<String, GroupModuleGrant>,
    /// Group preselected for newly created staff
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl PermissionGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            permissions: BTreeMap::new(),
            is_default: false,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add (or replace) the grant for one module
    pub fn grant<I, S>(mut self, module: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.insert(
            module.into(),
            GroupModuleGrant {
                actions: actions.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Every `module:action` the group grants
    pub fn permission_list(&self) -> Vec<Permission> {
        self.permissions
            .iter()
            .flat_map(|(module, grant)| {
                grant
                    .actions
                    .iter()
                    .map(move |action| Permission::new(module.as_str(), action.as_str()))
            })
            .collect()
    }

    /// Replace the target's overrides for exactly the modules this group declares.
    ///
    /// Modules the group does not mention are left untouched.
    pub fn apply_to(&self, target: &mut CustomModulePermissions) {
        for (module, grant) in &self.permissions {
            target.insert(
                module.clone(),
                ModuleOverride::with_actions(grant.actions.iter().cloned()),
            );
        }
    }
}

/// Create permission group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroupCreate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permissions: BTreeMap<String, GroupModuleGrant>,
}

impl From<PermissionGroupCreate> for PermissionGroup {
    fn from(payload: PermissionGroupCreate) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            description: payload.description,
            permissions: payload.permissions,
            is_default: false,
            updated_at: None,
        }
    }
}

impl From<PermissionGroup> for PermissionGroupCreate {
    fn from(group: PermissionGroup) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            permissions: group.permissions,
        }
    }
}

/// Update permission group payload (absent fields are kept)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGroupUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeMap<String, GroupModuleGrant>>,
}

impl PermissionGroupUpdate {
    /// Apply this patch to a group in place
    pub fn apply(&self, group: &mut PermissionGroup) {
        if let Some(name) = &self.name {
            group.name = name.clone();
        }
        if let Some(description) = &self.description {
            group.description = Some(description.clone());
        }
        if let Some(permissions) = &self.permissions {
            group.permissions = permissions.clone();
        }
    }
}
