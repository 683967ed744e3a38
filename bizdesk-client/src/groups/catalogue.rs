//! Permission Group Catalogue
//!
//! Remote-first store of permission groups with a local cache backstop:
//! - reads go through [`ResilientRead`] (remote → cache → built-in defaults)
//! - mutations try the remote service, then fall back to mutating the cache
//! - every successful remote result is also written to the cache
//!
//! Caller mistakes (duplicate id, unknown id, invalid content) are returned
//! as errors. Network failures are absorbed.

use bizdesk_auth::constrain_group;
use bizdesk_auth::registry::validate_permissions;
use shared::util::now_millis;
use shared::{
    Employee, GroupModuleGrant, PackageLimits, PermissionGroup, PermissionGroupCreate,
    PermissionGroupUpdate,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::defaults::default_groups;
use super::service::GroupService;
use crate::cache::{self, CacheStore};
use crate::config::ClientConfig;
use crate::error::{CatalogueError, RemoteError, StorageError};
use crate::resilient::ResilientRead;

/// Cache key of the mirrored group list
pub const GROUPS_CACHE_KEY: &str = "permission_groups";

#[allow(clippy::ptr_arg)]
fn has_groups(groups: &Vec<PermissionGroup>) -> bool {
    !groups.is_empty()
}

pub struct GroupCatalogue {
    /// None in offline mode
    remote: Option<Arc<dyn GroupService>>,
    reader: ResilientRead,
    /// Serializes this process's read-modify-write of the cached list
    local_lock: Mutex<()>,
}

impl std::fmt::Debug for GroupCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupCatalogue")
            .field("offline", &self.is_offline())
            .finish_non_exhaustive()
    }
}

impl GroupCatalogue {
    pub fn new(remote: Arc<dyn GroupService>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            remote: Some(remote),
            reader: ResilientRead::new(cache),
            local_lock: Mutex::new(()),
        }
    }

    /// Catalogue that never contacts a remote service
    pub fn offline(cache: Arc<dyn CacheStore>) -> Self {
        Self {
            remote: None,
            reader: ResilientRead::new(cache),
            local_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &ClientConfig, remote: Arc<dyn GroupService>) -> Self {
        if config.offline {
            tracing::info!("Permission group catalogue in offline mode");
            Self::offline(config.cache_store())
        } else {
            Self::new(remote, config.cache_store())
        }
    }

    pub fn is_offline(&self) -> bool {
        self.remote.is_none()
    }

    // ========== Reads ==========

    /// All groups. Never fails: remote, else cache, else built-in defaults.
    pub async fn list(&self) -> Vec<PermissionGroup> {
        let fetch = async {
            match &self.remote {
                Some(r) => r.list().await,
                None => Err(RemoteError::Offline),
            }
        };
        self.reader
            .read_with(GROUPS_CACHE_KEY, fetch, has_groups, default_groups)
            .await
            .value
    }

    /// [`list`](Self::list) that the caller can abandon.
    ///
    /// A cancelled call leaves the cache as it was.
    pub async fn list_cancellable(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<PermissionGroup>, CatalogueError> {
        let fetch = async {
            match &self.remote {
                Some(r) => r.list().await,
                None => Err(RemoteError::Offline),
            }
        };
        self.reader
            .read_cancellable(GROUPS_CACHE_KEY, fetch, has_groups, default_groups, cancel)
            .await
            .map(|resolved| resolved.value)
            .map_err(|_| CatalogueError::Cancelled)
    }

    pub async fn get(&self, id: &str) -> Result<PermissionGroup, CatalogueError> {
        let outcome = match &self.remote {
            Some(r) => r.get(id).await,
            None => Err(RemoteError::Offline),
        };
        match outcome {
            Ok(group) => {
                self.mirror_upsert(&group).await;
                Ok(group)
            }
            Err(RemoteError::NotFound(_)) => Err(CatalogueError::NotFound(id.to_string())),
            Err(e) => {
                log_fallback("get", id, &e);
                self.local_groups()
                    .await
                    .into_iter()
                    .find(|g| g.id == id)
                    .ok_or_else(|| CatalogueError::NotFound(id.to_string()))
            }
        }
    }

    // ========== Mutations ==========

    pub async fn create(
        &self,
        payload: PermissionGroupCreate,
    ) -> Result<PermissionGroup, CatalogueError> {
        if payload.id.trim().is_empty() {
            return Err(CatalogueError::InvalidGroup("id must not be empty".to_string()));
        }
        validate_content(&payload.name, &payload.permissions)?;

        let outcome = match &self.remote {
            Some(r) => r.create(&payload).await,
            None => Err(RemoteError::Offline),
        };
        match outcome {
            Ok(created) => {
                tracing::info!(group_id = %created.id, "Permission group created");
                self.mirror_upsert(&created).await;
                Ok(created)
            }
            Err(RemoteError::Conflict(_)) => Err(CatalogueError::DuplicateId(payload.id)),
            Err(e) => {
                log_fallback("create", &payload.id, &e);
                let _guard = self.local_lock.lock().await;
                let mut groups = self.local_groups().await;
                if groups.iter().any(|g| g.id == payload.id) {
                    return Err(CatalogueError::DuplicateId(payload.id));
                }
                let mut group = PermissionGroup::from(payload);
                group.updated_at = Some(now_millis());
                groups.push(group.clone());
                self.save_local(&groups).await?;
                tracing::info!(group_id = %group.id, "Permission group created locally");
                Ok(group)
            }
        }
    }

    pub async fn update(
        &self,
        id: &str,
        patch: PermissionGroupUpdate,
    ) -> Result<PermissionGroup, CatalogueError> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(permissions) = &patch.permissions {
            validate_grant_map(permissions)?;
        }

        let outcome = match &self.remote {
            Some(r) => r.update(id, &patch).await,
            None => Err(RemoteError::Offline),
        };
        match outcome {
            Ok(updated) => {
                tracing::info!(group_id = %id, "Permission group updated");
                self.mirror_upsert(&updated).await;
                Ok(updated)
            }
            Err(RemoteError::NotFound(_)) => Err(CatalogueError::NotFound(id.to_string())),
            Err(e) => {
                log_fallback("update", id, &e);
                let _guard = self.local_lock.lock().await;
                let mut groups = self.local_groups().await;
                let group = groups
                    .iter_mut()
                    .find(|g| g.id == id)
                    .ok_or_else(|| CatalogueError::NotFound(id.to_string()))?;
                patch.apply(group);
                group.updated_at = Some(now_millis());
                let updated = group.clone();
                self.save_local(&groups).await?;
                Ok(updated)
            }
        }
    }

    pub async fn remove(&self, id: &str) -> Result<(), CatalogueError> {
        let outcome = match &self.remote {
            Some(r) => r.remove(id).await,
            None => Err(RemoteError::Offline),
        };
        match outcome {
            Ok(()) => {
                tracing::info!(group_id = %id, "Permission group removed");
                self.mirror_remove(id).await;
                Ok(())
            }
            Err(RemoteError::NotFound(_)) => Err(CatalogueError::NotFound(id.to_string())),
            Err(e) => {
                log_fallback("remove", id, &e);
                let _guard = self.local_lock.lock().await;
                let mut groups = self.local_groups().await;
                let before = groups.len();
                groups.retain(|g| g.id != id);
                if groups.len() == before {
                    return Err(CatalogueError::NotFound(id.to_string()));
                }
                self.save_local(&groups).await?;
                Ok(())
            }
        }
    }

    /// Copy a group under a fresh id
    pub async fn clone_group(
        &self,
        id: &str,
        name: &str,
    ) -> Result<PermissionGroup, CatalogueError> {
        validate_name(name)?;
        let new_id = uuid::Uuid::new_v4().to_string();

        let outcome = match &self.remote {
            Some(r) => r.clone_group(id, &new_id, name).await,
            None => Err(RemoteError::Offline),
        };
        match outcome {
            Ok(cloned) => {
                tracing::info!(group_id = %id, clone_id = %cloned.id, "Permission group cloned");
                self.mirror_upsert(&cloned).await;
                Ok(cloned)
            }
            Err(RemoteError::NotFound(_)) => Err(CatalogueError::NotFound(id.to_string())),
            Err(RemoteError::Conflict(_)) => Err(CatalogueError::DuplicateId(new_id)),
            Err(e) => {
                log_fallback("clone", id, &e);
                let _guard = self.local_lock.lock().await;
                let mut groups = self.local_groups().await;
                let source = groups
                    .iter()
                    .find(|g| g.id == id)
                    .ok_or_else(|| CatalogueError::NotFound(id.to_string()))?;
                let mut cloned = source.clone();
                cloned.id = new_id;
                cloned.name = name.to_string();
                cloned.is_default = false;
                cloned.updated_at = Some(now_millis());
                groups.push(cloned.clone());
                self.save_local(&groups).await?;
                Ok(cloned)
            }
        }
    }

    /// Make `id` the only default group
    pub async fn set_default(&self, id: &str) -> Result<(), CatalogueError> {
        let outcome = match &self.remote {
            Some(r) => r.set_default(id).await,
            None => Err(RemoteError::Offline),
        };
        match outcome {
            Ok(()) => {
                tracing::info!(group_id = %id, "Default permission group set");
                let _guard = self.local_lock.lock().await;
                let mut groups = self.mirrored_groups().await;
                if mark_default(&mut groups, id)
                    && let Err(e) = self.save_local(&groups).await
                {
                    tracing::warn!(group_id = %id, error = %e, "Failed to mirror default group");
                }
                Ok(())
            }
            Err(RemoteError::NotFound(_)) => Err(CatalogueError::NotFound(id.to_string())),
            Err(e) => {
                log_fallback("set_default", id, &e);
                let _guard = self.local_lock.lock().await;
                let mut groups = self.local_groups().await;
                if !mark_default(&mut groups, id) {
                    return Err(CatalogueError::NotFound(id.to_string()));
                }
                self.save_local(&groups).await?;
                Ok(())
            }
        }
    }

    /// Replace every group with the built-in set
    pub async fn reset_to_defaults(&self) -> Result<Vec<PermissionGroup>, CatalogueError> {
        let outcome = match &self.remote {
            Some(r) => r.reset().await,
            None => Err(RemoteError::Offline),
        };
        let _guard = self.local_lock.lock().await;
        match outcome {
            Ok(groups) => {
                tracing::info!(count = groups.len(), "Permission groups reset");
                if let Err(e) = self.save_local(&groups).await {
                    tracing::warn!(error = %e, "Failed to mirror reset groups");
                }
                Ok(if groups.is_empty() { default_groups() } else { groups })
            }
            Err(e) => {
                log_fallback("reset", "*", &e);
                let groups = default_groups();
                self.save_local(&groups).await?;
                Ok(groups)
            }
        }
    }

    /// Apply a group to an employee's overrides, within the package ceiling.
    ///
    /// Modules the group declares replace the employee's overrides for those
    /// modules; other modules are untouched. Returns the group as applied.
    pub async fn apply_to_employee(
        &self,
        id: &str,
        employee: &mut Employee,
        limits: &PackageLimits,
    ) -> Result<PermissionGroup, CatalogueError> {
        let group = self.get(id).await?;
        let applied = constrain_group(&group, limits);
        applied.apply_to(&mut employee.custom_module_permissions);
        tracing::info!(group_id = %id, employee_id = %employee.id, "Permission group applied");
        Ok(applied)
    }

    // ========== Local cache ==========

    /// Cached groups, or the defaults when the cache has none
    async fn local_groups(&self) -> Vec<PermissionGroup> {
        self.reader
            .fallback(GROUPS_CACHE_KEY, has_groups, default_groups)
            .await
            .value
    }

    /// Cached groups exactly as last mirrored; nothing cached means none.
    ///
    /// Remote results merge into this view, never into the default-seeded one.
    async fn mirrored_groups(&self) -> Vec<PermissionGroup> {
        match cache::load(self.reader.cache().as_ref(), GROUPS_CACHE_KEY).await {
            Ok(groups) => groups.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable permission group cache");
                Vec::new()
            }
        }
    }

    async fn save_local(&self, groups: &[PermissionGroup]) -> Result<(), StorageError> {
        cache::store(self.reader.cache().as_ref(), GROUPS_CACHE_KEY, &groups).await
    }

    async fn mirror_upsert(&self, group: &PermissionGroup) {
        let _guard = self.local_lock.lock().await;
        let mut groups = self.mirrored_groups().await;
        match groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group.clone(),
            None => groups.push(group.clone()),
        }
        if let Err(e) = self.save_local(&groups).await {
            tracing::warn!(group_id = %group.id, error = %e, "Failed to mirror permission group");
        }
    }

    async fn mirror_remove(&self, id: &str) {
        let _guard = self.local_lock.lock().await;
        let mut groups = self.mirrored_groups().await;
        let before = groups.len();
        groups.retain(|g| g.id != id);
        if groups.len() == before {
            return;
        }
        if let Err(e) = self.save_local(&groups).await {
            tracing::warn!(group_id = %id, error = %e, "Failed to mirror permission group removal");
        }
    }
}

/// Returns false when `id` is not among `groups`
fn mark_default(groups: &mut [PermissionGroup], id: &str) -> bool {
    if !groups.iter().any(|g| g.id == id) {
        return false;
    }
    for g in groups.iter_mut() {
        g.is_default = g.id == id;
    }
    true
}

fn log_fallback(op: &str, id: &str, err: &RemoteError) {
    match err {
        RemoteError::Offline => {
            tracing::debug!(op = op, group_id = %id, "Offline, using local cache")
        }
        _ => tracing::warn!(
            op = op,
            group_id = %id,
            error = %err,
            "Remote unavailable, using local cache"
        ),
    }
}

fn validate_name(name: &str) -> Result<(), CatalogueError> {
    if name.trim().is_empty() {
        return Err(CatalogueError::InvalidGroup("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_grants(permissions: &BTreeMap<String, GroupModuleGrant>) -> Result<(), CatalogueError> {
    let raw: Vec<String> = permissions
        .iter()
        .flat_map(|(module, grant)| grant.actions.iter().map(move |a| format!("{}:{}", module, a)))
        .collect();
    let unknown = validate_permissions(raw.iter().map(String::as_str));
    if !unknown.is_empty() {
        return Err(CatalogueError::InvalidPermission(unknown));
    }
    Ok(())
}

/// A group's whole grant map: at least one module, every action registered
fn validate_grant_map(
    permissions: &BTreeMap<String, GroupModuleGrant>,
) -> Result<(), CatalogueError> {
    if permissions.is_empty() {
        return Err(CatalogueError::InvalidGroup(
            "group must grant at least one module".to_string(),
        ));
    }
    validate_grants(permissions)
}

fn validate_content(
    name: &str,
    permissions: &BTreeMap<String, GroupModuleGrant>,
) -> Result<(), CatalogueError> {
    validate_name(name)?;
    validate_grant_map(permissions)
}
