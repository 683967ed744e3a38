//! Remote permission group service

use async_trait::async_trait;
use serde::Serialize;
use shared::{PermissionGroup, PermissionGroupCreate, PermissionGroupUpdate};

use crate::error::{ClientResult, RemoteError};
use crate::http::{HttpClient, api_path};

const GROUPS_PATH: &str = "api/permission-groups";

/// Remote CRUD over permission groups, keyed by group id
#[async_trait]
pub trait GroupService: Send + Sync {
    async fn list(&self) -> Result<Vec<PermissionGroup>, RemoteError>;
    async fn get(&self, id: &str) -> Result<PermissionGroup, RemoteError>;
    async fn create(&self, group: &PermissionGroupCreate) -> Result<PermissionGroup, RemoteError>;
    async fn update(
        &self,
        id: &str,
        patch: &PermissionGroupUpdate,
    ) -> Result<PermissionGroup, RemoteError>;
    async fn remove(&self, id: &str) -> Result<(), RemoteError>;
    /// Copy `id` into a new group `new_id` named `name`
    async fn clone_group(
        &self,
        id: &str,
        new_id: &str,
        name: &str,
    ) -> Result<PermissionGroup, RemoteError>;
    async fn set_default(&self, id: &str) -> Result<(), RemoteError>;
    /// Restore the built-in groups on the server
    async fn reset(&self) -> Result<Vec<PermissionGroup>, RemoteError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CloneRequest<'a> {
    id: &'a str,
    name: &'a str,
}

/// [`GroupService`] over the REST API
#[derive(Debug, Clone)]
pub struct HttpGroupService<C> {
    client: C,
}

impl<C: HttpClient> HttpGroupService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// `api/permission-groups/{id}[/{action}]` with the id encoded
    fn group_path(id: &str, action: Option<&str>) -> ClientResult<String> {
        match action {
            Some(action) => api_path(&["api", "permission-groups", id, action]),
            None => api_path(&["api", "permission-groups", id]),
        }
    }
}

#[async_trait]
impl<C: HttpClient> GroupService for HttpGroupService<C> {
    async fn list(&self) -> Result<Vec<PermissionGroup>, RemoteError> {
        Ok(self.client.get(GROUPS_PATH).await?)
    }

    async fn get(&self, id: &str) -> Result<PermissionGroup, RemoteError> {
        Ok(self.client.get(&Self::group_path(id, None)?).await?)
    }

    async fn create(&self, group: &PermissionGroupCreate) -> Result<PermissionGroup, RemoteError> {
        Ok(self.client.post(GROUPS_PATH, group).await?)
    }

    async fn update(
        &self,
        id: &str,
        patch: &PermissionGroupUpdate,
    ) -> Result<PermissionGroup, RemoteError> {
        Ok(self.client.put(&Self::group_path(id, None)?, patch).await?)
    }

    async fn remove(&self, id: &str) -> Result<(), RemoteError> {
        Ok(self.client.delete(&Self::group_path(id, None)?).await?)
    }

    async fn clone_group(
        &self,
        id: &str,
        new_id: &str,
        name: &str,
    ) -> Result<PermissionGroup, RemoteError> {
        let body = CloneRequest { id: new_id, name };
        let path = Self::group_path(id, Some("clone"))?;
        Ok(self.client.post(&path, &body).await?)
    }

    async fn set_default(&self, id: &str) -> Result<(), RemoteError> {
        let path = Self::group_path(id, Some("default"))?;
        Ok(self.client.post_empty(&path).await?)
    }

    async fn reset(&self) -> Result<Vec<PermissionGroup>, RemoteError> {
        let path = format!("{}/reset", GROUPS_PATH);
        Ok(self.client.post(&path, &serde_json::json!({})).await?)
    }
}
