//! Package Service
//!
//! Resolves the customization limits of a subscription package through the
//! resilient read: remote service, then cache, then the built-in plan table.

use async_trait::async_trait;
use bizdesk_auth::effective_package_id;
use shared::{Employee, PackageLimits, PlanType};
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::ClientConfig;
use crate::error::RemoteError;
use crate::http::{HttpClient, api_path};
use crate::resilient::ResilientRead;

/// Remote source of package limits
#[async_trait]
pub trait PackageRemote: Send + Sync {
    async fn limits(&self, package_id: &str) -> Result<PackageLimits, RemoteError>;
}

/// [`PackageRemote`] over the REST API
#[derive(Debug, Clone)]
pub struct HttpPackageRemote<C> {
    client: C,
}

impl<C: HttpClient> HttpPackageRemote<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: HttpClient> PackageRemote for HttpPackageRemote<C> {
    async fn limits(&self, package_id: &str) -> Result<PackageLimits, RemoteError> {
        let path = api_path(&["api", "packages", package_id, "limits"])?;
        Ok(self.client.get(&path).await?)
    }
}

/// Built-in limits of a package id; unknown ids get the basic plan
pub fn builtin_limits(package_id: &str) -> PackageLimits {
    PlanType::from_package_id(package_id)
        .unwrap_or(PlanType::Basic)
        .limits()
}

pub struct PackageService {
    remote: Option<Arc<dyn PackageRemote>>,
    reader: ResilientRead,
}

impl std::fmt::Debug for PackageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageService")
            .field("offline", &self.remote.is_none())
            .finish_non_exhaustive()
    }
}

impl PackageService {
    pub fn new(remote: Arc<dyn PackageRemote>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            remote: Some(remote),
            reader: ResilientRead::new(cache),
        }
    }

    pub fn offline(cache: Arc<dyn CacheStore>) -> Self {
        Self {
            remote: None,
            reader: ResilientRead::new(cache),
        }
    }

    pub fn from_config(config: &ClientConfig, remote: Arc<dyn PackageRemote>) -> Self {
        if config.offline {
            Self::offline(config.cache_store())
        } else {
            Self::new(remote, config.cache_store())
        }
    }

    /// Limits of a package. Never fails; no package means the basic plan.
    pub async fn limits_for(&self, package_id: Option<&str>) -> PackageLimits {
        let Some(id) = package_id.filter(|id| !id.is_empty()) else {
            return PlanType::Basic.limits();
        };

        let key = format!("package_limits:{}", id);
        let fetch = async {
            match &self.remote {
                Some(r) => r.limits(id).await,
                None => Err(RemoteError::Offline),
            }
        };
        let resolved = self.reader.read(&key, fetch, || builtin_limits(id)).await;
        tracing::debug!(package_id = id, source = ?resolved.source, "Package limits resolved");
        resolved.value
    }

    /// Limits that apply to an employee.
    ///
    /// STAFF always gets the owner's package, never their own.
    pub async fn limits_for_employee(
        &self,
        employee: &Employee,
        owner: Option<&Employee>,
    ) -> PackageLimits {
        let package_id = effective_package_id(
            employee.role,
            employee.package_id.as_deref(),
            owner.and_then(|o| o.package_id.as_deref()),
        );
        self.limits_for(package_id).await
    }
}
