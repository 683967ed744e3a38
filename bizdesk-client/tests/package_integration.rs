// bizdesk-client/tests/package_integration.rs
// 套餐限制与权限组应用集成测试

use async_trait::async_trait;
use bizdesk_client::{GroupCatalogue, MemoryCache, PackageRemote, PackageService, RemoteError};
use shared::{
    Employee, ModuleOverride, PackageLimits, PermissionGroup, PermissionGroupCreate, PlanType, Role,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct FakePackageRemote {
    limits: HashMap<String, PackageLimits>,
    down: AtomicBool,
}

impl FakePackageRemote {
    fn with(id: &str, limits: PackageLimits) -> Self {
        let mut fake = Self::default();
        fake.limits.insert(id.to_string(), limits);
        fake
    }
}

#[async_trait]
impl PackageRemote for FakePackageRemote {
    async fn limits(&self, package_id: &str) -> Result<PackageLimits, RemoteError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("timeout".to_string()));
        }
        self.limits
            .get(package_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(package_id.to_string()))
    }
}

fn employee(id: &str, role: Role, package_id: Option<&str>) -> Employee {
    Employee {
        id: id.to_string(),
        name: id.to_string(),
        role,
        package_id: package_id.map(str::to_string),
        owner_id: None,
        custom_module_permissions: Default::default(),
    }
}

fn custom_plan() -> PackageLimits {
    PackageLimits {
        max_custom_forms: 3,
        allowed_form_modules: vec!["stock".to_string()],
    }
}

#[tokio::test]
async fn test_remote_limits_are_cached() {
    let remote = Arc::new(FakePackageRemote::with("gold", custom_plan()));
    let service = PackageService::new(remote.clone(), Arc::new(MemoryCache::new()));

    assert_eq!(service.limits_for(Some("gold")).await, custom_plan());

    remote.down.store(true, Ordering::SeqCst);
    assert_eq!(service.limits_for(Some("gold")).await, custom_plan());
}

#[tokio::test]
async fn test_unknown_package_without_cache_is_basic() {
    let remote = Arc::new(FakePackageRemote::default());
    remote.down.store(true, Ordering::SeqCst);
    let service = PackageService::new(remote, Arc::new(MemoryCache::new()));

    assert_eq!(service.limits_for(Some("gold")).await, PlanType::Basic.limits());
    assert_eq!(service.limits_for(Some("pro")).await, PlanType::Pro.limits());
}

#[tokio::test]
async fn test_staff_gets_owner_package() {
    let remote = Arc::new(FakePackageRemote::with("gold", custom_plan()));
    let service = PackageService::new(remote, Arc::new(MemoryCache::new()));

    let owner = employee("o-1", Role::Owner, Some("gold"));
    let mut staff = employee("s-1", Role::Staff, Some("enterprise"));
    staff.owner_id = Some(owner.id.clone());

    assert_eq!(service.limits_for_employee(&staff, Some(&owner)).await, custom_plan());
    assert_eq!(service.limits_for_employee(&staff, None).await, PlanType::Basic.limits());
    assert_eq!(service.limits_for_employee(&owner, None).await, custom_plan());
}

#[tokio::test]
async fn test_apply_group_within_package_ceiling() {
    let catalogue = GroupCatalogue::offline(Arc::new(MemoryCache::new()));
    let group: PermissionGroupCreate = PermissionGroup::new("stock-lead", "Stock Lead")
        .grant("stock", ["view", "edit", "custom_fields"])
        .grant("purchases", ["custom_form"])
        .into();
    catalogue.create(group).await.unwrap();

    let mut staff = employee("s-1", Role::Staff, None);
    let applied = catalogue
        .apply_to_employee("stock-lead", &mut staff, &custom_plan())
        .await
        .unwrap();

    // purchases only carried a customization action outside the allow-list
    assert!(applied.permissions["purchases"].actions.is_empty());
    let stock = &staff.custom_module_permissions["stock"];
    assert!(stock.allows("edit"));
    assert!(stock.allows("custom_fields"));
    assert!(staff.custom_module_permissions["purchases"].actions.is_empty());
}

#[tokio::test]
async fn test_apply_group_replaces_module_emptied_by_ceiling() {
    let catalogue = GroupCatalogue::offline(Arc::new(MemoryCache::new()));
    let group: PermissionGroupCreate = PermissionGroup::new("stock-fields", "Stock Fields")
        .grant("stock", ["custom_fields"])
        .into();
    catalogue.create(group).await.unwrap();

    let mut staff = employee("s-1", Role::Staff, None);
    staff.custom_module_permissions.insert(
        "stock".to_string(),
        ModuleOverride::with_actions(["view", "create", "edit", "delete"]),
    );
    staff
        .custom_module_permissions
        .insert("customers".to_string(), ModuleOverride::with_actions(["view"]));
    let sales_only = PackageLimits {
        max_custom_forms: 1,
        allowed_form_modules: vec!["sales".to_string()],
    };

    catalogue
        .apply_to_employee("stock-fields", &mut staff, &sales_only)
        .await
        .unwrap();

    let stock = &staff.custom_module_permissions["stock"];
    assert!(stock.actions.is_empty());
    assert!(!stock.allows("delete"));
    assert!(staff.custom_module_permissions["customers"].allows("view"));
}
