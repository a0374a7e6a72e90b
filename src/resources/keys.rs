//! Cache key factories, one per entity.

use crate::api::types::EntityId;
use crate::api::QueryParams;
use crate::cache::QueryKey;

/// Key shapes shared by every entity collection:
///
/// - `[root]` everything for the entity
/// - `[root, "list"]` every list variant
/// - `[root, "list", params]` one list variant
/// - `[root, "detail", id]` one item
#[derive(Debug, Clone, Copy)]
pub struct EntityKeys {
  root: &'static str,
}

impl EntityKeys {
  pub const fn new(root: &'static str) -> Self {
    Self { root }
  }

  pub fn name(&self) -> &'static str {
    self.root
  }

  pub fn all(&self) -> QueryKey {
    QueryKey::new(self.root)
  }

  pub fn lists(&self) -> QueryKey {
    self.all().with("list")
  }

  pub fn list(&self, params: Option<QueryParams>) -> QueryKey {
    self.lists().with(params)
  }

  pub fn details(&self) -> QueryKey {
    self.all().with("detail")
  }

  pub fn detail(&self, id: EntityId) -> QueryKey {
    self.details().with(id)
  }
}

pub const HARDWARE_ASSETS: EntityKeys = EntityKeys::new("hardware-assets");
pub const SOFTWARE_LICENSES: EntityKeys = EntityKeys::new("software-licenses");
pub const LICENSE_ASSIGNMENTS: EntityKeys = EntityKeys::new("license-assignments");
pub const USERS: EntityKeys = EntityKeys::new("users");
pub const LOCATIONS: EntityKeys = EntityKeys::new("locations");
pub const MANUFACTURERS: EntityKeys = EntityKeys::new("manufacturers");
pub const ASSET_CATEGORIES: EntityKeys = EntityKeys::new("asset-categories");
pub const SOFTWARE_PUBLISHERS: EntityKeys = EntityKeys::new("software-publishers");

/// `[software-licenses, "compliance"]`
pub fn license_compliance() -> QueryKey {
  SOFTWARE_LICENSES.all().with("compliance")
}

/// `[software-licenses, "expiring"]`, prefix of every expiring window.
pub fn licenses_expiring_all() -> QueryKey {
  SOFTWARE_LICENSES.all().with("expiring")
}

/// `[software-licenses, "expiring", days]`
pub fn licenses_expiring(days: u32) -> QueryKey {
  licenses_expiring_all().with(u64::from(days))
}

/// `[software-licenses, "assignments", license_id]`
pub fn license_assignments(license_id: EntityId) -> QueryKey {
  SOFTWARE_LICENSES.all().with("assignments").with(license_id)
}

/// `[license-assignments, "user", user_id]`
pub fn assignments_by_user(user_id: EntityId) -> QueryKey {
  LICENSE_ASSIGNMENTS.all().with("user").with(user_id)
}

/// `[license-assignments, "device", device_id]`
pub fn assignments_by_device(device_id: EntityId) -> QueryKey {
  LICENSE_ASSIGNMENTS.all().with("device").with(device_id)
}

/// `[health]`
pub fn health() -> QueryKey {
  QueryKey::new("health")
}
