#![allow(dead_code)]

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::MockServer;

use itam_sync::api::ApiClient;
use itam_sync::cache::QueryCache;
use itam_sync::config::{ApiConfig, CacheConfig};
use itam_sync::resources::ResourceContext;
use itam_sync::{RetryPolicy, Session};

/// Session against `server` with the default attempt budgets and no backoff.
pub fn session(server: &MockServer) -> Session {
  let api = ApiClient::new(&ApiConfig {
    base_url: server.uri(),
    ..ApiConfig::default()
  })
  .expect("client");
  let ctx = ResourceContext::new(
    api,
    QueryCache::new(&CacheConfig::default()),
    instant(3),
    instant(2),
  );
  Session::from_context(ctx, Duration::from_secs(30))
}

pub fn instant(attempts: u32) -> RetryPolicy {
  RetryPolicy::new(attempts).with_backoff(Duration::ZERO, Duration::ZERO)
}

pub fn api_path(path: &str) -> String {
  format!("/api/v1{}", path)
}

pub fn asset(id: u64, serial: &str) -> Value {
  json!({
    "id": id,
    "asset_tag": format!("TAG-{}", id),
    "serial_number": serial,
    "status": "deployed",
    "purchase_date": null,
    "purchase_cost": null,
    "warranty_expiration_date": null,
    "notes": null,
    "mac_addresses": null,
    "po_number": null,
    "created_at": "2024-03-01T00:00:00Z",
    "updated_at": "2024-03-01T00:00:00Z",
    "model_name": "Latitude 7440",
    "model_number": null,
    "manufacturer_name": "Dell",
    "category_name": "Laptop"
  })
}

pub fn license(id: u64, name: &str, total: u32, used: u32) -> Value {
  json!({
    "id": id,
    "software_name": name,
    "software_version": null,
    "software_publisher": "Contoso",
    "license_key": null,
    "license_type": "subscription",
    "license_model": "per_user",
    "total_seats": total,
    "used_seats": used,
    "available_seats": total.saturating_sub(used),
    "cost_per_seat": null,
    "total_cost": null,
    "purchase_date": null,
    "expiration_date": null,
    "maintenance_expiration_date": null,
    "purchase_order_number": null,
    "vendor_name": null,
    "vendor_contact": null,
    "notes": null,
    "is_active": true,
    "created_at": "2024-03-01T00:00:00Z",
    "updated_at": "2024-03-01T00:00:00Z"
  })
}

pub fn assignment(id: u64, license_id: u64, user_id: u64) -> Value {
  json!({
    "id": id,
    "software_license_id": license_id,
    "assigned_to_user_id": user_id,
    "assigned_to_device_id": null,
    "assignment_date": "2024-04-01",
    "unassignment_date": null,
    "assignment_type": "user"
  })
}

pub fn page(items: Vec<Value>) -> Value {
  let total = items.len();
  json!({
    "data": items,
    "pagination": {
      "currentPage": 1,
      "totalPages": 1,
      "totalItems": total,
      "itemsPerPage": 25
    }
  })
}
