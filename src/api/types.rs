//! Serde types matching the asset management API.
//!
//! Entities are snake_case on the wire; request bodies and query parameters
//! are camelCase.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Numeric identifier shared by every entity.
pub type EntityId = u64;

/// Days ahead of expiration at which a license counts as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// An entity held by the cache and addressable by id.
pub trait Entity: Clone + Send + Sync + Serialize + serde::de::DeserializeOwned + 'static {
  fn id(&self) -> EntityId;
}

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
  pub current_page: u32,
  pub total_pages: u32,
  pub total_items: u64,
  pub items_per_page: u32,
}

/// Paginated list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
  pub data: T,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pagination: Option<PaginationInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  Desc,
}

// ============================================================================
// Hardware assets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
  InStock,
  Deployed,
  InRepair,
  Retired,
  Disposed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAssignment {
  pub id: EntityId,
  pub hardware_asset_id: EntityId,
  pub assigned_to_user_id: EntityId,
  pub location_id: EntityId,
  pub assignment_date: String,
  pub unassignment_date: Option<String>,
  #[serde(default)]
  pub assigned_user_name: Option<String>,
  #[serde(default)]
  pub assigned_user_email: Option<String>,
  #[serde(default)]
  pub location_name: Option<String>,
  #[serde(default)]
  pub assignment_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareAsset {
  pub id: EntityId,
  pub asset_tag: Option<String>,
  pub serial_number: String,
  pub status: AssetStatus,
  pub purchase_date: Option<String>,
  pub purchase_cost: Option<f64>,
  pub warranty_expiration_date: Option<String>,
  pub notes: Option<String>,
  pub mac_addresses: Option<String>,
  pub po_number: Option<String>,
  pub created_at: String,
  pub updated_at: String,
  pub model_name: String,
  pub model_number: Option<String>,
  pub manufacturer_name: String,
  pub category_name: String,
  #[serde(default)]
  pub vendor_name: Option<String>,
  #[serde(default)]
  pub specifications: Option<String>,
  #[serde(default)]
  pub current_assignment: Option<AssetAssignment>,
  #[serde(default)]
  pub assignments: Option<Vec<AssetAssignment>>,
}

impl Entity for HardwareAsset {
  fn id(&self) -> EntityId {
    self.id
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHardwareAssetRequest {
  pub make: String,
  pub model: String,
  pub serial_number: String,
  pub asset_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub asset_tag: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cpu: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ram: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub storage: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub mac_addresses: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub purchase_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub purchase_cost: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub po_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vendor_id: Option<EntityId>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warranty_expiration_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub initial_status: Option<AssetStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub model_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

/// Partial update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHardwareAssetRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub asset_tag: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub serial_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<AssetStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub purchase_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub purchase_cost: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub warranty_expiration_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub po_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareAssetQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub status: Option<AssetStatus>,
  pub asset_type: Option<String>,
  /// One of created_at, updated_at, purchase_date, status, serial_number, asset_tag.
  pub sort_by: Option<String>,
  pub sort_order: Option<SortOrder>,
  pub search: Option<String>,
}

// ============================================================================
// Software licenses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseType {
  Perpetual,
  Subscription,
  Volume,
  Oem,
  Trial,
  Educational,
  EnterpriseAgreement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseModel {
  PerUser,
  PerDevice,
  PerCore,
  PerProcessor,
  Concurrent,
  NamedUser,
  SiteLicense,
  Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseAssignmentType {
  User,
  Device,
  Shared,
}

/// Seat usage versus entitlement and expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
  Compliant,
  OverDeployed,
  UnderUtilized,
  Expired,
  ExpiringSoon,
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareLicense {
  pub id: EntityId,
  pub software_name: String,
  pub software_version: Option<String>,
  pub software_publisher: String,
  pub license_key: Option<String>,
  pub license_type: LicenseType,
  pub license_model: LicenseModel,
  pub total_seats: u32,
  pub used_seats: u32,
  pub available_seats: u32,
  pub cost_per_seat: Option<f64>,
  pub total_cost: Option<f64>,
  pub purchase_date: Option<String>,
  pub expiration_date: Option<String>,
  pub maintenance_expiration_date: Option<String>,
  pub purchase_order_number: Option<String>,
  pub vendor_name: Option<String>,
  pub vendor_contact: Option<String>,
  pub notes: Option<String>,
  pub is_active: bool,
  pub created_at: String,
  pub updated_at: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub assignments: Option<Vec<LicenseAssignment>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub compliance_status: Option<ComplianceStatus>,
}

impl Entity for SoftwareLicense {
  fn id(&self) -> EntityId {
    self.id
  }
}

impl SoftwareLicense {
  /// Parsed expiration date, if present and well-formed. Accepts plain dates
  /// and RFC 3339 timestamps.
  pub fn expiration(&self) -> Option<NaiveDate> {
    let raw = self.expiration_date.as_deref()?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
      .ok()
      .or_else(|| {
        chrono::DateTime::parse_from_rfc3339(raw)
          .ok()
          .map(|dt| dt.date_naive())
      })
  }

  /// Classify seat usage and expiration as of `today`.
  pub fn derived_compliance(&self, today: NaiveDate) -> ComplianceStatus {
    let expiration = self.expiration();

    if expiration.is_some_and(|d| d < today) {
      return ComplianceStatus::Expired;
    }
    if self.used_seats > self.total_seats {
      return ComplianceStatus::OverDeployed;
    }
    if expiration.is_some_and(|d| d <= today + Duration::days(EXPIRING_SOON_DAYS)) {
      return ComplianceStatus::ExpiringSoon;
    }
    if self.total_seats == 0 {
      return ComplianceStatus::Unknown;
    }
    if self.used_seats * 2 < self.total_seats {
      return ComplianceStatus::UnderUtilized;
    }
    ComplianceStatus::Compliant
  }

  /// Server-reported status when present, else the derived one.
  pub fn effective_compliance(&self, today: NaiveDate) -> ComplianceStatus {
    self
      .compliance_status
      .unwrap_or_else(|| self.derived_compliance(today))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseAssignment {
  pub id: EntityId,
  pub software_license_id: EntityId,
  pub assigned_to_user_id: Option<EntityId>,
  pub assigned_to_device_id: Option<EntityId>,
  pub assignment_date: String,
  pub unassignment_date: Option<String>,
  pub assignment_type: LicenseAssignmentType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub device_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub device_serial: Option<String>,
}

impl Entity for LicenseAssignment {
  fn id(&self) -> EntityId {
    self.id
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSoftwareLicenseRequest {
  pub software_name: String,
  pub software_publisher: String,
  pub license_type: LicenseType,
  pub license_model: LicenseModel,
  pub total_seats: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub software_version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license_key: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cost_per_seat: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total_cost: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub purchase_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub expiration_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub maintenance_expiration_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub purchase_order_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vendor_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub vendor_contact: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSoftwareLicenseRequest {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub software_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub software_version: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub software_publisher: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license_type: Option<LicenseType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license_model: Option<LicenseModel>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total_seats: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub expiration_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLicenseAssignmentRequest {
  pub software_license_id: EntityId,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to_user_id: Option<EntityId>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub assigned_to_device_id: Option<EntityId>,
  pub assignment_type: LicenseAssignmentType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareLicenseQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub license_type: Option<LicenseType>,
  pub license_model: Option<LicenseModel>,
  pub compliance_status: Option<ComplianceStatus>,
  pub is_active: Option<bool>,
  pub expiring_within_days: Option<u32>,
  /// One of software_name, expiration_date, created_at, total_seats, used_seats.
  pub sort_by: Option<String>,
  pub sort_order: Option<SortOrder>,
  pub search: Option<String>,
}

/// Aggregate counts over all licenses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
  pub total_licenses: u32,
  pub compliant: u32,
  pub over_deployed: u32,
  pub expiring_soon: u32,
  pub expired: u32,
}

impl ComplianceSummary {
  /// Tally licenses locally using their effective status.
  pub fn from_licenses(licenses: &[SoftwareLicense], today: NaiveDate) -> Self {
    let mut summary = Self::default();
    for license in licenses {
      summary.total_licenses += 1;
      match license.effective_compliance(today) {
        ComplianceStatus::Compliant => summary.compliant += 1,
        ComplianceStatus::OverDeployed => summary.over_deployed += 1,
        ComplianceStatus::ExpiringSoon => summary.expiring_soon += 1,
        ComplianceStatus::Expired => summary.expired += 1,
        ComplianceStatus::UnderUtilized | ComplianceStatus::Unknown => {}
      }
    }
    summary
  }
}

// ============================================================================
// Lookups
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id: EntityId,
  pub employee_id: Option<String>,
  pub full_name: String,
  pub email: String,
  pub department_id: Option<EntityId>,
  pub is_active: bool,
  pub created_at: String,
  pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
  pub page: Option<u32>,
  pub limit: Option<u32>,
  pub is_active: Option<bool>,
  pub department_id: Option<EntityId>,
  /// One of full_name, email, created_at, employee_id.
  pub sort_by: Option<String>,
  pub sort_order: Option<SortOrder>,
  pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub id: EntityId,
  pub name: String,
  pub address_line1: Option<String>,
  pub city: Option<String>,
  pub state_province: Option<String>,
  pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
  pub id: EntityId,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCategory {
  pub id: EntityId,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwarePublisher {
  pub id: EntityId,
  pub name: String,
  pub website: Option<String>,
  pub support_contact: Option<String>,
}

impl Entity for SoftwarePublisher {
  fn id(&self) -> EntityId {
    self.id
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSoftwarePublisherRequest {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub website: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub support_contact: Option<String>,
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
  pub status: String,
  pub timestamp: String,
  pub version: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn license(total: u32, used: u32, expiration: Option<&str>) -> SoftwareLicense {
    SoftwareLicense {
      id: 1,
      software_name: "Office".into(),
      software_version: None,
      software_publisher: "Contoso".into(),
      license_key: None,
      license_type: LicenseType::Subscription,
      license_model: LicenseModel::PerUser,
      total_seats: total,
      used_seats: used,
      available_seats: total.saturating_sub(used),
      cost_per_seat: None,
      total_cost: None,
      purchase_date: None,
      expiration_date: expiration.map(String::from),
      maintenance_expiration_date: None,
      purchase_order_number: None,
      vendor_name: None,
      vendor_contact: None,
      notes: None,
      is_active: true,
      created_at: "2024-01-01T00:00:00Z".into(),
      updated_at: "2024-01-01T00:00:00Z".into(),
      assignments: None,
      compliance_status: None,
    }
  }

  fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
  }

  #[test]
  fn compliance_classification() {
    let today = day("2025-06-01");

    assert_eq!(
      license(10, 8, Some("2025-05-31")).derived_compliance(today),
      ComplianceStatus::Expired
    );
    assert_eq!(
      license(10, 12, Some("2026-01-01")).derived_compliance(today),
      ComplianceStatus::OverDeployed
    );
    assert_eq!(
      license(10, 8, Some("2025-06-20")).derived_compliance(today),
      ComplianceStatus::ExpiringSoon
    );
    assert_eq!(
      license(10, 2, None).derived_compliance(today),
      ComplianceStatus::UnderUtilized
    );
    assert_eq!(license(0, 0, None).derived_compliance(today), ComplianceStatus::Unknown);
    assert_eq!(license(10, 5, None).derived_compliance(today), ComplianceStatus::Compliant);
  }

  #[test]
  fn server_status_wins() {
    let mut l = license(10, 12, None);
    l.compliance_status = Some(ComplianceStatus::Compliant);
    assert_eq!(l.effective_compliance(day("2025-06-01")), ComplianceStatus::Compliant);
  }

  #[test]
  fn rfc3339_expiration_is_accepted() {
    let l = license(10, 5, Some("2025-05-01T12:00:00Z"));
    assert_eq!(l.expiration(), Some(day("2025-05-01")));
  }

  #[test]
  fn summary_tallies_effective_status() {
    let today = day("2025-06-01");
    let licenses = vec![
      license(10, 5, None),
      license(10, 11, None),
      license(10, 5, Some("2025-01-01")),
      license(10, 5, Some("2025-06-10")),
      license(10, 1, None),
    ];
    let summary = ComplianceSummary::from_licenses(&licenses, today);
    assert_eq!(
      summary,
      ComplianceSummary {
        total_licenses: 5,
        compliant: 1,
        over_deployed: 1,
        expiring_soon: 1,
        expired: 1,
      }
    );
  }

  #[test]
  fn create_request_is_camel_case() {
    let req = CreateLicenseAssignmentRequest {
      software_license_id: 3,
      assigned_to_user_id: Some(7),
      assigned_to_device_id: None,
      assignment_type: LicenseAssignmentType::User,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "softwareLicenseId": 3,
        "assignedToUserId": 7,
        "assignmentType": "user"
      })
    );
  }
}
