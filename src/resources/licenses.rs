use crate::api::types::{
  ApiResponse, ComplianceSummary, CreateSoftwareLicenseRequest, Entity, EntityId, SoftwareLicense,
  SoftwareLicenseQuery, UpdateSoftwareLicenseRequest, EXPIRING_SOON_DAYS,
};
use crate::api::{ApiError, QueryParams};
use crate::cache::{MutationKind, MutationRecord};

use super::keys::{self, SOFTWARE_LICENSES};
use super::{params_of, ttl, valid_id, ResourceContext};

const PATH: &str = "/software-licenses";

/// Default window for [`SoftwareLicenses::expiring`].
pub const DEFAULT_EXPIRING_DAYS: u32 = EXPIRING_SOON_DAYS as u32;

/// Software license inventory and compliance aggregates.
#[derive(Clone)]
pub struct SoftwareLicenses {
  ctx: ResourceContext,
}

impl SoftwareLicenses {
  pub fn new(ctx: ResourceContext) -> Self {
    Self { ctx }
  }

  pub async fn list(
    &self,
    query: Option<&SoftwareLicenseQuery>,
  ) -> Result<ApiResponse<Vec<SoftwareLicense>>, ApiError> {
    let params = params_of(query)?;
    self
      .ctx
      .get_cached(
        SOFTWARE_LICENSES.list(params.clone()),
        ttl::COLLECTION,
        PATH.to_string(),
        params,
      )
      .await
  }

  /// A single license; `Ok(None)` without a request when no valid id is
  /// selected.
  pub async fn get(&self, id: Option<EntityId>) -> Result<Option<SoftwareLicense>, ApiError> {
    let Some(id) = valid_id(id) else {
      return Ok(None);
    };
    self
      .ctx
      .get_cached(
        SOFTWARE_LICENSES.detail(id),
        ttl::COLLECTION,
        format!("{}/{}", PATH, id),
        None,
      )
      .await
      .map(Some)
  }

  /// The cached copy of a license, if any, without fetching.
  pub fn cached(&self, id: EntityId) -> Option<SoftwareLicense> {
    self.ctx.cache.peek(&SOFTWARE_LICENSES.detail(id))
  }

  pub async fn compliance_summary(&self) -> Result<ComplianceSummary, ApiError> {
    self
      .ctx
      .get_cached(
        keys::license_compliance(),
        ttl::COMPLIANCE,
        format!("{}/compliance", PATH),
        None,
      )
      .await
  }

  /// Licenses expiring within `days`, [`DEFAULT_EXPIRING_DAYS`] when unset.
  pub async fn expiring(&self, days: Option<u32>) -> Result<Vec<SoftwareLicense>, ApiError> {
    let days = days.unwrap_or(DEFAULT_EXPIRING_DAYS);
    self
      .ctx
      .get_cached(
        keys::licenses_expiring(days),
        ttl::COLLECTION,
        format!("{}/expiring", PATH),
        Some(QueryParams::new().set("days", days)),
      )
      .await
  }

  pub async fn create(
    &self,
    request: &CreateSoftwareLicenseRequest,
  ) -> Result<SoftwareLicense, ApiError> {
    self
      .ctx
      .mutate(
        || self.ctx.api.post::<SoftwareLicense, _>(PATH, request),
        |license| {
          aggregates(MutationRecord::for_entity(
            MutationKind::Create,
            SOFTWARE_LICENSES.name(),
            license,
          ))
          .write(SOFTWARE_LICENSES.detail(license.id()), license)
        },
      )
      .await
  }

  pub async fn update(
    &self,
    id: EntityId,
    request: &UpdateSoftwareLicenseRequest,
  ) -> Result<SoftwareLicense, ApiError> {
    let path = format!("{}/{}", PATH, id);
    self
      .ctx
      .mutate(
        || self.ctx.api.put::<SoftwareLicense, _>(&path, request),
        |license| {
          aggregates(MutationRecord::for_entity(
            MutationKind::Update,
            SOFTWARE_LICENSES.name(),
            license,
          ))
          .write(SOFTWARE_LICENSES.detail(license.id()), license)
        },
      )
      .await
  }

  /// Delete a license; its detail and assignment entries are evicted.
  pub async fn delete(&self, id: EntityId) -> Result<(), ApiError> {
    let path = format!("{}/{}", PATH, id);
    self
      .ctx
      .mutate(
        || self.ctx.api.delete(&path),
        |_| {
          Ok(
            aggregates(MutationRecord::new(
              MutationKind::Delete,
              SOFTWARE_LICENSES.name(),
              Some(id),
            ))
            .evict(SOFTWARE_LICENSES.detail(id))
            .evict(keys::license_assignments(id)),
          )
        },
      )
      .await
  }
}

/// Lists plus every aggregate derived from license data.
fn aggregates(record: MutationRecord) -> MutationRecord {
  record
    .invalidate(SOFTWARE_LICENSES.lists())
    .invalidate(keys::license_compliance())
    .invalidate(keys::licenses_expiring_all())
}
