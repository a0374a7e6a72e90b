use tracing::{debug, warn};

use crate::api::types::{CreateLicenseAssignmentRequest, EntityId, LicenseAssignment, SoftwareLicense};
use crate::api::{ApiError, QueryParams};
use crate::cache::{MutationKind, MutationRecord};

use super::keys::{self, LICENSE_ASSIGNMENTS, SOFTWARE_LICENSES};
use super::{ttl, valid_id, ResourceContext};

const PATH: &str = "/license-assignments";

/// Seat assignments of software licenses to users and devices.
#[derive(Clone)]
pub struct LicenseAssignments {
  ctx: ResourceContext,
}

impl LicenseAssignments {
  pub fn new(ctx: ResourceContext) -> Self {
    Self { ctx }
  }

  /// Assignments of one license. Empty without a request for an invalid id.
  pub async fn for_license(&self, license_id: Option<EntityId>) -> Result<Vec<LicenseAssignment>, ApiError> {
    let Some(license_id) = valid_id(license_id) else {
      return Ok(Vec::new());
    };
    self
      .ctx
      .get_cached(
        keys::license_assignments(license_id),
        ttl::ASSIGNMENTS,
        format!("/software-licenses/{}/assignments", license_id),
        None,
      )
      .await
  }

  pub async fn for_user(&self, user_id: Option<EntityId>) -> Result<Vec<LicenseAssignment>, ApiError> {
    let Some(user_id) = valid_id(user_id) else {
      return Ok(Vec::new());
    };
    self
      .ctx
      .get_cached(
        keys::assignments_by_user(user_id),
        ttl::ASSIGNMENTS,
        PATH.to_string(),
        Some(QueryParams::new().set("userId", user_id)),
      )
      .await
  }

  pub async fn for_device(&self, device_id: Option<EntityId>) -> Result<Vec<LicenseAssignment>, ApiError> {
    let Some(device_id) = valid_id(device_id) else {
      return Ok(Vec::new());
    };
    self
      .ctx
      .get_cached(
        keys::assignments_by_device(device_id),
        ttl::ASSIGNMENTS,
        PATH.to_string(),
        Some(QueryParams::new().set("deviceId", device_id)),
      )
      .await
  }

  /// Assign a seat.
  ///
  /// When the cached license already shows no available seats the request is
  /// rejected locally with a validation error and nothing is sent. On success
  /// the license, its aggregates and every assignment view are invalidated.
  pub async fn assign(
    &self,
    request: &CreateLicenseAssignmentRequest,
  ) -> Result<LicenseAssignment, ApiError> {
    let license_id = request.software_license_id;
    let cached: Option<SoftwareLicense> = self.ctx.cache.peek(&SOFTWARE_LICENSES.detail(license_id));
    if let Some(license) = cached.filter(|l| l.available_seats == 0) {
      warn!(license_id, software = %license.software_name, "no seats available, assignment rejected");
      return Err(ApiError::validation(format!(
        "No available seats for license {}",
        license.software_name
      )));
    }

    self
      .ctx
      .mutate(
        || self.ctx.api.post::<LicenseAssignment, _>(PATH, request),
        |assignment| {
          Ok(
            MutationRecord::for_entity(
              MutationKind::Create,
              LICENSE_ASSIGNMENTS.name(),
              assignment,
            )
            .invalidate(keys::license_assignments(license_id))
            .invalidate(SOFTWARE_LICENSES.detail(license_id))
            .invalidate(SOFTWARE_LICENSES.lists())
            .invalidate(keys::license_compliance())
            .invalidate(LICENSE_ASSIGNMENTS.all()),
          )
        },
      )
      .await
  }

  /// Remove an assignment.
  ///
  /// The assignment is dropped from the cached list of `license_id` before the
  /// request is sent. If the request fails the list is put back exactly as it
  /// was; if it succeeds every license and assignment view is invalidated.
  pub async fn unassign(&self, license_id: EntityId, assignment_id: EntityId) -> Result<(), ApiError> {
    let key = keys::license_assignments(license_id);
    let previous = self.ctx.cache.snapshot(&key);

    if let Some(current) = self.ctx.cache.peek::<Vec<LicenseAssignment>>(&key) {
      let remaining: Vec<LicenseAssignment> = current
        .into_iter()
        .filter(|a| a.id != assignment_id)
        .collect();
      self.ctx.cache.write(&key, &remaining)?;
      debug!(key = %key, assignment_id, "optimistically removed assignment");
    }

    let path = format!("{}/{}", PATH, assignment_id);
    let result = self
      .ctx
      .mutate(
        || self.ctx.api.delete(&path),
        |_| {
          Ok(
            MutationRecord::new(
              MutationKind::Delete,
              LICENSE_ASSIGNMENTS.name(),
              Some(assignment_id),
            )
            .invalidate(SOFTWARE_LICENSES.all())
            .invalidate(LICENSE_ASSIGNMENTS.all()),
          )
        },
      )
      .await;

    if let Err(err) = &result {
      warn!(key = %key, assignment_id, status = err.status, "unassign failed, restoring assignments");
      self.ctx.cache.restore(&key, previous);
    }
    result
  }
}
