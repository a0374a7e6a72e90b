use crate::api::types::{
  AssetCategory, CreateSoftwarePublisherRequest, Location, Manufacturer,
  SoftwarePublisher, User, UserQuery,
};
use crate::api::ApiError;
use crate::cache::{MutationKind, MutationRecord};

use super::keys::{ASSET_CATEGORIES, LOCATIONS, MANUFACTURERS, SOFTWARE_PUBLISHERS, USERS};
use super::{params_of, ttl, ResourceContext};

/// Reference data used to fill forms and filters. It changes rarely, so it is
/// kept fresh for longer than inventory data.
#[derive(Clone)]
pub struct Lookups {
  ctx: ResourceContext,
}

impl Lookups {
  pub fn new(ctx: ResourceContext) -> Self {
    Self { ctx }
  }

  /// Users as a bare array; the endpoint is not paginated.
  pub async fn users(&self, query: Option<&UserQuery>) -> Result<Vec<User>, ApiError> {
    let params = params_of(query)?;
    self
      .ctx
      .get_cached(USERS.list(params.clone()), ttl::USERS, "/users".to_string(), params)
      .await
  }

  pub async fn locations(&self) -> Result<Vec<Location>, ApiError> {
    self
      .ctx
      .get_cached(LOCATIONS.all(), ttl::LOCATIONS, "/locations".to_string(), None)
      .await
  }

  pub async fn manufacturers(&self) -> Result<Vec<Manufacturer>, ApiError> {
    self
      .ctx
      .get_cached(
        MANUFACTURERS.all(),
        ttl::MANUFACTURERS,
        "/manufacturers".to_string(),
        None,
      )
      .await
  }

  pub async fn asset_categories(&self) -> Result<Vec<AssetCategory>, ApiError> {
    self
      .ctx
      .get_cached(
        ASSET_CATEGORIES.all(),
        ttl::CATEGORIES,
        "/asset-categories".to_string(),
        None,
      )
      .await
  }

  pub async fn publishers(&self) -> Result<Vec<SoftwarePublisher>, ApiError> {
    self
      .ctx
      .get_cached(
        SOFTWARE_PUBLISHERS.all(),
        ttl::PUBLISHERS,
        "/software-publishers".to_string(),
        None,
      )
      .await
  }

  pub async fn create_publisher(
    &self,
    request: &CreateSoftwarePublisherRequest,
  ) -> Result<SoftwarePublisher, ApiError> {
    self
      .ctx
      .mutate(
        || {
          self
            .ctx
            .api
            .post::<SoftwarePublisher, _>("/software-publishers", request)
        },
        |publisher| {
          Ok(
            MutationRecord::for_entity(
              MutationKind::Create,
              SOFTWARE_PUBLISHERS.name(),
              publisher,
            )
            .invalidate(SOFTWARE_PUBLISHERS.all()),
          )
        },
      )
      .await
  }
}
