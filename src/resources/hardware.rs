use crate::api::types::{
  ApiResponse, CreateHardwareAssetRequest, Entity, EntityId, HardwareAsset, HardwareAssetQuery,
  UpdateHardwareAssetRequest,
};
use crate::api::ApiError;
use crate::cache::{MutationKind, MutationRecord};

use super::keys::HARDWARE_ASSETS;
use super::{params_of, ttl, valid_id, ResourceContext};

const PATH: &str = "/hardware-assets";

/// Hardware inventory.
#[derive(Clone)]
pub struct HardwareAssets {
  ctx: ResourceContext,
}

impl HardwareAssets {
  pub fn new(ctx: ResourceContext) -> Self {
    Self { ctx }
  }

  /// Paginated list; each distinct query is cached separately.
  pub async fn list(
    &self,
    query: Option<&HardwareAssetQuery>,
  ) -> Result<ApiResponse<Vec<HardwareAsset>>, ApiError> {
    let params = params_of(query)?;
    self
      .ctx
      .get_cached(
        HARDWARE_ASSETS.list(params.clone()),
        ttl::COLLECTION,
        PATH.to_string(),
        params,
      )
      .await
  }

  /// A single asset. Returns `Ok(None)` without a request when no valid id is
  /// selected.
  pub async fn get(&self, id: Option<EntityId>) -> Result<Option<HardwareAsset>, ApiError> {
    let Some(id) = valid_id(id) else {
      return Ok(None);
    };
    self
      .ctx
      .get_cached(
        HARDWARE_ASSETS.detail(id),
        ttl::COLLECTION,
        format!("{}/{}", PATH, id),
        None,
      )
      .await
      .map(Some)
  }

  /// Create an asset; lists are invalidated and the new asset seeded as its
  /// own detail entry.
  pub async fn create(&self, request: &CreateHardwareAssetRequest) -> Result<HardwareAsset, ApiError> {
    self
      .ctx
      .mutate(
        || self.ctx.api.post::<HardwareAsset, _>(PATH, request),
        |asset| {
          MutationRecord::for_entity(MutationKind::Create, HARDWARE_ASSETS.name(), asset)
            .invalidate(HARDWARE_ASSETS.lists())
            .write(HARDWARE_ASSETS.detail(asset.id()), asset)
        },
      )
      .await
  }

  /// Update an asset; its detail entry is overwritten with the response and
  /// lists are invalidated.
  pub async fn update(
    &self,
    id: EntityId,
    request: &UpdateHardwareAssetRequest,
  ) -> Result<HardwareAsset, ApiError> {
    let path = format!("{}/{}", PATH, id);
    self
      .ctx
      .mutate(
        || self.ctx.api.put::<HardwareAsset, _>(&path, request),
        |asset| {
          MutationRecord::for_entity(MutationKind::Update, HARDWARE_ASSETS.name(), asset)
            .invalidate(HARDWARE_ASSETS.lists())
            .write(HARDWARE_ASSETS.detail(asset.id()), asset)
        },
      )
      .await
  }

  /// Delete an asset; its detail entry is evicted and lists invalidated.
  pub async fn delete(&self, id: EntityId) -> Result<(), ApiError> {
    let path = format!("{}/{}", PATH, id);
    self
      .ctx
      .mutate(
        || self.ctx.api.delete(&path),
        |_| {
          Ok(
            MutationRecord::new(MutationKind::Delete, HARDWARE_ASSETS.name(), Some(id))
              .evict(HARDWARE_ASSETS.detail(id))
              .invalidate(HARDWARE_ASSETS.lists()),
          )
        },
      )
      .await
  }
}
