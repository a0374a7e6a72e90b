//! Cache effects of a completed write.

use serde::Serialize;
use serde_json::Value;

use super::key::QueryKey;
use crate::api::types::{Entity, EntityId};
use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
}

/// Describes a write against one entity and the cache keys it touches once
/// the server has confirmed it.
///
/// Applied in order: invalidations, then evictions, then writes, so a value
/// written here survives an invalidation of its own prefix.
#[derive(Debug, Clone)]
pub struct MutationRecord {
  pub kind: MutationKind,
  pub entity: &'static str,
  pub id: Option<EntityId>,
  pub invalidate: Vec<QueryKey>,
  pub evict: Vec<QueryKey>,
  pub write: Vec<(QueryKey, Value)>,
}

impl MutationRecord {
  pub fn new(kind: MutationKind, entity: &'static str, id: Option<EntityId>) -> Self {
    Self {
      kind,
      entity,
      id,
      invalidate: Vec::new(),
      evict: Vec::new(),
      write: Vec::new(),
    }
  }

  /// Record for a write the server answered with `value`.
  pub fn for_entity<E: Entity>(kind: MutationKind, entity: &'static str, value: &E) -> Self {
    Self::new(kind, entity, Some(value.id()))
  }

  /// Mark every entry under `prefix` stale.
  pub fn invalidate(mut self, prefix: QueryKey) -> Self {
    self.invalidate.push(prefix);
    self
  }

  /// Remove `key` outright.
  pub fn evict(mut self, key: QueryKey) -> Self {
    self.evict.push(key);
    self
  }

  /// Seed `key` with the server's response.
  pub fn write<T: Serialize>(mut self, key: QueryKey, value: &T) -> Result<Self, ApiError> {
    let value = serde_json::to_value(value).map_err(ApiError::invalid_response)?;
    self.write.push((key, value));
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::SoftwarePublisher;

  #[test]
  fn entity_record_takes_id_from_response() {
    let publisher = SoftwarePublisher {
      id: 12,
      name: "Contoso".into(),
      website: None,
      support_contact: None,
    };
    let record = MutationRecord::for_entity(MutationKind::Create, "software-publishers", &publisher)
      .invalidate(QueryKey::new("software-publishers"));

    assert_eq!(record.id, Some(12));
    assert_eq!(record.invalidate, vec![QueryKey::new("software-publishers")]);
    assert!(record.write.is_empty());
  }
}
