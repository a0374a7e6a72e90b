//! Query parameter sets shared by the API client and cache keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamValue {
  Bool(bool),
  Int(i64),
  Text(String),
}

impl fmt::Display for ParamValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParamValue::Bool(b) => write!(f, "{}", b),
      ParamValue::Int(i) => write!(f, "{}", i),
      ParamValue::Text(s) => f.write_str(s),
    }
  }
}

impl From<bool> for ParamValue {
  fn from(v: bool) -> Self {
    ParamValue::Bool(v)
  }
}

impl From<i64> for ParamValue {
  fn from(v: i64) -> Self {
    ParamValue::Int(v)
  }
}

impl From<u32> for ParamValue {
  fn from(v: u32) -> Self {
    ParamValue::Int(i64::from(v))
  }
}

impl From<u64> for ParamValue {
  fn from(v: u64) -> Self {
    // Ids and page numbers never approach i64::MAX.
    ParamValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
  }
}

impl From<&str> for ParamValue {
  fn from(v: &str) -> Self {
    ParamValue::Text(v.to_string())
  }
}

impl From<String> for ParamValue {
  fn from(v: String) -> Self {
    ParamValue::Text(v)
  }
}

/// Unordered set of filter/sort/pagination fields.
///
/// Backed by an ordered map so two sets holding the same pairs compare and
/// hash equal no matter the order they were built in. Absent values are never
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

/// Error building a parameter set from a serializable query struct.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
  #[error("query parameters must serialize to an object")]
  NotAnObject,
  #[error("query parameter `{0}` is not a scalar")]
  NotScalar(String),
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl QueryParams {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add or replace a parameter.
  pub fn set(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
    self.0.insert(key.into(), value.into());
    self
  }

  /// Add a parameter only when a value is present.
  pub fn set_opt<V: Into<ParamValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
    match value {
      Some(v) => self.set(key, v),
      None => self,
    }
  }

  /// Build from any struct serializing to a flat JSON object. `null` fields
  /// are dropped; non-integer numbers are kept as text.
  pub fn from_serialize<T: Serialize>(query: &T) -> Result<Self, ParamsError> {
    let Value::Object(map) = serde_json::to_value(query)? else {
      return Err(ParamsError::NotAnObject);
    };

    let mut params = Self::new();
    for (key, value) in map {
      let value = match value {
        Value::Null => continue,
        Value::Bool(b) => ParamValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
          Some(i) => ParamValue::Int(i),
          None => ParamValue::Text(n.to_string()),
        },
        Value::String(s) => ParamValue::Text(s),
        Value::Array(_) | Value::Object(_) => return Err(ParamsError::NotScalar(key)),
      };
      params.0.insert(key, value);
    }
    Ok(params)
  }

  pub fn get(&self, key: &str) -> Option<&ParamValue> {
    self.0.get(key)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Pairs in key order, ready for a query string.
  pub fn pairs(&self) -> impl Iterator<Item = (&str, String)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.to_string()))
  }
}

impl fmt::Display for QueryParams {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (i, (k, v)) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(",")?;
      }
      write!(f, "{}={}", k, v)?;
    }
    f.write_str("}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::hash_map::DefaultHasher;
  use std::hash::{Hash, Hasher};

  fn hash_of(p: &QueryParams) -> u64 {
    let mut h = DefaultHasher::new();
    p.hash(&mut h);
    h.finish()
  }

  #[test]
  fn insertion_order_does_not_matter() {
    let a = QueryParams::new()
      .set("page", 1i64)
      .set("limit", 25i64)
      .set("status", "deployed");
    let b = QueryParams::new()
      .set("status", "deployed")
      .set("page", 1i64)
      .set("limit", 25i64);

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
  }

  #[test]
  fn from_serialize_skips_nulls() {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Q {
      page: Option<u32>,
      sort_by: Option<String>,
      is_active: Option<bool>,
    }

    let params = QueryParams::from_serialize(&Q {
      page: Some(2),
      sort_by: None,
      is_active: Some(false),
    })
    .unwrap();

    assert_eq!(params.len(), 2);
    assert_eq!(params.get("page"), Some(&ParamValue::Int(2)));
    assert_eq!(params.get("isActive"), Some(&ParamValue::Bool(false)));
    assert!(params.get("sortBy").is_none());
  }

  #[test]
  fn nested_values_are_rejected() {
    let err = QueryParams::from_serialize(&serde_json::json!({ "tags": ["a"] })).unwrap_err();
    assert!(matches!(err, ParamsError::NotScalar(k) if k == "tags"));
  }

  #[test]
  fn pairs_are_sorted_by_key() {
    let params = QueryParams::new().set("search", "dell").set("limit", 10i64);
    let pairs: Vec<_> = params.pairs().collect();
    assert_eq!(
      pairs,
      vec![("limit", "10".to_string()), ("search", "dell".to_string())]
    );
  }
}
