//! Structured cache keys with prefix matching.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::api::QueryParams;

/// One element of a cache key tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
  Name(String),
  Id(u64),
  Params(QueryParams),
  /// An absent or empty parameter set. An unfiltered query maps here
  /// however it was spelled.
  Empty,
}

impl fmt::Display for KeyPart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KeyPart::Name(s) => f.write_str(s),
      KeyPart::Id(id) => write!(f, "{}", id),
      KeyPart::Params(p) => write!(f, "{}", p),
      KeyPart::Empty => f.write_str("-"),
    }
  }
}

impl From<&str> for KeyPart {
  fn from(s: &str) -> Self {
    KeyPart::Name(s.to_string())
  }
}

impl From<String> for KeyPart {
  fn from(s: String) -> Self {
    KeyPart::Name(s)
  }
}

impl From<u64> for KeyPart {
  fn from(id: u64) -> Self {
    KeyPart::Id(id)
  }
}

impl From<QueryParams> for KeyPart {
  fn from(p: QueryParams) -> Self {
    if p.is_empty() {
      KeyPart::Empty
    } else {
      KeyPart::Params(p)
    }
  }
}

impl From<Option<QueryParams>> for KeyPart {
  fn from(p: Option<QueryParams>) -> Self {
    p.map(KeyPart::from).unwrap_or(KeyPart::Empty)
  }
}

/// Ordered tuple identifying a cacheable query: resource name, operation
/// qualifier, then parameters or an id.
///
/// A key is also a prefix: `["hardware-assets", "list"]` matches every list
/// variant stored beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
  pub fn new(root: impl Into<KeyPart>) -> Self {
    Self(vec![root.into()])
  }

  /// Append a part, returning the extended key.
  pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
    self.0.push(part.into());
    self
  }

  pub fn parts(&self) -> &[KeyPart] {
    &self.0
  }

  /// True when every part of `prefix` matches the leading parts of `self`.
  /// A key is a prefix of itself.
  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }

  /// Stable, fixed-length identifier for log fields.
  pub fn fingerprint(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("[")?;
    for (i, part) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }
      write!(f, "{}", part)?;
    }
    f.write_str("]")
  }
}
