//! Persisted document trait and optimistic concurrency expectations.

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};

/// A value that must be unique within its collection (e.g. a product's sku).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// A root entity stored as a single document.
///
/// Implementations stay pure: the store decides how the document is laid out
/// and only relies on the id, the revision counter and the declared unique keys.
pub trait Document: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Strongly-typed document identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync + Into<Uuid>;

    /// Collection name (`categories`, `products`, `orders`).
    const COLLECTION: &'static str;

    fn id(&self) -> Self::Id;

    /// Revision counter. `0` before the first persist, `1` after it.
    fn version(&self) -> u64;

    /// Called by the store after a successful write.
    fn set_version(&mut self, version: u64);

    /// Values that must be unique across the collection.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }
}

/// Optimistic concurrency expectation for a write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the stored document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
