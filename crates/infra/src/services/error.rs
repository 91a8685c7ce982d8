use thiserror::Error;

use storefront_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a store operation, classified for the transport layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    /// Invalid lifecycle transition or stale write.
    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    /// A bounded retry loop ran out of attempts.
    #[error("{operation} gave up after {attempts} attempts")]
    Exhausted {
        operation: &'static str,
        attempts: u32,
    },

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Exhausted { .. } => "retries_exhausted",
            ServiceError::Store(_) => "store_error",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvariantViolation(msg) => {
                ServiceError::Validation(msg)
            }
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // Duplicate names/skus are a field problem from the caller's side.
            StoreError::UniqueViolation { field, value, .. } => {
                ServiceError::Validation(format!("{field} '{value}' is already in use"))
            }
            StoreError::VersionConflict(msg) => ServiceError::Conflict(msg),
            StoreError::NotFound { collection, id } => {
                ServiceError::NotFound(format!("{collection} document {id}"))
            }
            other => ServiceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn domain_errors_map_to_service_taxonomy() {
        let cases = [
            (DomainError::validation("x"), "validation_error"),
            (DomainError::invariant("x"), "validation_error"),
            (DomainError::invalid_id("x"), "validation_error"),
            (DomainError::not_found("x"), "not_found"),
            (DomainError::conflict("x"), "conflict"),
        ];
        for (err, code) in cases {
            assert_eq!(ServiceError::from(err).code(), code);
        }
    }

    #[test]
    fn store_errors_map_to_service_taxonomy() {
        let unique = ServiceError::from(StoreError::UniqueViolation {
            collection: "products",
            field: "sku".to_string(),
            value: "ABC".to_string(),
        });
        assert_eq!(unique.code(), "validation_error");
        assert_eq!(unique.to_string(), "sku 'ABC' is already in use");

        let stale = ServiceError::from(StoreError::VersionConflict("stale".to_string()));
        assert_eq!(stale.code(), "conflict");

        let missing = ServiceError::from(StoreError::NotFound {
            collection: "orders",
            id: Uuid::nil(),
        });
        assert_eq!(missing.code(), "not_found");

        let backend = ServiceError::from(StoreError::Backend("down".to_string()));
        assert_eq!(backend.code(), "store_error");
    }
}
