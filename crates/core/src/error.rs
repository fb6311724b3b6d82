//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, stock shortfalls). None of these represent transient
/// conditions, so callers surface them rather than retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, broken conservation).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced lot/process/item does not exist or is soft-deleted.
    #[error("not found: {0}")]
    NotFound(String),

    /// FIFO allocation cannot satisfy the requested quantity.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: f64, available: f64 },

    /// An adjustment or resolution would break amount/currency bounds
    /// against its origin item, or the production graph is cyclic.
    #[error("consistency violation: {0}")]
    Consistency(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn insufficient_stock(requested: f64, available: f64) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
