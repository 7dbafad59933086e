//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// uniqueness, missing records). Storage failures belong to the infra layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (empty sku, non-positive weight, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A tier has no per-pound rate configured, or could not be parsed.
    #[error("unknown tier: {0}")]
    UnknownTier(String),

    /// A record with this sku already exists in the table.
    #[error("duplicate sku: {0}")]
    DuplicateSku(String),

    /// The referenced sku does not exist.
    #[error("sku not found: {0}")]
    NotFound(String),

    /// A bundle could not be assembled (missing or already sold constituents).
    #[error("bundle rejected: {0}")]
    BundleValidation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_tier(tier: impl Into<String>) -> Self {
        Self::UnknownTier(tier.into())
    }

    pub fn duplicate_sku(sku: impl Into<String>) -> Self {
        Self::DuplicateSku(sku.into())
    }

    pub fn not_found(sku: impl Into<String>) -> Self {
        Self::NotFound(sku.into())
    }

    pub fn bundle(msg: impl Into<String>) -> Self {
        Self::BundleValidation(msg.into())
    }
}
