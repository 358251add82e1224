//! Unified error types for the domain layer.

use thiserror::Error;

/// Unified error type for domain operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Roll table is malformed (gap, overlap, out-of-domain bound)
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// A malformed roll table, detectable only by static validation at
/// table-definition time, never at runtime.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The table has no buckets at all.
    #[error("Roll table is empty")]
    EmptyTable,

    /// A bucket's bounds are inverted or outside 1..=100.
    #[error("Invalid range {start}..={end} for effect '{key}'")]
    InvalidRange { key: String, start: u8, end: u8 },

    /// Uncovered rolls between two adjacent buckets.
    #[error("Gap in roll table: rolls {from}..={to} match no effect")]
    Gap { from: u8, to: u8 },

    /// Two buckets claim the same roll.
    #[error("Overlapping ranges in roll table at roll {at} (effects '{first}' and '{second}')")]
    Overlap {
        at: u8,
        first: String,
        second: String,
    },

    /// Two buckets reuse the same effect key.
    #[error("Duplicate effect key '{0}' in roll table")]
    DuplicateKey(String),

    /// A timed effect was defined with a zero duration.
    #[error("Effect '{0}' has zero duration")]
    ZeroDuration(String),
}
