//! Error type for host port operations.

use magicbeans_domain::SubjectId;

/// A failed call against the host engine.
///
/// Any mutation or query can fail (network, permissions, missing
/// documents). Failures are reported and never retried.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Host rejected or could not complete the operation.
    #[error("Host error in {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    /// The current user may not mutate this document.
    #[error("Permission denied for {operation}")]
    PermissionDenied { operation: &'static str },

    /// No actor document for the subject.
    #[error("Subject not found: {0}")]
    SubjectNotFound(SubjectId),
}

impl HostError {
    /// Create an Unavailable error with operation context.
    pub fn unavailable(operation: &'static str, message: impl ToString) -> Self {
        Self::Unavailable {
            operation,
            message: message.to_string(),
        }
    }

    pub fn permission_denied(operation: &'static str) -> Self {
        Self::PermissionDenied { operation }
    }
}
