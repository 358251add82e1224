//! Dispatcher use cases: activation, the timed-effect lifecycle, and the
//! item-use hook entry point.

mod activate;
mod hook;
mod lifecycle;

pub use activate::{ActivateBean, ActivationOutcome};
pub use hook::{ItemUseEvent, ItemUseHook, BEAN_MACRO};
pub use lifecycle::TimedEffectRunner;

use magicbeans_domain::{ConfigurationError, DomainError, EffectKey, SubjectId};

use crate::infrastructure::ports::HostError;

/// Errors surfaced by one activation.
///
/// All of these end up as user-visible notices; none crash the host and
/// none are retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Malformed range table; detected at startup, never mid-activation.
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Duplicate activation attempt. A warning, not fatal.
    #[error("Effect '{key}' is already active on subject {subject}")]
    AlreadyActive { subject: SubjectId, key: EffectKey },

    /// A host mutation or query failed. The activation aborts at that
    /// point; already-applied mutations are not rolled back.
    #[error(transparent)]
    Host(#[from] HostError),

    /// No valid token anchor for the subject; aborted before any mutation.
    #[error("No visual anchor for subject {0}")]
    MissingSubjectContext(SubjectId),
}
