//! Port traits for the host-engine boundary.
//!
//! These are the ONLY abstractions in the engine. The original add-on
//! reached the host through deep optional-chained object traversal
//! (actor → token → document → texture); here the dispatcher sees nothing
//! but these narrow read/write operations, so host object-model changes
//! stay out of the core.

mod error;
mod host;

pub use error::HostError;
pub use host::{Anchor, DicePort, NoticeLevel, PresentationPort, SubjectPort, VisualEffectsPort};

#[cfg(test)]
pub use host::{
    MockDicePort, MockPresentationPort, MockSubjectPort, MockVisualEffectsPort,
};
