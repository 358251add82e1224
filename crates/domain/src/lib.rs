//! Domain layer for the magic-bean effect dispatcher.
//!
//! Pure types only: typed ids, dice formulas, effect descriptors and the
//! roll table. No async, no I/O, no host-engine knowledge — the engine
//! crate reaches the host through its own port traits.

pub mod effects;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use effects::{
    EffectDescriptor, EffectKey, ExtremeRollPolicy, InstantOutcome, ItemRecord, OutcomeSpec,
    RollTable, TimedAction, TimedEffect, VisualParams,
};
pub use error::{ConfigurationError, DomainError};
pub use ids::{ActivationId, SubjectId};
pub use value_objects::{
    DiceFormula, DiceParseError, DiceRollResult, LightProfile, TintColor, TintParseError,
    VisualState,
};
