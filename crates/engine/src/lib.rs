//! Magic-bean effect dispatcher engine.
//!
//! Rolls 1d100 when a flagged consumable is used, selects an effect from
//! the roll table, and runs it either as an instant outcome or through the
//! apply → hold → auto-revert lifecycle. The host game engine is reached
//! only through the port traits in [`infrastructure::ports`].

pub mod infrastructure;
pub mod registry;
pub mod use_cases;


pub use registry::{ActiveEffect, EffectRegistry, EffectSnapshot};
pub use use_cases::{
    ActivateBean, ActivationOutcome, DispatchError, ItemUseEvent, ItemUseHook, TimedEffectRunner,
    BEAN_MACRO,
};
