//! Effect definitions: descriptors, outcomes, and the roll table.

mod descriptor;
mod table;

pub use descriptor::{
    EffectDescriptor, EffectKey, InstantOutcome, ItemRecord, OutcomeSpec, TimedAction,
    TimedEffect, VisualParams,
};
pub use table::{ExtremeRollPolicy, RollBucket, RollTable};
