//! Effect descriptors - the static definition of what each roll outcome does.
//!
//! Descriptors are immutable data fixed at table-construction time. Timed
//! behaviors are a closed enum (`TimedAction`), never code built from
//! runtime strings: the engine dispatches on the variant and owns the
//! start/end mutations for each.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::value_objects::{DiceFormula, LightProfile, TintColor};

/// Unique, stable identifier of one effect definition.
///
/// Doubles as the per-subject marker key while the effect is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectKey(&'static str);

impl EffectKey {
    pub const fn new(key: &'static str) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EffectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Static definition of one roll outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDescriptor {
    pub key: EffectKey,
    /// Display name used in chat messages and notices.
    pub name: &'static str,
    pub outcome: OutcomeSpec,
}

impl EffectDescriptor {
    pub fn instant(key: &'static str, name: &'static str, outcome: InstantOutcome) -> Self {
        Self {
            key: EffectKey::new(key),
            name,
            outcome: OutcomeSpec::Instant(outcome),
        }
    }

    pub fn timed(key: &'static str, name: &'static str, effect: TimedEffect) -> Self {
        Self {
            key: EffectKey::new(key),
            name,
            outcome: OutcomeSpec::Timed(effect),
        }
    }
}

/// Whether an outcome is one-shot or runs the apply/hold/revert lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeSpec {
    /// One mutation plus one message; no marker, repeatable every activation.
    Instant(InstantOutcome),
    /// Apply, hold for the duration, auto-revert. Guarded per (subject, key).
    Timed(TimedEffect),
}

/// One-shot outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum InstantOutcome {
    /// Roll 1: hit points forced down to 1 if currently above 1.
    ForceHpToOne,
    /// Restore hit points by the rolled amount, clamped to max HP.
    Heal(DiceFormula),
    /// Remove hit points by the rolled amount, clamped to 0.
    Damage(DiceFormula),
    /// Remove hit points from the activation's targeted subject; when no
    /// target is selected the damage dissipates with a notice only.
    DamageTarget(DiceFormula),
    /// Create an embedded item on the subject.
    GrantItem(ItemRecord),
    /// Roll 100: heal to max; if already at max, grant the inspiration flag.
    Inspiration,
}

/// A timed effect definition: duration, visual parameters, and the named
/// start/end behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEffect {
    /// Positive; validated at table construction.
    pub duration_secs: u32,
    pub visual: VisualParams,
    pub action: TimedAction,
}

/// Optional visual parameters applied while a timed effect holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisualParams {
    pub tint: Option<TintColor>,
    pub light: Option<LightProfile>,
    /// Particle effect name for the optional visual-effects plugin.
    pub overlay: Option<&'static str>,
}

impl VisualParams {
    pub fn is_empty(&self) -> bool {
        self.tint.is_none() && self.light.is_none() && self.overlay.is_none()
    }
}

/// Named timed behaviors. The engine owns the start and end mutation of
/// each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedAction {
    /// Recolor the token texture; pure visual, revert restores the tint.
    TintSkin,
    /// Emit light from the token for the duration.
    Glow,
    /// Raise the token to the given elevation, back to the ground on revert.
    Levitate { elevation: i32 },
    /// Toggle the "petrified" status condition for the duration.
    Petrify,
    /// Temporary strength bonus, removed on revert.
    BoostStrength { delta: i32 },
}

/// Item-record shape shared with the build-time compendium format and the
/// `GrantItem` outcome. Records in the compendium database get a random
/// unique identifier assigned at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub item_type: String,
    pub description: String,
}

impl ItemRecord {
    pub fn new(
        name: impl Into<String>,
        item_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Self::new_id(),
            name: name.into(),
            item_type: item_type.into(),
            description: description.into(),
        }
    }

    /// Random unique identifier in the host's 16-character alphanumeric shape.
    pub fn new_id() -> String {
        let hex = Uuid::new_v4().simple().to_string();
        hex[..16].to_string()
    }
}
