//! The roll table: contiguous inclusive ranges over 1..=100, each mapped
//! to one effect descriptor.
//!
//! Validation happens once, at construction. A malformed table (gap,
//! overlap, inverted bounds, duplicate key, zero duration) is a
//! `ConfigurationError` and never reaches `select`.

use std::collections::HashSet;

use crate::error::{ConfigurationError, DomainError};
use crate::value_objects::{DiceFormula, LightProfile, TintColor};

use super::descriptor::{
    EffectDescriptor, InstantOutcome, ItemRecord, OutcomeSpec, TimedAction, TimedEffect,
    VisualParams,
};

/// One contiguous inclusive range of rolls mapped to a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct RollBucket {
    pub start: u8,
    pub end: u8,
    pub descriptor: EffectDescriptor,
}

impl RollBucket {
    pub fn new(start: u8, end: u8, descriptor: EffectDescriptor) -> Self {
        Self {
            start,
            end,
            descriptor,
        }
    }

    fn contains(&self, roll: u8) -> bool {
        self.start <= roll && roll <= self.end
    }
}

/// Whether rolls of 1 and 100 get dedicated singleton buckets.
///
/// The source material is inconsistent here, so the choice is an explicit
/// configuration value rather than something inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeRollPolicy {
    /// 1 = fatal drain, 100 = inspiration (the richest revision).
    #[default]
    Dedicated,
    /// 1 folds into the adjacent skin-tint bucket, 100 into the adjacent
    /// greater-heal bucket (the earlier revisions).
    Folded,
}

/// Validated partition of 1..=100 into effect buckets.
#[derive(Debug, Clone)]
pub struct RollTable {
    buckets: Vec<RollBucket>,
}

impl RollTable {
    /// Build a table, rejecting any misconfiguration.
    ///
    /// Buckets may be given in any order; they are sorted by range start.
    pub fn new(mut buckets: Vec<RollBucket>) -> Result<Self, ConfigurationError> {
        if buckets.is_empty() {
            return Err(ConfigurationError::EmptyTable);
        }
        buckets.sort_by_key(|b| b.start);

        let mut keys = HashSet::new();
        for bucket in &buckets {
            if bucket.start == 0 || bucket.end > 100 || bucket.start > bucket.end {
                return Err(ConfigurationError::InvalidRange {
                    key: bucket.descriptor.key.to_string(),
                    start: bucket.start,
                    end: bucket.end,
                });
            }
            if !keys.insert(bucket.descriptor.key) {
                return Err(ConfigurationError::DuplicateKey(
                    bucket.descriptor.key.to_string(),
                ));
            }
            if let OutcomeSpec::Timed(timed) = &bucket.descriptor.outcome {
                if timed.duration_secs == 0 {
                    return Err(ConfigurationError::ZeroDuration(
                        bucket.descriptor.key.to_string(),
                    ));
                }
            }
        }

        if buckets[0].start > 1 {
            return Err(ConfigurationError::Gap {
                from: 1,
                to: buckets[0].start - 1,
            });
        }
        for pair in buckets.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start <= prev.end {
                return Err(ConfigurationError::Overlap {
                    at: next.start,
                    first: prev.descriptor.key.to_string(),
                    second: next.descriptor.key.to_string(),
                });
            }
            if next.start > prev.end + 1 {
                return Err(ConfigurationError::Gap {
                    from: prev.end + 1,
                    to: next.start - 1,
                });
            }
        }
        let last = &buckets[buckets.len() - 1];
        if last.end < 100 {
            return Err(ConfigurationError::Gap {
                from: last.end + 1,
                to: 100,
            });
        }

        Ok(Self { buckets })
    }

    /// Select the descriptor for a roll.
    ///
    /// Total and deterministic for rolls in 1..=100; each boundary value
    /// belongs to the lower range by construction (ranges are inclusive
    /// and non-overlapping).
    pub fn select(&self, roll: u8) -> Result<&EffectDescriptor, DomainError> {
        if roll == 0 || roll > 100 {
            return Err(DomainError::validation(format!(
                "Roll {} outside 1..=100",
                roll
            )));
        }
        // Validated partition: exactly one bucket matches.
        self.buckets
            .iter()
            .find(|b| b.contains(roll))
            .map(|b| &b.descriptor)
            .ok_or_else(|| DomainError::validation(format!("No bucket for roll {}", roll)))
    }

    pub fn buckets(&self) -> &[RollBucket] {
        &self.buckets
    }

    /// The magic-bean table.
    ///
    /// Under `Dedicated`, 1 and 100 are singleton buckets (fatal drain and
    /// inspiration); under `Folded`, 1 joins the skin-tint bucket and 100
    /// the greater-heal bucket.
    pub fn standard(policy: ExtremeRollPolicy) -> Result<Self, ConfigurationError> {
        let minor_heal = DiceFormula {
            dice_count: 2,
            die_size: 8,
            modifier: 2,
        };
        let major_heal = DiceFormula {
            dice_count: 4,
            die_size: 8,
            modifier: 4,
        };
        let skin_tint = |start: u8, end: u8| {
            RollBucket::new(
                start,
                end,
                EffectDescriptor::timed(
                    "piel-cromatica",
                    "Piel cromática",
                    TimedEffect {
                        duration_secs: 60,
                        visual: VisualParams {
                            tint: Some(TintColor::new(0x3c, 0xb3, 0x71)),
                            light: None,
                            overlay: None,
                        },
                        action: TimedAction::TintSkin,
                    },
                ),
            )
        };

        // Mid-table buckets are the same under both policies.
        let mut buckets = vec![
            RollBucket::new(
                11,
                20,
                EffectDescriptor::instant("curacion", "Curación", InstantOutcome::Heal(minor_heal)),
            ),
            RollBucket::new(
                21,
                30,
                EffectDescriptor::instant(
                    "dano-arcano",
                    "Daño arcano",
                    InstantOutcome::Damage(DiceFormula {
                        dice_count: 2,
                        die_size: 6,
                        modifier: 0,
                    }),
                ),
            ),
            RollBucket::new(
                31,
                40,
                EffectDescriptor::timed(
                    "brillo-feerico",
                    "Brillo feérico",
                    TimedEffect {
                        duration_secs: 60,
                        visual: VisualParams {
                            tint: None,
                            light: Some(LightProfile::glow(
                                20.0,
                                10.0,
                                TintColor::new(0xff, 0xd7, 0x00),
                            )),
                            overlay: Some("fairy-glow"),
                        },
                        action: TimedAction::Glow,
                    },
                ),
            ),
            RollBucket::new(
                41,
                50,
                EffectDescriptor::timed(
                    "levitar",
                    "Levitar",
                    TimedEffect {
                        duration_secs: 60,
                        visual: VisualParams::default(),
                        action: TimedAction::Levitate { elevation: 10 },
                    },
                ),
            ),
            RollBucket::new(
                51,
                60,
                EffectDescriptor::timed(
                    "fuerza-salvaje",
                    "Fuerza salvaje",
                    TimedEffect {
                        duration_secs: 120,
                        visual: VisualParams::default(),
                        action: TimedAction::BoostStrength { delta: 2 },
                    },
                ),
            ),
            RollBucket::new(
                61,
                70,
                EffectDescriptor::timed(
                    "petrificado",
                    "Petrificado",
                    TimedEffect {
                        duration_secs: 30,
                        visual: VisualParams {
                            tint: Some(TintColor::new(0x80, 0x80, 0x80)),
                            light: None,
                            overlay: None,
                        },
                        action: TimedAction::Petrify,
                    },
                ),
            ),
            RollBucket::new(
                71,
                80,
                EffectDescriptor::instant(
                    "dano-arcano-mayor",
                    "Daño arcano mayor",
                    InstantOutcome::DamageTarget(DiceFormula {
                        dice_count: 3,
                        die_size: 6,
                        modifier: 0,
                    }),
                ),
            ),
            RollBucket::new(
                81,
                90,
                EffectDescriptor::instant(
                    "bendicion-arcana",
                    "Bendición arcana",
                    InstantOutcome::GrantItem(ItemRecord::new(
                        "Bendición Arcana",
                        "feat",
                        "Beneficio mágico misterioso.",
                    )),
                ),
            ),
        ];

        match policy {
            ExtremeRollPolicy::Dedicated => {
                buckets.push(RollBucket::new(
                    1,
                    1,
                    EffectDescriptor::instant(
                        "drenaje-fatal",
                        "Drenaje fatal",
                        InstantOutcome::ForceHpToOne,
                    ),
                ));
                buckets.push(skin_tint(2, 10));
                buckets.push(RollBucket::new(
                    91,
                    99,
                    EffectDescriptor::instant("curacion-mayor", "Curación mayor", InstantOutcome::Heal(major_heal)),
                ));
                buckets.push(RollBucket::new(
                    100,
                    100,
                    EffectDescriptor::instant(
                        "inspiracion",
                        "Inspiración",
                        InstantOutcome::Inspiration,
                    ),
                ));
            }
            ExtremeRollPolicy::Folded => {
                buckets.push(skin_tint(1, 10));
                buckets.push(RollBucket::new(
                    91,
                    100,
                    EffectDescriptor::instant("curacion-mayor", "Curación mayor", InstantOutcome::Heal(major_heal)),
                ));
            }
        }

        Self::new(buckets)
    }
}
