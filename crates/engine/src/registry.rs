//! Per-subject bookkeeping for active timed effects.
//!
//! One registry instance is owned by the dispatcher and passed by
//! reference; there is no ambient global state. Each entry is the
//! "active marker" for one (subject, effect key) pair plus the snapshot
//! needed to revert. Atomic removal via [`EffectRegistry::take`] is the
//! idempotence guard between the revert timer and an external deletion
//! signal: whichever fires second gets `None` and does nothing.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use magicbeans_domain::{EffectKey, SubjectId, TimedAction, VisualParams, VisualState};

/// Subject attributes captured at apply time, restored on revert, and
/// discarded afterwards. Never persisted beyond one effect lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSnapshot {
    pub visual: VisualState,
    pub strength: i32,
}

/// Marker + revert data for one in-progress effect.
#[derive(Debug, Clone)]
pub struct ActiveEffect {
    pub subject: SubjectId,
    pub key: EffectKey,
    /// Effect display name, kept for the end-of-effect message.
    pub name: &'static str,
    pub action: TimedAction,
    /// Visual parameters the effect applied. Revert writes back only the
    /// fields set here, so overlapping effects on the same subject never
    /// clobber each other's state.
    pub visual: VisualParams,
    /// `None` until the snapshot is armed; pre-mutation failures roll the
    /// pending marker back before anything is captured.
    pub snapshot: Option<EffectSnapshot>,
    pub applied_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Registry of active effects keyed by (subject, effect key).
///
/// At most one entry per pair; contenders are rejected, never queued.
/// Distinct keys on the same subject are independent and may overlap.
#[derive(Default)]
pub struct EffectRegistry {
    entries: DashMap<(SubjectId, EffectKey), ActiveEffect>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim the (subject, key) pair.
    ///
    /// Returns `false` when an effect with this key is already active on
    /// the subject — the sole guard against double application.
    pub fn try_begin(&self, entry: ActiveEffect) -> bool {
        let slot = (entry.subject, entry.key);
        match self.entries.entry(slot) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        }
    }

    /// Attach the captured snapshot to a pending marker.
    pub fn arm(&self, subject: SubjectId, key: EffectKey, snapshot: EffectSnapshot) {
        if let Some(mut entry) = self.entries.get_mut(&(subject, key)) {
            entry.snapshot = Some(snapshot);
        }
    }

    /// Atomically remove and return the entry. `None` means the pair is
    /// idle and the caller must treat the revert as a no-op.
    pub fn take(&self, subject: SubjectId, key: EffectKey) -> Option<ActiveEffect> {
        self.entries.remove(&(subject, key)).map(|(_, entry)| entry)
    }

    /// Drop a pending marker after a pre-mutation failure.
    pub fn abort(&self, subject: SubjectId, key: EffectKey) {
        self.entries.remove(&(subject, key));
    }

    pub fn is_active(&self, subject: SubjectId, key: EffectKey) -> bool {
        self.entries.contains_key(&(subject, key))
    }

    /// Keys of all effects currently active on a subject.
    pub fn active_keys(&self, subject: SubjectId) -> Vec<EffectKey> {
        self.entries
            .iter()
            .filter(|entry| entry.key().0 == subject)
            .map(|entry| entry.key().1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(subject: SubjectId, key: &'static str) -> ActiveEffect {
        let now = Utc::now();
        ActiveEffect {
            subject,
            key: EffectKey::new(key),
            name: key,
            action: TimedAction::TintSkin,
            visual: VisualParams::default(),
            snapshot: None,
            applied_at: now,
            ends_at: now + Duration::seconds(60),
        }
    }

    #[test]
    fn second_begin_for_same_pair_is_rejected() {
        let registry = EffectRegistry::new();
        let subject = SubjectId::new();
        assert!(registry.try_begin(entry(subject, "levitar")));
        assert!(!registry.try_begin(entry(subject, "levitar")));
        assert!(registry.is_active(subject, EffectKey::new("levitar")));
    }

    #[test]
    fn distinct_keys_and_subjects_are_independent() {
        let registry = EffectRegistry::new();
        let a = SubjectId::new();
        let b = SubjectId::new();
        assert!(registry.try_begin(entry(a, "levitar")));
        assert!(registry.try_begin(entry(a, "petrificado")));
        assert!(registry.try_begin(entry(b, "levitar")));
        let mut keys = registry.active_keys(a);
        keys.sort_by_key(|k| k.as_str());
        assert_eq!(
            keys,
            vec![EffectKey::new("levitar"), EffectKey::new("petrificado")]
        );
    }

    #[test]
    fn take_is_atomic_and_idempotent() {
        let registry = EffectRegistry::new();
        let subject = SubjectId::new();
        registry.try_begin(entry(subject, "levitar"));
        assert!(registry.take(subject, EffectKey::new("levitar")).is_some());
        assert!(registry.take(subject, EffectKey::new("levitar")).is_none());
        assert!(!registry.is_active(subject, EffectKey::new("levitar")));
    }

    #[test]
    fn arm_attaches_the_snapshot() {
        let registry = EffectRegistry::new();
        let subject = SubjectId::new();
        registry.try_begin(entry(subject, "levitar"));
        registry.arm(
            subject,
            EffectKey::new("levitar"),
            EffectSnapshot {
                visual: VisualState::neutral(),
                strength: 10,
            },
        );
        let taken = registry
            .take(subject, EffectKey::new("levitar"))
            .and_then(|e| e.snapshot);
        assert_eq!(taken.map(|s| s.strength), Some(10));
    }
}
