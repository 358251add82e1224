//! Timed-effect lifecycle: apply → hold → auto-revert.
//!
//! State machine per (subject, effect key): Idle → Active → Idle. The
//! registry entry is the Active marker; within one activation the steps
//! run strictly in order apply-mutation → start action → timer schedule,
//! and the scheduled revert runs as an independent later task.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use magicbeans_domain::{EffectDescriptor, EffectKey, SubjectId, TimedAction, TimedEffect};

use crate::infrastructure::ports::{
    Anchor, HostError, NoticeLevel, PresentationPort, SubjectPort, VisualEffectsPort,
};
use crate::registry::{ActiveEffect, EffectRegistry, EffectSnapshot};

use super::DispatchError;

/// Applies timed effects and reverts them on timer expiry or on an
/// external deletion signal from the host.
pub struct TimedEffectRunner {
    registry: Arc<EffectRegistry>,
    subjects: Arc<dyn SubjectPort>,
    presentation: Arc<dyn PresentationPort>,
    vfx: Arc<dyn VisualEffectsPort>,
}

impl TimedEffectRunner {
    pub fn new(
        registry: Arc<EffectRegistry>,
        subjects: Arc<dyn SubjectPort>,
        presentation: Arc<dyn PresentationPort>,
        vfx: Arc<dyn VisualEffectsPort>,
    ) -> Self {
        Self {
            registry,
            subjects,
            presentation,
            vfx,
        }
    }

    pub fn registry(&self) -> &Arc<EffectRegistry> {
        &self.registry
    }

    /// Run the Idle → Active transition and schedule the auto-revert.
    ///
    /// Rejected with zero side effects when the (subject, key) marker is
    /// already set. A missing token anchor aborts before any mutation.
    /// A host failure after mutations began propagates with the marker
    /// intentionally left set: the effect may be stuck active, which is
    /// surfaced to the user rather than silently rolled back.
    #[tracing::instrument(skip(self, descriptor, timed), fields(key = %descriptor.key))]
    pub async fn apply(
        &self,
        subject: SubjectId,
        descriptor: &EffectDescriptor,
        timed: &TimedEffect,
    ) -> Result<(), DispatchError> {
        let key = descriptor.key;
        let now = Utc::now();
        let claimed = self.registry.try_begin(ActiveEffect {
            subject,
            key,
            name: descriptor.name,
            action: timed.action,
            visual: timed.visual.clone(),
            snapshot: None,
            applied_at: now,
            ends_at: now + chrono::Duration::seconds(i64::from(timed.duration_secs)),
        });
        if !claimed {
            tracing::warn!(subject = %subject, "Duplicate activation rejected");
            self.notice(
                NoticeLevel::Warning,
                &format!("«{}» ya está activo; el frijol no tiene efecto.", descriptor.name),
            )
            .await;
            return Err(DispatchError::AlreadyActive { subject, key });
        }

        // Everything up to the first mutation rolls the pending marker
        // back on failure; nothing has been applied yet.
        let anchor = match self.subjects.anchor(subject).await {
            Ok(Some(anchor)) => anchor,
            Ok(None) => {
                self.registry.abort(subject, key);
                self.notice(
                    NoticeLevel::Error,
                    "No se encontró un token válido para el sujeto.",
                )
                .await;
                return Err(DispatchError::MissingSubjectContext(subject));
            }
            Err(err) => {
                self.registry.abort(subject, key);
                return Err(err.into());
            }
        };
        let snapshot = match self.capture_snapshot(subject).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.registry.abort(subject, key);
                return Err(err.into());
            }
        };
        self.registry.arm(subject, key, snapshot);

        // Apply-mutation: visual parameters first.
        let mut target = snapshot.visual;
        if let Some(tint) = timed.visual.tint {
            target.tint = tint;
        }
        if let Some(light) = timed.visual.light {
            target.light = light;
        }
        if target != snapshot.visual {
            self.subjects.set_visual_state(subject, target).await?;
        }

        // Start action; may itself mutate subject state.
        match timed.action {
            TimedAction::TintSkin | TimedAction::Glow => {}
            TimedAction::Levitate { elevation } => {
                target.elevation = elevation;
                self.subjects.set_visual_state(subject, target).await?;
            }
            TimedAction::Petrify => {
                self.subjects.set_status(subject, "petrified", true).await?;
            }
            TimedAction::BoostStrength { delta } => {
                self.subjects
                    .set_strength(subject, snapshot.strength + delta)
                    .await?;
            }
        }

        if let Some(overlay) = timed.visual.overlay {
            self.play_overlay(overlay, anchor).await;
        }
        self.post(
            subject,
            &format!(
                "{} hace efecto durante {} segundos.",
                descriptor.name, timed.duration_secs
            ),
        )
        .await;

        self.spawn_revert(subject, key, timed.duration_secs);
        tracing::info!(subject = %subject, duration_secs = timed.duration_secs, "Timed effect applied");
        Ok(())
    }

    /// Active → Idle. Returns `Ok(false)` when the pair was already idle
    /// (timer firing after an external deletion, or vice versa).
    #[tracing::instrument(skip(self), fields(key = %key))]
    pub async fn revert(&self, subject: SubjectId, key: EffectKey) -> Result<bool, DispatchError> {
        let Some(entry) = self.registry.take(subject, key) else {
            tracing::debug!(subject = %subject, "Revert no-op: effect already idle");
            return Ok(false);
        };

        if let Some(snapshot) = entry.snapshot {
            // Write back only the fields this effect mutated. A sibling
            // effect with a distinct key may still be holding the rest.
            let touches_visual = entry.visual.tint.is_some()
                || entry.visual.light.is_some()
                || matches!(entry.action, TimedAction::Levitate { .. });
            if touches_visual {
                let mut current = self.subjects.visual_state(subject).await?;
                if entry.visual.tint.is_some() {
                    current.tint = snapshot.visual.tint;
                }
                if entry.visual.light.is_some() {
                    current.light = snapshot.visual.light;
                }
                if let TimedAction::Levitate { .. } = entry.action {
                    current.elevation = snapshot.visual.elevation;
                }
                self.subjects.set_visual_state(subject, current).await?;
            }
            match entry.action {
                TimedAction::TintSkin | TimedAction::Glow | TimedAction::Levitate { .. } => {}
                TimedAction::Petrify => {
                    self.subjects.set_status(subject, "petrified", false).await?;
                }
                TimedAction::BoostStrength { .. } => {
                    self.subjects
                        .set_strength(subject, snapshot.strength)
                        .await?;
                }
            }
        }

        if let Some(overlay) = entry.visual.overlay {
            if let Ok(Some(anchor)) = self.subjects.anchor(subject).await {
                if let Err(err) = self.vfx.remove(overlay, anchor).await {
                    tracing::warn!(overlay, error = %err, "Could not remove visual effect");
                }
            }
        }
        self.post(subject, &format!("{} ha terminado.", entry.name))
            .await;
        tracing::info!(subject = %subject, "Timed effect reverted");
        Ok(true)
    }

    /// External deletion signal from the host (the active effect was
    /// deleted by another actor before the timer fired).
    pub async fn on_effect_removed(
        &self,
        subject: SubjectId,
        key: EffectKey,
    ) -> Result<bool, DispatchError> {
        tracing::debug!(subject = %subject, key = %key, "External effect removal");
        self.revert(subject, key).await
    }

    async fn capture_snapshot(&self, subject: SubjectId) -> Result<EffectSnapshot, HostError> {
        let visual = self.subjects.visual_state(subject).await?;
        let strength = self.subjects.strength(subject).await?;
        Ok(EffectSnapshot { visual, strength })
    }

    /// One-shot revert timer. Runs as an independent unit of work; if the
    /// effect was already reverted externally the wake-up is a no-op.
    fn spawn_revert(&self, subject: SubjectId, key: EffectKey, secs: u32) {
        // The task gets its own handle onto the shared ports and registry.
        let runner = TimedEffectRunner {
            registry: self.registry.clone(),
            subjects: self.subjects.clone(),
            presentation: self.presentation.clone(),
            vfx: self.vfx.clone(),
        };
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(secs))).await;
            match runner.revert(subject, key).await {
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(subject = %subject, key = %key, error = %err, "Revert failed");
                    runner
                        .notice(
                            NoticeLevel::Error,
                            &format!("No se pudo revertir el efecto «{}»: {}", key, err),
                        )
                        .await;
                }
            }
        });
    }

    async fn play_overlay(&self, overlay: &'static str, anchor: Anchor) {
        if let Err(err) = self.vfx.play(overlay, anchor).await {
            tracing::warn!(overlay, error = %err, "Could not play visual effect");
        }
    }

    /// Notifications and chat are reporting, not effect state; failures
    /// are logged and do not abort the activation.
    async fn notice(&self, level: NoticeLevel, message: &str) {
        if let Err(err) = self.presentation.notify(level, message).await {
            tracing::warn!(error = %err, "Notification failed");
        }
    }

    async fn post(&self, subject: SubjectId, content: &str) {
        if let Err(err) = self.presentation.post_message(subject, content).await {
            tracing::warn!(error = %err, "Chat message failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        MockPresentationPort, MockSubjectPort, MockVisualEffectsPort,
    };
    use magicbeans_domain::{ExtremeRollPolicy, RollTable, VisualParams, VisualState};

    fn standard_descriptor(key: &str) -> EffectDescriptor {
        let table = RollTable::standard(ExtremeRollPolicy::Dedicated).expect("valid table");
        table
            .buckets()
            .iter()
            .find(|b| b.descriptor.key.as_str() == key)
            .map(|b| b.descriptor.clone())
            .expect("known key")
    }

    fn timed(descriptor: &EffectDescriptor) -> TimedEffect {
        match &descriptor.outcome {
            magicbeans_domain::OutcomeSpec::Timed(t) => t.clone(),
            _ => panic!("not a timed effect"),
        }
    }

    fn runner(
        subjects: MockSubjectPort,
        presentation: MockPresentationPort,
        vfx: MockVisualEffectsPort,
    ) -> Arc<TimedEffectRunner> {
        Arc::new(TimedEffectRunner::new(
            Arc::new(EffectRegistry::new()),
            Arc::new(subjects),
            Arc::new(presentation),
            Arc::new(vfx),
        ))
    }

    #[tokio::test]
    async fn duplicate_activation_is_rejected_with_zero_mutations() {
        // No expectations on the subject port: any host call would panic.
        let subjects = MockSubjectPort::new();
        let mut presentation = MockPresentationPort::new();
        presentation
            .expect_notify()
            .withf(|level, _| *level == NoticeLevel::Warning)
            .times(1)
            .returning(|_, _| Ok(()));
        let runner = runner(subjects, presentation, MockVisualEffectsPort::new());

        let descriptor = standard_descriptor("levitar");
        let effect = timed(&descriptor);
        let subject = SubjectId::new();
        let now = Utc::now();
        assert!(runner.registry().try_begin(ActiveEffect {
            subject,
            key: descriptor.key,
            name: descriptor.name,
            action: effect.action,
            visual: VisualParams::default(),
            snapshot: None,
            applied_at: now,
            ends_at: now + chrono::Duration::seconds(60),
        }));

        let err = runner
            .apply(subject, &descriptor, &effect)
            .await
            .expect_err("second activation must be rejected");
        assert!(matches!(err, DispatchError::AlreadyActive { .. }));
        // The first activation's marker is untouched.
        assert!(runner.registry().is_active(subject, descriptor.key));
    }

    #[tokio::test]
    async fn missing_anchor_aborts_before_any_mutation() {
        let mut subjects = MockSubjectPort::new();
        subjects.expect_anchor().times(1).returning(|_| Ok(None));
        let mut presentation = MockPresentationPort::new();
        presentation
            .expect_notify()
            .withf(|level, _| *level == NoticeLevel::Error)
            .times(1)
            .returning(|_, _| Ok(()));
        let runner = runner(subjects, presentation, MockVisualEffectsPort::new());

        let descriptor = standard_descriptor("piel-cromatica");
        let effect = timed(&descriptor);
        let subject = SubjectId::new();

        let err = runner
            .apply(subject, &descriptor, &effect)
            .await
            .expect_err("no anchor means no activation");
        assert!(matches!(err, DispatchError::MissingSubjectContext(_)));
        // The pending marker was rolled back: nothing was applied.
        assert!(!runner.registry().is_active(subject, descriptor.key));
    }

    #[tokio::test]
    async fn host_failure_mid_apply_leaves_the_marker_set() {
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_anchor()
            .returning(|_| Ok(Some(Anchor { x: 0.0, y: 0.0 })));
        subjects
            .expect_visual_state()
            .returning(|_| Ok(VisualState::neutral()));
        subjects.expect_strength().returning(|_| Ok(10));
        subjects
            .expect_set_visual_state()
            .times(1)
            .returning(|_, _| Err(HostError::unavailable("set_visual_state", "offline")));
        let runner = runner(
            subjects,
            MockPresentationPort::new(),
            MockVisualEffectsPort::new(),
        );

        let descriptor = standard_descriptor("piel-cromatica");
        let effect = timed(&descriptor);
        let subject = SubjectId::new();

        let err = runner
            .apply(subject, &descriptor, &effect)
            .await
            .expect_err("host failure must propagate");
        assert!(matches!(err, DispatchError::Host(_)));
        // Known risk, surfaced not resolved: the effect may be stuck active.
        assert!(runner.registry().is_active(subject, descriptor.key));
    }

    #[tokio::test]
    async fn reverting_an_idle_pair_is_a_noop() {
        let runner = runner(
            MockSubjectPort::new(),
            MockPresentationPort::new(),
            MockVisualEffectsPort::new(),
        );
        let reverted = runner
            .revert(SubjectId::new(), EffectKey::new("levitar"))
            .await
            .expect("idle revert never fails");
        assert!(!reverted);
    }

    #[tokio::test]
    async fn strength_revert_restores_strength_without_writing_visuals() {
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_anchor()
            .returning(|_| Ok(Some(Anchor { x: 0.0, y: 0.0 })));
        // Snapshot read only; the boost never mutates visuals, so its
        // revert must not write them back either.
        subjects
            .expect_visual_state()
            .times(1)
            .returning(|_| Ok(VisualState::neutral()));
        subjects.expect_strength().returning(|_| Ok(10));
        subjects
            .expect_set_strength()
            .withf(|_, value| *value == 12)
            .times(1)
            .returning(|_, _| Ok(()));
        subjects
            .expect_set_strength()
            .withf(|_, value| *value == 10)
            .times(1)
            .returning(|_, _| Ok(()));
        // No set_visual_state expectation: a visual write would panic.
        let mut presentation = MockPresentationPort::new();
        presentation.expect_post_message().returning(|_, _| Ok(()));
        let runner = runner(subjects, presentation, MockVisualEffectsPort::new());

        let descriptor = standard_descriptor("fuerza-salvaje");
        let effect = timed(&descriptor);
        let subject = SubjectId::new();

        runner
            .apply(subject, &descriptor, &effect)
            .await
            .expect("apply succeeds");
        let reverted = runner
            .revert(subject, descriptor.key)
            .await
            .expect("revert succeeds");
        assert!(reverted);
    }

    #[tokio::test]
    async fn petrify_toggles_the_status_both_ways() {
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_anchor()
            .returning(|_| Ok(Some(Anchor { x: 0.0, y: 0.0 })));
        subjects
            .expect_visual_state()
            .returning(|_| Ok(VisualState::neutral()));
        subjects.expect_strength().returning(|_| Ok(10));
        subjects
            .expect_set_visual_state()
            .times(2) // tint on apply, restore on revert
            .returning(|_, _| Ok(()));
        subjects
            .expect_set_status()
            .withf(|_, status, active| status == "petrified" && *active)
            .times(1)
            .returning(|_, _, _| Ok(()));
        subjects
            .expect_set_status()
            .withf(|_, status, active| status == "petrified" && !*active)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut presentation = MockPresentationPort::new();
        presentation.expect_post_message().returning(|_, _| Ok(()));
        let runner = runner(subjects, presentation, MockVisualEffectsPort::new());

        let descriptor = standard_descriptor("petrificado");
        let effect = timed(&descriptor);
        let subject = SubjectId::new();

        runner
            .apply(subject, &descriptor, &effect)
            .await
            .expect("apply succeeds");
        let reverted = runner
            .revert(subject, descriptor.key)
            .await
            .expect("revert succeeds");
        assert!(reverted);
        assert!(!runner.registry().is_active(subject, descriptor.key));
    }
}
