//! Bean activation: roll 1d100, select from the table, dispatch.

use std::sync::Arc;

use magicbeans_domain::{
    ActivationId, DiceFormula, EffectDescriptor, EffectKey, InstantOutcome, OutcomeSpec, RollTable,
    SubjectId,
};

use crate::infrastructure::ports::{DicePort, NoticeLevel, PresentationPort, SubjectPort};

use super::lifecycle::TimedEffectRunner;
use super::DispatchError;

/// Result of one activation, for logging and the hook's reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationOutcome {
    pub id: ActivationId,
    pub roll: u8,
    pub key: EffectKey,
}

/// One magic-bean activation: roll, range lookup, effect dispatch.
pub struct ActivateBean {
    table: Arc<RollTable>,
    runner: Arc<TimedEffectRunner>,
    subjects: Arc<dyn SubjectPort>,
    presentation: Arc<dyn PresentationPort>,
    dice: Arc<dyn DicePort>,
}

impl ActivateBean {
    pub fn new(
        table: Arc<RollTable>,
        runner: Arc<TimedEffectRunner>,
        subjects: Arc<dyn SubjectPort>,
        presentation: Arc<dyn PresentationPort>,
        dice: Arc<dyn DicePort>,
    ) -> Self {
        Self {
            table,
            runner,
            subjects,
            presentation,
            dice,
        }
    }

    /// Execute one activation for the subject. `target` is the optionally
    /// selected subject from the activation context; only target-directed
    /// outcomes consume it.
    ///
    /// Within the activation, steps run strictly in order: roll, lookup,
    /// then either the instant mutation or the timed apply/schedule.
    #[tracing::instrument(skip(self), fields(subject = %subject))]
    pub async fn execute(
        &self,
        subject: SubjectId,
        target: Option<SubjectId>,
    ) -> Result<ActivationOutcome, DispatchError> {
        let id = ActivationId::new();
        let roll = self.dice.roll(&DiceFormula::d100());
        self.notice(
            NoticeLevel::Info,
            &format!("Resultado mágico: {}", roll.total),
        )
        .await;
        self.post(subject, &roll.breakdown()).await;

        // The d100 total is always in 1..=100, so the clamp never bites;
        // select re-validates the domain anyway.
        let descriptor = self.table.select(roll.total.clamp(1, 100) as u8)?;
        tracing::info!(roll = roll.total, key = %descriptor.key, "Effect selected");

        match &descriptor.outcome {
            OutcomeSpec::Instant(outcome) => {
                self.apply_instant(subject, target, descriptor, outcome)
                    .await?;
            }
            OutcomeSpec::Timed(timed) => {
                self.runner.apply(subject, descriptor, timed).await?;
            }
        }

        Ok(ActivationOutcome {
            id,
            roll: roll.total.clamp(1, 100) as u8,
            key: descriptor.key,
        })
    }

    /// One mutation plus one message; no lifecycle, no marker. Repeating
    /// the activation re-rolls and re-applies by design.
    async fn apply_instant(
        &self,
        subject: SubjectId,
        target: Option<SubjectId>,
        descriptor: &EffectDescriptor,
        outcome: &InstantOutcome,
    ) -> Result<(), DispatchError> {
        match outcome {
            InstantOutcome::ForceHpToOne => {
                let hp = self.subjects.hp(subject).await?;
                if hp > 1 {
                    self.subjects.set_hp(subject, 1).await?;
                    self.post(
                        subject,
                        "El frijol drena tu fuerza vital: quedas a 1 punto de golpe.",
                    )
                    .await;
                } else {
                    self.notice(
                        NoticeLevel::Info,
                        "El drenaje no encuentra nada que llevarse.",
                    )
                    .await;
                }
            }
            InstantOutcome::Heal(formula) => {
                let healed = self.dice.roll(formula);
                self.subjects.apply_damage(subject, -healed.total).await?;
                self.post(
                    subject,
                    &format!("¡Efecto: curación! {}", healed.breakdown()),
                )
                .await;
            }
            InstantOutcome::Damage(formula) => {
                let damage = self.dice.roll(formula);
                self.subjects.apply_damage(subject, damage.total).await?;
                self.post(subject, &format!("¡Efecto: daño! {}", damage.breakdown()))
                    .await;
            }
            InstantOutcome::DamageTarget(formula) => match target {
                Some(target) => {
                    let damage = self.dice.roll(formula);
                    self.subjects.apply_damage(target, damage.total).await?;
                    self.post(
                        subject,
                        &format!("¡Efecto: daño al objetivo! {}", damage.breakdown()),
                    )
                    .await;
                }
                None => {
                    self.notice(
                        NoticeLevel::Info,
                        "Sin objetivo seleccionado: el daño se disipa.",
                    )
                    .await;
                }
            },
            InstantOutcome::GrantItem(record) => {
                self.subjects.grant_item(subject, record).await?;
                self.post(subject, &format!("¡Ganas «{}»!", record.name))
                    .await;
            }
            InstantOutcome::Inspiration => {
                let hp = self.subjects.hp(subject).await?;
                let max_hp = self.subjects.max_hp(subject).await?;
                if hp < max_hp {
                    self.subjects.set_hp(subject, max_hp).await?;
                    self.post(subject, "¡El frijol restaura toda tu vitalidad!")
                        .await;
                } else if !self.subjects.get_flag(subject, "inspiration").await? {
                    self.subjects.set_flag(subject, "inspiration", true).await?;
                    self.post(subject, "¡Ganas inspiración!").await;
                } else {
                    self.notice(
                        NoticeLevel::Info,
                        "Nada que mejorar: ya estás al máximo y con inspiración.",
                    )
                    .await;
                }
            }
        }
        tracing::info!(key = %descriptor.key, "Instant outcome applied");
        Ok(())
    }

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
        MockDicePort, MockPresentationPort, MockSubjectPort, MockVisualEffectsPort,
    };
    use crate::registry::EffectRegistry;
    use magicbeans_domain::{DiceRollResult, ExtremeRollPolicy};

    /// Dice that return fixed totals, one per roll, in order.
    fn fixed_dice(totals: Vec<i32>) -> MockDicePort {
        let mut dice = MockDicePort::new();
        let remaining = std::sync::Mutex::new(std::collections::VecDeque::from(totals));
        dice.expect_roll().returning(move |formula| {
            let total = remaining
                .lock()
                .expect("dice queue")
                .pop_front()
                .expect("unexpected extra roll");
            DiceRollResult {
                formula: formula.clone(),
                individual_rolls: vec![total - formula.modifier],
                dice_total: total - formula.modifier,
                total,
            }
        });
        dice
    }

    fn quiet_presentation() -> MockPresentationPort {
        let mut presentation = MockPresentationPort::new();
        presentation.expect_notify().returning(|_, _| Ok(()));
        presentation.expect_post_message().returning(|_, _| Ok(()));
        presentation
    }

    fn activate(subjects: MockSubjectPort, dice: MockDicePort) -> ActivateBean {
        let table =
            Arc::new(RollTable::standard(ExtremeRollPolicy::Dedicated).expect("valid table"));
        let subjects: Arc<dyn SubjectPort> = Arc::new(subjects);
        let presentation: Arc<dyn PresentationPort> = Arc::new(quiet_presentation());
        let runner = Arc::new(TimedEffectRunner::new(
            Arc::new(EffectRegistry::new()),
            subjects.clone(),
            presentation.clone(),
            Arc::new(MockVisualEffectsPort::new()),
        ));
        ActivateBean::new(table, runner, subjects, presentation, Arc::new(dice))
    }

    #[tokio::test]
    async fn roll_of_one_forces_hp_down_to_one() {
        let mut subjects = MockSubjectPort::new();
        subjects.expect_hp().returning(|_| Ok(25));
        subjects
            .expect_set_hp()
            .withf(|_, hp| *hp == 1)
            .times(1)
            .returning(|_, _| Ok(()));
        let activate = activate(subjects, fixed_dice(vec![1]));

        let outcome = activate.execute(SubjectId::new(), None).await.expect("activation");
        assert_eq!(outcome.roll, 1);
        assert_eq!(outcome.key, EffectKey::new("drenaje-fatal"));
    }

    #[tokio::test]
    async fn roll_of_one_at_one_hp_mutates_nothing() {
        let mut subjects = MockSubjectPort::new();
        subjects.expect_hp().returning(|_| Ok(1));
        // No set_hp expectation: a mutation would panic the mock.
        let activate = activate(subjects, fixed_dice(vec![1]));

        activate
            .execute(SubjectId::new(), None)
            .await
            .expect("informational only");
    }

    #[tokio::test]
    async fn heal_applies_a_negative_damage_delta() {
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_apply_damage()
            .withf(|_, delta| *delta == -9)
            .times(1)
            .returning(|_, _| Ok(()));
        // Roll 15 selects the heal bucket; the 2d8+2 roll totals 9.
        let activate = activate(subjects, fixed_dice(vec![15, 9]));

        let outcome = activate.execute(SubjectId::new(), None).await.expect("activation");
        assert_eq!(outcome.key, EffectKey::new("curacion"));
    }

    #[tokio::test]
    async fn damage_applies_a_positive_delta() {
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_apply_damage()
            .withf(|_, delta| *delta == 7)
            .times(1)
            .returning(|_, _| Ok(()));
        let activate = activate(subjects, fixed_dice(vec![25, 7]));

        let outcome = activate.execute(SubjectId::new(), None).await.expect("activation");
        assert_eq!(outcome.key, EffectKey::new("dano-arcano"));
    }

    #[tokio::test]
    async fn greater_damage_hits_the_targeted_subject() {
        let target = SubjectId::new();
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_apply_damage()
            .withf(move |who, delta| *who == target && *delta == 11)
            .times(1)
            .returning(|_, _| Ok(()));
        // Roll 75 selects the target-damage bucket; the 3d6 roll totals 11.
        let activate = activate(subjects, fixed_dice(vec![75, 11]));

        let outcome = activate
            .execute(SubjectId::new(), Some(target))
            .await
            .expect("activation");
        assert_eq!(outcome.key, EffectKey::new("dano-arcano-mayor"));
    }

    #[tokio::test]
    async fn greater_damage_without_a_target_dissipates() {
        // No apply_damage expectation: a mutation would panic the mock.
        let subjects = MockSubjectPort::new();
        let mut presentation = MockPresentationPort::new();
        presentation.expect_post_message().returning(|_, _| Ok(()));
        presentation
            .expect_notify()
            .withf(|level, msg| *level == NoticeLevel::Info && msg.contains("se disipa"))
            .times(1)
            .returning(|_, _| Ok(()));
        presentation
            .expect_notify()
            .withf(|level, msg| *level == NoticeLevel::Info && !msg.contains("se disipa"))
            .returning(|_, _| Ok(()));

        let table =
            Arc::new(RollTable::standard(ExtremeRollPolicy::Dedicated).expect("valid table"));
        let subjects: Arc<dyn SubjectPort> = Arc::new(subjects);
        let presentation: Arc<dyn PresentationPort> = Arc::new(presentation);
        let runner = Arc::new(TimedEffectRunner::new(
            Arc::new(EffectRegistry::new()),
            subjects.clone(),
            presentation.clone(),
            Arc::new(MockVisualEffectsPort::new()),
        ));
        let activate = ActivateBean::new(
            table,
            runner,
            subjects,
            presentation,
            Arc::new(fixed_dice(vec![75])),
        );

        activate
            .execute(SubjectId::new(), None)
            .await
            .expect("dissipates without error");
    }

    #[tokio::test]
    async fn roll_100_at_max_hp_grants_inspiration_without_hp_change() {
        let mut subjects = MockSubjectPort::new();
        subjects.expect_hp().returning(|_| Ok(30));
        subjects.expect_max_hp().returning(|_| Ok(30));
        subjects
            .expect_get_flag()
            .withf(|_, key| key == "inspiration")
            .returning(|_, _| Ok(false));
        subjects
            .expect_set_flag()
            .withf(|_, key, value| key == "inspiration" && *value)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let activate = activate(subjects, fixed_dice(vec![100]));

        let outcome = activate.execute(SubjectId::new(), None).await.expect("activation");
        assert_eq!(outcome.key, EffectKey::new("inspiracion"));
    }

    #[tokio::test]
    async fn roll_100_below_max_hp_heals_to_max_instead() {
        let mut subjects = MockSubjectPort::new();
        subjects.expect_hp().returning(|_| Ok(12));
        subjects.expect_max_hp().returning(|_| Ok(30));
        subjects
            .expect_set_hp()
            .withf(|_, hp| *hp == 30)
            .times(1)
            .returning(|_, _| Ok(()));
        let activate = activate(subjects, fixed_dice(vec![100]));

        activate.execute(SubjectId::new(), None).await.expect("activation");
    }

    #[tokio::test]
    async fn roll_100_with_everything_maxed_is_informational_only() {
        let mut subjects = MockSubjectPort::new();
        subjects.expect_hp().returning(|_| Ok(30));
        subjects.expect_max_hp().returning(|_| Ok(30));
        subjects.expect_get_flag().returning(|_, _| Ok(true));
        let activate = activate(subjects, fixed_dice(vec![100]));

        activate.execute(SubjectId::new(), None).await.expect("activation");
    }

    #[tokio::test]
    async fn item_grant_creates_the_embedded_document() {
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_grant_item()
            .withf(|_, record| record.name == "Bendición Arcana")
            .times(1)
            .returning(|_, _| Ok(()));
        let activate = activate(subjects, fixed_dice(vec![85]));

        let outcome = activate.execute(SubjectId::new(), None).await.expect("activation");
        assert_eq!(outcome.key, EffectKey::new("bendicion-arcana"));
    }

    #[tokio::test]
    async fn host_failure_aborts_the_activation() {
        let mut subjects = MockSubjectPort::new();
        subjects
            .expect_apply_damage()
            .returning(|_, _| Err(crate::infrastructure::ports::HostError::unavailable(
                "apply_damage",
                "offline",
            )));
        let activate = activate(subjects, fixed_dice(vec![25, 7]));

        let err = activate
            .execute(SubjectId::new(), None)
            .await
            .expect_err("host failure propagates");
        assert!(matches!(err, DispatchError::Host(_)));
    }
}
