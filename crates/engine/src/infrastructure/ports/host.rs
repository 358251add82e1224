//! Host-engine port traits.

use async_trait::async_trait;
use magicbeans_domain::{DiceFormula, DiceRollResult, ItemRecord, SubjectId, VisualState};

use super::error::HostError;

/// Scene position of a subject's token. Serves as the visual anchor for
/// particle effects; a subject without one has no valid token on scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

/// Severity of a transient UI notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Actor mutation and query operations.
///
/// Damage and heal go through `apply_damage` (positive damages, negative
/// heals); the host clamps hit points to the actor's valid range.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubjectPort: Send + Sync {
    async fn name(&self, subject: SubjectId) -> Result<String, HostError>;

    async fn hp(&self, subject: SubjectId) -> Result<i32, HostError>;
    async fn max_hp(&self, subject: SubjectId) -> Result<i32, HostError>;
    async fn set_hp(&self, subject: SubjectId, hp: i32) -> Result<(), HostError>;
    async fn apply_damage(&self, subject: SubjectId, delta: i32) -> Result<(), HostError>;

    async fn strength(&self, subject: SubjectId) -> Result<i32, HostError>;
    async fn set_strength(&self, subject: SubjectId, value: i32) -> Result<(), HostError>;

    async fn get_flag(&self, subject: SubjectId, key: &str) -> Result<bool, HostError>;
    async fn set_flag(&self, subject: SubjectId, key: &str, value: bool)
        -> Result<(), HostError>;
    async fn clear_flag(&self, subject: SubjectId, key: &str) -> Result<(), HostError>;

    async fn visual_state(&self, subject: SubjectId) -> Result<VisualState, HostError>;
    async fn set_visual_state(
        &self,
        subject: SubjectId,
        state: VisualState,
    ) -> Result<(), HostError>;

    async fn set_status(
        &self,
        subject: SubjectId,
        status: &str,
        active: bool,
    ) -> Result<(), HostError>;

    /// Create an embedded item document on the subject.
    async fn grant_item(&self, subject: SubjectId, record: &ItemRecord) -> Result<(), HostError>;

    /// `None` means the subject has no valid token on the current scene.
    async fn anchor(&self, subject: SubjectId) -> Result<Option<Anchor>, HostError>;
}

/// Chat messages and transient UI notifications. Localization of the
/// rendered text stays host-side.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresentationPort: Send + Sync {
    async fn notify(&self, level: NoticeLevel, message: &str) -> Result<(), HostError>;

    /// Post a chat message attributed to the subject.
    async fn post_message(&self, subject: SubjectId, content: &str) -> Result<(), HostError>;
}

/// Optional particle-effect plugin. Best-effort: callers log failures and
/// keep going, the plugin may simply be absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisualEffectsPort: Send + Sync {
    async fn play(&self, name: &str, at: Anchor) -> Result<(), HostError>;
    async fn remove(&self, name: &str, at: Anchor) -> Result<(), HostError>;
}

/// Dice roll service. Injectable so tests control every roll.
#[cfg_attr(test, mockall::automock)]
pub trait DicePort: Send + Sync {
    fn roll(&self, formula: &DiceFormula) -> DiceRollResult;
}
