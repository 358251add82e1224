//! In-memory host adapter.
//!
//! Stands in for the real game host in the demo binary and the e2e
//! tests: actors are plain structs behind a mutex, notifications and
//! chat messages are recorded for inspection.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use magicbeans_domain::{ItemRecord, SubjectId, VisualState};
use tokio::sync::Mutex;

use super::ports::{
    Anchor, HostError, NoticeLevel, PresentationPort, SubjectPort, VisualEffectsPort,
};

/// Mutable state of one in-memory actor.
#[derive(Debug, Clone)]
pub struct SubjectState {
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub strength: i32,
    pub visual: VisualState,
    pub flags: HashSet<String>,
    pub statuses: HashSet<String>,
    pub items: Vec<ItemRecord>,
    pub anchor: Option<Anchor>,
}

/// In-memory implementation of every host port.
#[derive(Default)]
pub struct MemoryHost {
    subjects: Mutex<HashMap<SubjectId, SubjectState>>,
    notices: Mutex<Vec<(NoticeLevel, String)>>,
    messages: Mutex<Vec<(SubjectId, String)>>,
    playing: Mutex<Vec<String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_subject(&self, name: &str, hp: i32, max_hp: i32) -> SubjectId {
        let id = SubjectId::new();
        self.subjects.lock().await.insert(
            id,
            SubjectState {
                name: name.to_string(),
                hp,
                max_hp,
                strength: 10,
                visual: VisualState::neutral(),
                flags: HashSet::new(),
                statuses: HashSet::new(),
                items: Vec::new(),
                anchor: Some(Anchor { x: 0.0, y: 0.0 }),
            },
        );
        id
    }

    /// Detach the subject's token (no visual anchor on scene).
    pub async fn remove_anchor(&self, subject: SubjectId) {
        if let Some(state) = self.subjects.lock().await.get_mut(&subject) {
            state.anchor = None;
        }
    }

    pub async fn subject(&self, subject: SubjectId) -> Option<SubjectState> {
        self.subjects.lock().await.get(&subject).cloned()
    }

    pub async fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().await.clone()
    }

    pub async fn messages(&self) -> Vec<(SubjectId, String)> {
        self.messages.lock().await.clone()
    }

    /// Names of particle effects currently playing.
    pub async fn playing(&self) -> Vec<String> {
        self.playing.lock().await.clone()
    }

    async fn with_subject<T>(
        &self,
        subject: SubjectId,
        f: impl FnOnce(&mut SubjectState) -> T,
    ) -> Result<T, HostError> {
        let mut subjects = self.subjects.lock().await;
        let state = subjects
            .get_mut(&subject)
            .ok_or(HostError::SubjectNotFound(subject))?;
        Ok(f(state))
    }
}

#[async_trait]
impl SubjectPort for MemoryHost {
    async fn name(&self, subject: SubjectId) -> Result<String, HostError> {
        self.with_subject(subject, |s| s.name.clone()).await
    }

    async fn hp(&self, subject: SubjectId) -> Result<i32, HostError> {
        self.with_subject(subject, |s| s.hp).await
    }

    async fn max_hp(&self, subject: SubjectId) -> Result<i32, HostError> {
        self.with_subject(subject, |s| s.max_hp).await
    }

    async fn set_hp(&self, subject: SubjectId, hp: i32) -> Result<(), HostError> {
        self.with_subject(subject, |s| s.hp = hp.clamp(0, s.max_hp))
            .await
    }

    async fn apply_damage(&self, subject: SubjectId, delta: i32) -> Result<(), HostError> {
        // Positive damages, negative heals; hp stays in 0..=max_hp.
        self.with_subject(subject, |s| s.hp = (s.hp - delta).clamp(0, s.max_hp))
            .await
    }

    async fn strength(&self, subject: SubjectId) -> Result<i32, HostError> {
        self.with_subject(subject, |s| s.strength).await
    }

    async fn set_strength(&self, subject: SubjectId, value: i32) -> Result<(), HostError> {
        self.with_subject(subject, |s| s.strength = value).await
    }

    async fn get_flag(&self, subject: SubjectId, key: &str) -> Result<bool, HostError> {
        self.with_subject(subject, |s| s.flags.contains(key)).await
    }

    async fn set_flag(
        &self,
        subject: SubjectId,
        key: &str,
        value: bool,
    ) -> Result<(), HostError> {
        self.with_subject(subject, |s| {
            if value {
                s.flags.insert(key.to_string());
            } else {
                s.flags.remove(key);
            }
        })
        .await
    }

    async fn clear_flag(&self, subject: SubjectId, key: &str) -> Result<(), HostError> {
        self.with_subject(subject, |s| {
            s.flags.remove(key);
        })
        .await
    }

    async fn visual_state(&self, subject: SubjectId) -> Result<VisualState, HostError> {
        self.with_subject(subject, |s| s.visual).await
    }

    async fn set_visual_state(
        &self,
        subject: SubjectId,
        state: VisualState,
    ) -> Result<(), HostError> {
        self.with_subject(subject, |s| s.visual = state).await
    }

    async fn set_status(
        &self,
        subject: SubjectId,
        status: &str,
        active: bool,
    ) -> Result<(), HostError> {
        self.with_subject(subject, |s| {
            if active {
                s.statuses.insert(status.to_string());
            } else {
                s.statuses.remove(status);
            }
        })
        .await
    }

    async fn grant_item(&self, subject: SubjectId, record: &ItemRecord) -> Result<(), HostError> {
        self.with_subject(subject, |s| s.items.push(record.clone()))
            .await
    }

    async fn anchor(&self, subject: SubjectId) -> Result<Option<Anchor>, HostError> {
        self.with_subject(subject, |s| s.anchor).await
    }
}

#[async_trait]
impl PresentationPort for MemoryHost {
    async fn notify(&self, level: NoticeLevel, message: &str) -> Result<(), HostError> {
        self.notices.lock().await.push((level, message.to_string()));
        Ok(())
    }

    async fn post_message(&self, subject: SubjectId, content: &str) -> Result<(), HostError> {
        self.messages
            .lock()
            .await
            .push((subject, content.to_string()));
        Ok(())
    }
}

#[async_trait]
impl VisualEffectsPort for MemoryHost {
    async fn play(&self, name: &str, _at: Anchor) -> Result<(), HostError> {
        self.playing.lock().await.push(name.to_string());
        Ok(())
    }

    async fn remove(&self, name: &str, _at: Anchor) -> Result<(), HostError> {
        self.playing.lock().await.retain(|n| n != name);
        Ok(())
    }
}
