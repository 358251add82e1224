//! Item-use hook: the externally-invokable entry point.
//!
//! The host fires an item-use completion event; items carry an optional
//! bean-macro flag. Handlers are statically registered by name — the flag
//! value selects one, it is never evaluated as code.

use std::sync::Arc;

use magicbeans_domain::SubjectId;
use tokio::task::JoinHandle;

use crate::infrastructure::ports::{NoticeLevel, PresentationPort};

use super::activate::ActivateBean;
use super::DispatchError;

/// The one registered handler name, matching the flag the compendium
/// items carry.
pub const BEAN_MACRO: &str = "randomMagicEffect";

/// Item-use completion event as delivered by the host.
#[derive(Debug, Clone)]
pub struct ItemUseEvent {
    pub subject: SubjectId,
    pub item_name: String,
    /// Value of the item's bean-macro flag; absent on ordinary items.
    pub macro_flag: Option<String>,
    /// Subject targeted in the activation context, when one is selected.
    pub target: Option<SubjectId>,
}

/// Entry point wired to the host's item-use hook. Fire-and-forget: every
/// failure is reported to the user and logged, nothing propagates into
/// the host's event loop.
pub struct ItemUseHook {
    activate: Arc<ActivateBean>,
    presentation: Arc<dyn PresentationPort>,
}

impl ItemUseHook {
    pub fn new(activate: Arc<ActivateBean>, presentation: Arc<dyn PresentationPort>) -> Self {
        Self {
            activate,
            presentation,
        }
    }

    /// Handle one item-use event. Returns the spawned task handle (tests
    /// await it; the host does not).
    pub fn on_item_used(&self, event: ItemUseEvent) -> Option<JoinHandle<()>> {
        let flag = event.macro_flag.as_deref()?;
        if flag != BEAN_MACRO {
            tracing::warn!(flag, item = %event.item_name, "Unknown effect handler");
            let presentation = self.presentation.clone();
            let flag = flag.to_string();
            return Some(tokio::spawn(async move {
                let message = format!("No se encontró la macro: {}", flag);
                if let Err(err) = presentation.notify(NoticeLevel::Error, &message).await {
                    tracing::warn!(error = %err, "Notification failed");
                }
            }));
        }

        tracing::info!(item = %event.item_name, subject = %event.subject, "Magic bean consumed");
        let activate = self.activate.clone();
        let presentation = self.presentation.clone();
        Some(tokio::spawn(async move {
            match activate.execute(event.subject, event.target).await {
                Ok(outcome) => {
                    tracing::info!(roll = outcome.roll, key = %outcome.key, "Activation complete");
                }
                Err(DispatchError::AlreadyActive { key, .. }) => {
                    // Guard rejection already produced its warning notice.
                    tracing::warn!(key = %key, "Activation rejected: effect already active");
                }
                Err(err) => {
                    tracing::error!(error = %err, "Activation failed");
                    let message = format!("El efecto mágico falló: {}", err);
                    if let Err(err) = presentation.notify(NoticeLevel::Error, &message).await {
                        tracing::warn!(error = %err, "Notification failed");
                    }
                }
            }
        }))
    }
}
