//! Magic-bean dispatcher - demo entry point.
//!
//! Wires the dispatcher to the in-memory host, consumes a few beans, and
//! reverts whatever is still active before exiting.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use magicbeans_engine::infrastructure::app_settings::DispatcherSettings;
use magicbeans_engine::infrastructure::dice::SystemDice;
use magicbeans_engine::infrastructure::memory::MemoryHost;
use magicbeans_engine::registry::EffectRegistry;
use magicbeans_engine::{ActivateBean, ItemUseEvent, ItemUseHook, TimedEffectRunner, BEAN_MACRO};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "magicbeans_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting magic-bean dispatcher demo");

    let settings = DispatcherSettings::from_env();
    let table = Arc::new(settings.build_table()?);

    let host = Arc::new(MemoryHost::new());
    let subject = host.add_subject("Korgul el Valiente", 22, 30).await;

    let registry = Arc::new(EffectRegistry::new());
    let runner = Arc::new(TimedEffectRunner::new(
        registry.clone(),
        host.clone(),
        host.clone(),
        host.clone(),
    ));
    let activate = Arc::new(ActivateBean::new(
        table,
        runner.clone(),
        host.clone(),
        host.clone(),
        Arc::new(SystemDice),
    ));
    let hook = ItemUseHook::new(activate, host.clone());

    for _ in 0..3 {
        if let Some(handle) = hook.on_item_used(ItemUseEvent {
            subject,
            item_name: "Frijol mágico".into(),
            macro_flag: Some(BEAN_MACRO.into()),
            target: None,
        }) {
            handle.await?;
        }
    }

    // Revert anything still running rather than waiting out the timers.
    for key in registry.active_keys(subject) {
        runner.on_effect_removed(subject, key).await?;
    }

    if let Some(state) = host.subject(subject).await {
        tracing::info!(
            hp = state.hp,
            strength = state.strength,
            items = state.items.len(),
            "Final subject state"
        );
    }
    for (level, notice) in host.notices().await {
        tracing::info!(?level, notice, "Notice");
    }
    for (_, message) in host.messages().await {
        tracing::info!(message, "Chat");
    }

    Ok(())
}
