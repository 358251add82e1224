//! Dispatcher settings.
//!
//! Behavioral knobs only; everything else about the effect table is
//! static. Settings are read from the environment in the binary, the way
//! the rest of the configuration is.

use magicbeans_domain::{ConfigurationError, ExtremeRollPolicy, RollTable};
use serde::{Deserialize, Serialize};

/// Configuration for the effect dispatcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DispatcherSettings {
    /// Whether rolls of 1 and 100 get dedicated singleton buckets. An
    /// explicit choice: the source revisions disagree, so it is never
    /// inferred.
    pub extreme_rolls: ExtremeRollPolicy,
}

impl DispatcherSettings {
    /// Read overrides from the environment (`MAGICBEANS_EXTREME_ROLLS`:
    /// `dedicated` or `folded`).
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(value) = std::env::var("MAGICBEANS_EXTREME_ROLLS") {
            match value.trim().to_ascii_lowercase().as_str() {
                "dedicated" => settings.extreme_rolls = ExtremeRollPolicy::Dedicated,
                "folded" => settings.extreme_rolls = ExtremeRollPolicy::Folded,
                other => {
                    tracing::warn!(value = other, "Unknown extreme-roll policy, using default")
                }
            }
        }
        settings
    }

    /// Build the roll table for these settings.
    pub fn build_table(&self) -> Result<RollTable, ConfigurationError> {
        RollTable::standard(self.extreme_rolls)
    }
}
