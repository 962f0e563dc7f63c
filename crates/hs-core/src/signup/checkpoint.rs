//! Durable snapshot of an in-progress signup.
//!
//! Serialized as a single flat JSON object: every field value at the top level
//! plus `currentTab` and `timestamp` (milliseconds since the Unix epoch).

use serde::{Deserialize, Serialize};

use crate::signup::fields::FieldValues;
use crate::signup::state::WizardState;
use crate::signup::step::StepId;

/// Storage key of the single tracked signup.
pub const CHECKPOINT_KEY: &str = "signup.checkpoint";

/// Keys the checkpoint itself occupies next to the field values.
pub const RESERVED_KEYS: [&str; 2] = ["currentTab", "timestamp"];

/// Checkpoints older than this are discarded on restore.
pub const CHECKPOINT_RETENTION_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardCheckpoint {
    #[serde(flatten)]
    pub field_values: FieldValues,
    pub current_tab: StepId,
    pub timestamp: i64,
}

impl WizardCheckpoint {
    pub fn capture(state: &WizardState, now_ms: i64) -> Self {
        Self {
            field_values: state.field_values.clone(),
            current_tab: state.current_step,
            timestamp: now_ms,
        }
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.timestamp)
    }

    pub fn is_fresh(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) <= CHECKPOINT_RETENTION_MS
    }

    /// Whether `field` would collide with the checkpoint's own keys.
    pub fn is_reserved(field: &str) -> bool {
        RESERVED_KEYS.contains(&field)
    }
}
