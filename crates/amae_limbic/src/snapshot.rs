//! Engine snapshot: the combined state handed to readers, broadcast to
//! subscribers and mirrored into the external cache.

use crate::escalation::EscalationState;
use amae_context::ConversationContextSnapshot;
use amae_core::{EmotionVector, MirrorError, MoodCategory, Tone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Bumped on every mutation; newer snapshots win in the mirror.
    pub revision: u64,
    pub mood: MoodCategory,
    pub emotions: EmotionVector,
    pub tone: Tone,
    pub conversation: ConversationContextSnapshot,
    pub escalation: EscalationState,
    /// Last residue event, needed to resume decay and tone after a reload.
    pub last_event_at: Option<DateTime<Utc>>,
    pub taken_at: DateTime<Utc>,
}

impl EngineSnapshot {
    pub fn to_blob(&self) -> Result<Vec<u8>, MirrorError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, MirrorError> {
        Ok(serde_json::from_slice(blob)?)
    }

    /// Compact one-line state, e.g. `[affect: mood=joy tone=happy esc=calm | sadness=0 ...]`
    pub fn format_compact(&self) -> String {
        format!(
            "[affect: mood={} tone={} esc={} | {}]",
            self.mood,
            self.tone,
            self.escalation.level,
            self.emotions.describe()
        )
    }
}
