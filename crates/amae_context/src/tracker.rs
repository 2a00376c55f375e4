//! Conversation Tracker
//!
//! Keeps the last few messages of the conversation in a bounded FIFO and
//! derives a snapshot from them after every insertion:
//!
//! - current tone: most recent non-neutral tone in the tone window, explicit
//!   hints preferred over inferred tones
//! - topic continuity: how often the dominant non-generic topic repeats in
//!   the topic window
//! - flow pattern: rapid back-and-forth, emotionally charged, playful or normal
//! - emotion flow: the last few tone changes between consecutive entries
//!
//! An outbound photo pins its topic ("sticky topic") until another photo
//! replaces it or the caller clears it.

use crate::infer::{infer_tone, infer_topic, Topic};
use amae_core::{ConversationConfig, Tone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The human on the other side (inbound).
    Counterpart,
    /// The companion itself (outbound).
    Companion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneSource {
    Explicit,
    Inferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Image,
    Other,
}

/// Metadata of a media item attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub caption: Option<String>,
}

impl MediaAttachment {
    pub fn photo(caption: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Photo,
            caption: Some(caption.into()),
        }
    }

    pub fn is_photo(&self) -> bool {
        matches!(self.kind, MediaKind::Photo | MediaKind::Image)
    }

    fn topic(&self) -> Topic {
        Topic::Photo(self.caption.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub speaker: Speaker,
    pub text: String,
    pub tone: Tone,
    pub tone_source: ToneSource,
    pub topic: Topic,
    pub media: Option<MediaAttachment>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPattern {
    Rapid,
    Emotional,
    Playful,
    #[default]
    Normal,
}

impl FlowPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowPattern::Rapid => "rapid",
            FlowPattern::Emotional => "emotional",
            FlowPattern::Playful => "playful",
            FlowPattern::Normal => "normal",
        }
    }
}

/// A change of tone between two consecutive entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneTransition {
    pub from: Tone,
    pub to: Tone,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationContextSnapshot {
    pub current_tone: Tone,
    pub current_topic: Topic,
    pub topic_continuity_score: usize,
    pub flow_pattern: FlowPattern,
    pub emotion_flow: Vec<ToneTransition>,
    /// `current_topic` is pinned rather than derived.
    pub sticky_topic: bool,
    pub entry_count: usize,
    pub last_inbound_at: Option<DateTime<Utc>>,
}

pub struct ConversationTracker {
    config: ConversationConfig,
    entries: VecDeque<ConversationEntry>,
    transitions: VecDeque<ToneTransition>,
    sticky: Option<Topic>,
    last_inbound_at: Option<DateTime<Utc>>,
    snapshot: ConversationContextSnapshot,
}

impl Default for ConversationTracker {
    fn default() -> Self {
        Self::new(ConversationConfig::default())
    }
}

impl ConversationTracker {
    pub fn new(config: ConversationConfig) -> Self {
        let config = ConversationConfig {
            capacity: config.capacity.max(1),
            tone_window: config.tone_window.max(1),
            topic_window: config.topic_window.max(1),
            flow_window: config.flow_window.max(1),
            ..config
        };
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            transitions: VecDeque::with_capacity(config.emotion_flow_len),
            sticky: None,
            last_inbound_at: None,
            snapshot: ConversationContextSnapshot::default(),
            config,
        }
    }

    /// Record a message sent now.
    pub fn add_entry(
        &mut self,
        speaker: Speaker,
        text: &str,
        tone_hint: Option<Tone>,
    ) -> ConversationEntry {
        self.add_entry_at(speaker, text, tone_hint, Utc::now())
    }

    pub fn add_entry_at(
        &mut self,
        speaker: Speaker,
        text: &str,
        tone_hint: Option<Tone>,
        at: DateTime<Utc>,
    ) -> ConversationEntry {
        self.insert(speaker, text, tone_hint, None, at)
    }

    /// Record a message carrying media. An outbound photo becomes the sticky topic.
    pub fn add_entry_with_media(
        &mut self,
        speaker: Speaker,
        text: &str,
        tone_hint: Option<Tone>,
        media: MediaAttachment,
        at: DateTime<Utc>,
    ) -> ConversationEntry {
        self.insert(speaker, text, tone_hint, Some(media), at)
    }

    fn insert(
        &mut self,
        speaker: Speaker,
        text: &str,
        tone_hint: Option<Tone>,
        media: Option<MediaAttachment>,
        at: DateTime<Utc>,
    ) -> ConversationEntry {
        let (tone, tone_source) = match tone_hint {
            Some(tone) => (tone, ToneSource::Explicit),
            None => (infer_tone(text), ToneSource::Inferred),
        };

        let photo_topic = media.as_ref().filter(|m| m.is_photo()).map(|m| m.topic());
        let topic = match &photo_topic {
            Some(topic) => topic.clone(),
            None => infer_topic(text),
        };

        if speaker == Speaker::Companion {
            if let Some(topic) = photo_topic {
                tracing::debug!("Pinning sticky topic: {}", topic);
                self.sticky = Some(topic);
            }
        } else {
            self.last_inbound_at = Some(at);
        }

        if let Some(prev) = self.entries.back() {
            if prev.tone != tone {
                if self.transitions.len() >= self.config.emotion_flow_len {
                    self.transitions.pop_front();
                }
                if self.config.emotion_flow_len > 0 {
                    self.transitions.push_back(ToneTransition {
                        from: prev.tone,
                        to: tone,
                        at,
                    });
                }
            }
        }

        let entry = ConversationEntry {
            speaker,
            text: text.to_string(),
            tone,
            tone_source,
            topic,
            media,
            timestamp: at,
        };

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.clone());

        self.recompute();
        entry
    }

    /// Latest snapshot (a copy; recomputed on every insertion).
    pub fn snapshot(&self) -> ConversationContextSnapshot {
        self.snapshot.clone()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear_sticky_topic(&mut self) {
        if self.sticky.take().is_some() {
            self.recompute();
        }
    }

    pub fn last_inbound_at(&self) -> Option<DateTime<Utc>> {
        self.last_inbound_at
    }

    fn recent(&self, window: usize) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(window))
    }

    fn recompute(&mut self) {
        let (current_topic, topic_continuity_score, sticky_topic) = match &self.sticky {
            Some(topic) => (topic.clone(), self.config.topic_window, true),
            None => {
                let (topic, score) = self.topic_continuity();
                (topic, score, false)
            }
        };

        self.snapshot = ConversationContextSnapshot {
            current_tone: self.current_tone(),
            current_topic,
            topic_continuity_score,
            flow_pattern: self.flow_pattern(),
            emotion_flow: self.transitions.iter().copied().collect(),
            sticky_topic,
            entry_count: self.entries.len(),
            last_inbound_at: self.last_inbound_at,
        };
    }

    fn current_tone(&self) -> Tone {
        let window: Vec<&ConversationEntry> = self.recent(self.config.tone_window).collect();
        let latest = |source: ToneSource| {
            window
                .iter()
                .rev()
                .find(|e| e.tone_source == source && !e.tone.is_neutral())
                .map(|e| e.tone)
        };
        latest(ToneSource::Explicit)
            .or_else(|| latest(ToneSource::Inferred))
            .unwrap_or(Tone::Neutral)
    }

    /// Dominant topic of the topic window and its repeat count (0 if nothing
    /// repeats). Ties go to the most recently seen topic.
    fn topic_continuity(&self) -> (Topic, usize) {
        let window: Vec<&Topic> = self
            .recent(self.config.topic_window)
            .map(|e| &e.topic)
            .filter(|t| !t.is_generic())
            .collect();

        let mut best: Option<(&Topic, usize)> = None;
        for topic in window.iter().rev() {
            let count = window.iter().filter(|t| *t == topic).count();
            if best.map_or(true, |(_, b)| count > b) {
                best = Some((*topic, count));
            }
        }

        match best {
            Some((topic, count)) if count >= 2 => (topic.clone(), count),
            Some((topic, _)) => (topic.clone(), 0),
            None => (Topic::General, 0),
        }
    }

    fn flow_pattern(&self) -> FlowPattern {
        let window: Vec<&ConversationEntry> = self.recent(self.config.flow_window).collect();
        let n = window.len();
        if n == 0 {
            return FlowPattern::Normal;
        }

        let rapid = window
            .windows(2)
            .filter(|pair| {
                let gap = (pair[1].timestamp - pair[0].timestamp).num_seconds();
                (0..=self.config.rapid_gap_secs).contains(&gap)
            })
            .count();
        if rapid >= self.config.rapid_min_count {
            return FlowPattern::Rapid;
        }

        // max(1, ceil((n - 1) / 2))
        let threshold = (n / 2).max(1);
        let charged = window.iter().filter(|e| e.tone.is_emotionally_charged()).count();
        if charged >= threshold {
            return FlowPattern::Emotional;
        }
        let playful = window.iter().filter(|e| e.tone.is_playful()).count();
        if playful >= threshold {
            return FlowPattern::Playful;
        }

        FlowPattern::Normal
    }
}
