//! # Amae Context
//!
//! Short-term conversational memory: a bounded window of recent messages and
//! the tone, topic and flow metrics derived from it.

pub mod infer;
pub mod tracker;

pub use infer::{infer_tone, infer_topic, Topic};
pub use tracker::{
    ConversationContextSnapshot, ConversationEntry, ConversationTracker, FlowPattern,
    MediaAttachment, MediaKind, Speaker, ToneSource, ToneTransition,
};
