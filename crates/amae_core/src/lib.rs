//! # Amae Core
//!
//! Shared vocabulary of the affect engine: the canonical mood set and its
//! normalizer, the six-axis emotion residue, conversational tones, the
//! cyclical phase signal, the cache mirror seam and configuration.

pub mod config;
pub mod emotion;
pub mod error;
pub mod mirror;
pub mod mood;
pub mod phase;

pub use config::{
    AmaeConfig, ConversationConfig, EngineConfig, EscalationConfig, MirrorConfig,
    NormalizerConfig, PhaseCoefficients, ResidueConfig,
};
pub use emotion::{EmotionAxis, EmotionEvent, EmotionVector, Tone};
pub use error::{MirrorError, UnknownLabel};
pub use mirror::{CacheMirror, MemoryMirror, NoopMirror, OfflineMirror};
pub use mood::{MatchKind, MoodCategory, MoodNormalizer, RawMoodInput, Valence};
pub use phase::{CyclePhase, FixedPhase, NoPhase, PhaseSource, SharedPhase};
