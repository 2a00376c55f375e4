//! # Amae Limbic
//!
//! The time-driven half of the affect engine:
//!
//! - **Residue**: decaying per-axis emotional intensity with an affection floor
//! - **Escalation**: growing impatience during silence, scaled by the cycle phase
//! - **Heartbeat**: the `Tick` abstraction behind the decay/escalation timers
//! - **System**: `AffectEngine`, the single owner tying everything together,
//!   with snapshot broadcast and cache mirroring
//!
//! ## Time Scales
//!
//! - Minutes: escalation polling, tone quiet period
//! - Hours: residue recovery, escalation thresholds
//! - Days: long silences saturate at `Worried`; decay catch-up is capped

pub mod escalation;
mod heartbeat;
mod mirror;
pub mod prompt;
pub mod residue;
mod retry;
mod snapshot;
mod system;

pub use escalation::{EscalationLevel, EscalationMachine, EscalationState, EscalationTransition};
pub use heartbeat::{HeartbeatConfig, Tick, TickContext};
pub use mirror::MirrorWriter;
pub use residue::{DecayHint, ResidueStore};
pub use retry::RetryConfig;
pub use snapshot::EngineSnapshot;
pub use system::{AffectEngine, AffectEngineBuilder, InboundMessage, OutboundMessage};
