//! Heartbeat of the affect engine
//!
//! Two clocks keep the state moving without any message traffic: residue
//! decay (hourly) and escalation polling (every few minutes). Both are plain
//! `Tick` implementations, so tests can drive them with explicit timestamps
//! instead of waiting on timers.

use crate::escalation::EscalationMachine;
use crate::residue::ResidueStore;
use amae_core::{AmaeConfig, CyclePhase};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Inputs shared by every tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub now: DateTime<Utc>,
    pub phase: Option<CyclePhase>,
    /// Threshold coefficient of `phase`.
    pub phase_coefficient: f64,
}

impl TickContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            phase: None,
            phase_coefficient: 1.0,
        }
    }
}

/// A time-driven state update. Ticks may be skipped or delayed; each
/// implementation catches up from the timestamp it is given.
pub trait Tick {
    fn name(&self) -> &'static str;

    /// Returns whether the state changed.
    fn tick(&mut self, ctx: &TickContext) -> bool;
}

impl Tick for ResidueStore {
    fn name(&self) -> &'static str {
        "decay"
    }

    fn tick(&mut self, ctx: &TickContext) -> bool {
        self.decay_tick_at(ctx.now)
    }
}

impl Tick for EscalationMachine {
    fn name(&self) -> &'static str {
        "escalation"
    }

    fn tick(&mut self, ctx: &TickContext) -> bool {
        self.set_phase(ctx.phase);
        self.tick_at(ctx.now, ctx.phase_coefficient).is_some()
    }
}

/// Timer periods of the background loops.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    pub decay_interval: Duration,
    pub escalation_interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self::from_config(&AmaeConfig::default())
    }
}

impl HeartbeatConfig {
    pub fn from_config(config: &AmaeConfig) -> Self {
        Self {
            decay_interval: config.residue.decay_interval(),
            escalation_interval: config.escalation.tick_interval(),
        }
    }

    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            decay_interval: Duration::from_millis(10),
            escalation_interval: Duration::from_millis(10),
        }
    }
}
