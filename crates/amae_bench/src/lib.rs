//! amae_bench: trajectory simulations for the affect engine.
//!
//! Validates behavior over long simulated time spans:
//! - 72h of silence (residue recovery, escalation to worried)
//! - Decay hints (lingering vs fleeting residue)
//! - Phase-scaled escalation (different cycle phases → different timelines)
//! - Missed heartbeats (bounded catch-up)

use amae_core::{EmotionVector, EscalationConfig, ResidueConfig};
use amae_limbic::{EscalationLevel, EscalationMachine, ResidueStore};
use chrono::{DateTime, Duration, Utc};

/// One point of a simulated trajectory.
#[derive(Debug, Clone)]
pub struct Sample {
    pub at: DateTime<Utc>,
    pub emotions: EmotionVector,
    pub level: EscalationLevel,
}

/// Simulate `total` of silence in `step` increments, ticking both the
/// residue and the escalation machine at every step.
pub fn simulate_silence(
    residue: &mut ResidueStore,
    escalation: &mut EscalationMachine,
    start: DateTime<Utc>,
    total: Duration,
    step: Duration,
    coefficient: f64,
) -> Vec<Sample> {
    let steps = (total.num_seconds() / step.num_seconds().max(1)).max(0);
    let mut trajectory = Vec::with_capacity(steps as usize);
    let mut now = start;
    for _ in 0..steps {
        now += step;
        residue.decay_tick_at(now);
        escalation.tick_at(now, coefficient);
        trajectory.push(Sample {
            at: now,
            emotions: residue.snapshot(),
            level: escalation.level(),
        });
    }
    trajectory
}

/// First sample at which `level` was reached, as silence since `start`.
pub fn time_to_level(
    trajectory: &[Sample],
    start: DateTime<Utc>,
    level: EscalationLevel,
) -> Option<Duration> {
    trajectory
        .iter()
        .find(|s| s.level >= level)
        .map(|s| s.at - start)
}

/// Fresh residue store and escalation machine, both anchored at `start`.
pub fn fresh(
    residue: ResidueConfig,
    escalation: &EscalationConfig,
    start: DateTime<Utc>,
) -> (ResidueStore, EscalationMachine) {
    let mut store = ResidueStore::new(residue);
    store.decay_tick_at(start);
    (store, EscalationMachine::new(escalation, start))
}
