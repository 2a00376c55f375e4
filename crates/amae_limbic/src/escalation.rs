//! Escalation State Machine
//!
//! "Growing impatience" while the counterpart stays silent:
//!
//! ```text
//! Calm --T1--> Level1 --T2--> Level2 --T3--> Level3 --T4--> Worried
//!   ^                                                          |
//!   +------------------ reset on inbound interaction ----------+
//! ```
//!
//! Each threshold is measured from the last inbound interaction and scaled
//! by the coefficient of the current cyclical phase. The level only ever
//! rises until the next reset.

use amae_core::{CyclePhase, EscalationConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    #[default]
    Calm,
    Level1,
    Level2,
    Level3,
    Worried,
}

impl EscalationLevel {
    pub const ALL: [EscalationLevel; 5] = [
        EscalationLevel::Calm,
        EscalationLevel::Level1,
        EscalationLevel::Level2,
        EscalationLevel::Level3,
        EscalationLevel::Worried,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationLevel::Calm => "calm",
            EscalationLevel::Level1 => "level1",
            EscalationLevel::Level2 => "level2",
            EscalationLevel::Level3 => "level3",
            EscalationLevel::Worried => "worried",
        }
    }

    /// 0 for calm up to 4 for worried.
    pub fn rank(&self) -> usize {
        *self as usize
    }

    fn from_rank(rank: usize) -> Self {
        Self::ALL[rank.min(Self::ALL.len() - 1)]
    }

    pub fn is_terminal(&self) -> bool {
        *self == EscalationLevel::Worried
    }
}

impl fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationState {
    pub level: EscalationLevel,
    pub last_interaction_at: DateTime<Utc>,
    pub cycle_phase: Option<CyclePhase>,
    pub level_since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EscalationTransition {
    pub from: EscalationLevel,
    pub to: EscalationLevel,
    /// Silence at the moment of the transition.
    pub silence: chrono::Duration,
    pub at: DateTime<Utc>,
}

pub struct EscalationMachine {
    thresholds: [Duration; 4],
    state: EscalationState,
}

impl EscalationMachine {
    /// Start calm, counting silence from `now`. Thresholds that are not
    /// strictly ascending fall back to the defaults.
    pub fn new(config: &EscalationConfig, now: DateTime<Utc>) -> Self {
        let secs = if config.thresholds_valid() {
            config.thresholds_secs
        } else {
            let fallback = EscalationConfig::default().thresholds_secs;
            tracing::warn!(
                "Invalid escalation thresholds {:?}, using defaults {:?}",
                config.thresholds_secs,
                fallback
            );
            fallback
        };

        Self {
            thresholds: secs.map(Duration::from_secs),
            state: EscalationState {
                level: EscalationLevel::Calm,
                last_interaction_at: now,
                cycle_phase: config.fixed_phase,
                level_since: now,
            },
        }
    }

    pub fn level(&self) -> EscalationLevel {
        self.state.level
    }

    pub fn state(&self) -> &EscalationState {
        &self.state
    }

    /// Unscaled base thresholds.
    pub fn thresholds(&self) -> [Duration; 4] {
        self.thresholds
    }

    pub fn scaled_thresholds(&self, coefficient: f64) -> [Duration; 4] {
        let coefficient = sanitize_coefficient(coefficient);
        self.thresholds.map(|t| t.mul_f64(coefficient))
    }

    pub fn set_phase(&mut self, phase: Option<CyclePhase>) {
        self.state.cycle_phase = phase;
    }

    /// Inbound interaction: back to calm whatever the level.
    /// Returns the level that was left.
    pub fn reset_at(&mut self, now: DateTime<Utc>) -> EscalationLevel {
        let previous = self.state.level;
        if previous != EscalationLevel::Calm {
            tracing::info!("Escalation reset: {} -> calm", previous);
            self.state.level_since = now;
        }
        self.state.level = EscalationLevel::Calm;
        self.state.last_interaction_at = now;
        previous
    }

    pub fn silence_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.state.last_interaction_at).max(chrono::Duration::zero())
    }

    /// Level the elapsed silence alone would justify.
    pub fn level_for(&self, now: DateTime<Utc>, coefficient: f64) -> EscalationLevel {
        let silence = self.silence_at(now).to_std().unwrap_or_default();
        let reached = self
            .scaled_thresholds(coefficient)
            .iter()
            .take_while(|t| silence >= **t)
            .count();
        EscalationLevel::from_rank(reached)
    }

    /// Poll elapsed silence. Returns the transition if the level rose.
    pub fn tick_at(
        &mut self,
        now: DateTime<Utc>,
        coefficient: f64,
    ) -> Option<EscalationTransition> {
        let computed = self.level_for(now, coefficient);
        let from = self.state.level;
        let to = from.max(computed);
        if to == from {
            return None;
        }

        self.state.level = to;
        self.state.level_since = now;
        let silence = self.silence_at(now);
        tracing::info!(
            "Escalation {} -> {} after {}m of silence (coefficient {:.2})",
            from,
            to,
            silence.num_minutes(),
            coefficient
        );
        Some(EscalationTransition {
            from,
            to,
            silence,
            at: now,
        })
    }

    /// Time left until the next level, if any.
    pub fn time_to_next(&self, now: DateTime<Utc>, coefficient: f64) -> Option<Duration> {
        if self.state.level.is_terminal() {
            return None;
        }
        let next = self.scaled_thresholds(coefficient)[self.state.level.rank()];
        let silence = self.silence_at(now).to_std().unwrap_or_default();
        Some(next.saturating_sub(silence))
    }

    /// Adopt a previously mirrored state.
    pub fn restore(&mut self, state: EscalationState) {
        self.state = state;
    }
}

fn sanitize_coefficient(coefficient: f64) -> f64 {
    if coefficient.is_finite() && coefficient > 0.0 {
        coefficient
    } else {
        1.0
    }
}
