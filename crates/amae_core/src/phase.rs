//! Cyclical phase signal
//!
//! An external collaborator reports which of four phases the companion is in.
//! The escalation machine scales its silence thresholds by a per-phase
//! coefficient: below 1.0 escalates sooner, above 1.0 later.

use crate::error::UnknownLabel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl CyclePhase {
    pub const ALL: [CyclePhase; 4] = [
        CyclePhase::Menstrual,
        CyclePhase::Follicular,
        CyclePhase::Ovulatory,
        CyclePhase::Luteal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CyclePhase::Menstrual => "menstrual",
            CyclePhase::Follicular => "follicular",
            CyclePhase::Ovulatory => "ovulatory",
            CyclePhase::Luteal => "luteal",
        }
    }

    /// Built-in threshold coefficient, used when config does not override it.
    pub fn default_coefficient(&self) -> f64 {
        match self {
            CyclePhase::Menstrual => 0.8,
            CyclePhase::Follicular => 1.2,
            CyclePhase::Ovulatory => 1.0,
            CyclePhase::Luteal => 0.7,
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CyclePhase {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CyclePhase::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| UnknownLabel {
                kind: "cycle phase",
                label: s.to_string(),
            })
    }
}

/// Read-only accessor for the current phase.
///
/// `None` means the signal is unavailable; callers fall back to a neutral
/// coefficient of 1.0.
pub trait PhaseSource: Send + Sync {
    fn current_phase(&self) -> Option<CyclePhase>;
}

/// No phase signal at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPhase;

impl PhaseSource for NoPhase {
    fn current_phase(&self) -> Option<CyclePhase> {
        None
    }
}

/// A phase that never changes.
#[derive(Debug, Clone, Copy)]
pub struct FixedPhase(pub CyclePhase);

impl PhaseSource for FixedPhase {
    fn current_phase(&self) -> Option<CyclePhase> {
        Some(self.0)
    }
}

/// A phase another component can update at runtime.
#[derive(Debug, Clone, Default)]
pub struct SharedPhase {
    inner: Arc<RwLock<Option<CyclePhase>>>,
}

impl SharedPhase {
    pub fn new(phase: Option<CyclePhase>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(phase)),
        }
    }

    pub fn set(&self, phase: Option<CyclePhase>) {
        match self.inner.write() {
            Ok(mut guard) => *guard = phase,
            Err(e) => tracing::warn!("Phase lock poisoned, update dropped: {}", e),
        }
    }
}

impl PhaseSource for SharedPhase {
    fn current_phase(&self) -> Option<CyclePhase> {
        self.inner.read().map(|g| *g).unwrap_or(None)
    }
}
