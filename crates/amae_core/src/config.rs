use crate::mood::MoodCategory;
use crate::phase::CyclePhase;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AmaeConfig {
    pub normalizer: NormalizerConfig,
    pub residue: ResidueConfig,
    pub conversation: ConversationConfig,
    pub escalation: EscalationConfig,
    pub engine: EngineConfig,
    pub mirror: MirrorConfig,
}

impl AmaeConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: AmaeConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("AMAE_FUZZY_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.normalizer.fuzzy_threshold = n;
            }
        }
        if let Ok(v) = std::env::var("AMAE_RECOVERY_RATE") {
            if let Ok(n) = v.parse() {
                self.residue.recovery_rate = n;
            }
        }
        if let Ok(v) = std::env::var("AMAE_DECAY_INTERVAL_SECS") {
            if let Ok(n) = v.parse() {
                self.residue.decay_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("AMAE_ESCALATION_TICK_SECS") {
            if let Ok(n) = v.parse() {
                self.escalation.tick_interval_secs = n;
            }
        }
        if let Ok(v) = std::env::var("AMAE_PHASE") {
            match v.parse::<CyclePhase>() {
                Ok(phase) => self.escalation.fixed_phase = Some(phase),
                Err(e) => tracing::warn!("Ignoring AMAE_PHASE: {}", e),
            }
        }
        if let Ok(v) = std::env::var("AMAE_MIRROR_KEY") {
            self.mirror.enabled = true;
            self.mirror.key = v;
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Fuzzy matches must be strictly above this similarity.
    pub fuzzy_threshold: f64,
    /// Largest char-length difference accepted by the partial matcher.
    pub partial_max_len_diff: usize,
    /// Numeric scores above this are joy.
    pub score_high: f64,
    /// Numeric scores below this are sadness.
    pub score_low: f64,
    pub default_category: MoodCategory,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.70,
            partial_max_len_diff: 2,
            score_high: 0.7,
            score_low: 0.3,
            default_category: MoodCategory::Calm,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResidueConfig {
    /// Subtracted from every axis but affection, once per decay interval.
    pub recovery_rate: f32,
    pub decay_interval_secs: u64,
    /// Most intervals a single late tick may catch up on.
    pub max_catch_up_intervals: u32,
    pub affection_floor: f32,
    /// Dominant axis must reach this before it colors the tone.
    pub tone_threshold: f32,
    /// Tone reverts to neutral after this long without a recorded event.
    pub tone_quiet_period_secs: u64,
}

impl Default for ResidueConfig {
    fn default() -> Self {
        Self {
            recovery_rate: 5.0,
            decay_interval_secs: 3600,
            max_catch_up_intervals: 24,
            affection_floor: 50.0,
            tone_threshold: 20.0,
            tone_quiet_period_secs: 30 * 60,
        }
    }
}

impl ResidueConfig {
    pub fn decay_interval(&self) -> Duration {
        Duration::from_secs(self.decay_interval_secs.max(1))
    }

    pub fn tone_quiet_period(&self) -> Duration {
        Duration::from_secs(self.tone_quiet_period_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// FIFO capacity.
    pub capacity: usize,
    /// Window for current tone.
    pub tone_window: usize,
    /// Window for topic continuity.
    pub topic_window: usize,
    /// Window for flow pattern classification.
    pub flow_window: usize,
    /// An entry within this many seconds of its predecessor counts as rapid.
    pub rapid_gap_secs: i64,
    pub rapid_min_count: usize,
    /// Tone transitions kept in the snapshot.
    pub emotion_flow_len: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            tone_window: 5,
            topic_window: 3,
            flow_window: 5,
            rapid_gap_secs: 60,
            rapid_min_count: 2,
            emotion_flow_len: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Base silence thresholds for Level1, Level2, Level3 and Worried.
    pub thresholds_secs: [u64; 4],
    /// How often elapsed silence is polled.
    pub tick_interval_secs: u64,
    pub phase_coefficients: PhaseCoefficients,
    /// Use this phase instead of asking a phase source.
    pub fixed_phase: Option<CyclePhase>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            thresholds_secs: [3600, 3 * 3600, 6 * 3600, 12 * 3600],
            tick_interval_secs: 300,
            phase_coefficients: PhaseCoefficients::default(),
            fixed_phase: None,
        }
    }
}

impl EscalationConfig {
    /// Thresholds must be non-zero and strictly ascending.
    pub fn thresholds_valid(&self) -> bool {
        self.thresholds_secs[0] > 0 && self.thresholds_secs.windows(2).all(|w| w[0] < w[1])
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhaseCoefficients {
    pub menstrual: f64,
    pub follicular: f64,
    pub ovulatory: f64,
    pub luteal: f64,
}

impl Default for PhaseCoefficients {
    fn default() -> Self {
        Self {
            menstrual: CyclePhase::Menstrual.default_coefficient(),
            follicular: CyclePhase::Follicular.default_coefficient(),
            ovulatory: CyclePhase::Ovulatory.default_coefficient(),
            luteal: CyclePhase::Luteal.default_coefficient(),
        }
    }
}

impl PhaseCoefficients {
    /// Coefficient for a phase; `None` (signal unavailable) is 1.0.
    /// Non-positive or non-finite configured values also fall back to 1.0.
    pub fn coefficient(&self, phase: Option<CyclePhase>) -> f64 {
        let raw = match phase {
            None => return 1.0,
            Some(CyclePhase::Menstrual) => self.menstrual,
            Some(CyclePhase::Follicular) => self.follicular,
            Some(CyclePhase::Ovulatory) => self.ovulatory,
            Some(CyclePhase::Luteal) => self.luteal,
        };
        if raw.is_finite() && raw > 0.0 {
            raw
        } else {
            tracing::warn!("Invalid coefficient {} for phase {:?}, using 1.0", raw, phase);
            1.0
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Feed the inferred tone of inbound messages into the residue store.
    pub feed_inbound_tone: bool,
    /// Magnitude used when a mood is recorded without one.
    pub default_mood_magnitude: f32,
    /// Magnitude of an inbound message tone absorbed into the residue.
    pub inbound_tone_magnitude: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feed_inbound_tone: true,
            default_mood_magnitude: 20.0,
            inbound_tone_magnitude: 8.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub enabled: bool,
    pub key: String,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_factor: f64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key: "amae:state".to_string(),
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            backoff_factor: 2.0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AmaeConfig::default();
        assert!((cfg.normalizer.fuzzy_threshold - 0.70).abs() < 1e-9);
        assert_eq!(cfg.normalizer.default_category, MoodCategory::Calm);
        assert_eq!(cfg.residue.affection_floor, 50.0);
        assert_eq!(cfg.conversation.capacity, 10);
        assert!(cfg.escalation.thresholds_valid());
        assert!(!cfg.mirror.enabled);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[residue]
recovery_rate = 2.5
"#;
        let cfg: AmaeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.residue.recovery_rate, 2.5);
        // Defaults for unspecified fields
        assert_eq!(cfg.residue.decay_interval_secs, 3600);
        assert_eq!(cfg.escalation.tick_interval_secs, 300);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[normalizer]
fuzzy_threshold = 0.8
partial_max_len_diff = 1
default_category = "sulky"

[residue]
recovery_rate = 3.0
decay_interval_secs = 1800
affection_floor = 40.0
tone_quiet_period_secs = 600

[conversation]
capacity = 20
rapid_gap_secs = 30

[escalation]
thresholds_secs = [600, 1200, 2400, 4800]
tick_interval_secs = 60
fixed_phase = "luteal"

[escalation.phase_coefficients]
luteal = 0.5

[engine]
feed_inbound_tone = false

[mirror]
enabled = true
key = "companion:42"
max_attempts = 5
"#;
        let cfg: AmaeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.normalizer.default_category, MoodCategory::Sulky);
        assert_eq!(cfg.normalizer.partial_max_len_diff, 1);
        assert_eq!(cfg.residue.decay_interval(), Duration::from_secs(1800));
        assert_eq!(cfg.conversation.capacity, 20);
        assert_eq!(cfg.escalation.thresholds_secs, [600, 1200, 2400, 4800]);
        assert_eq!(cfg.escalation.fixed_phase, Some(CyclePhase::Luteal));
        assert_eq!(
            cfg.escalation.phase_coefficients.coefficient(Some(CyclePhase::Luteal)),
            0.5
        );
        // untouched phases keep their defaults
        assert_eq!(
            cfg.escalation.phase_coefficients.coefficient(Some(CyclePhase::Follicular)),
            1.2
        );
        assert!(!cfg.engine.feed_inbound_tone);
        assert!(cfg.mirror.enabled);
        assert_eq!(cfg.mirror.key, "companion:42");
    }

    #[test]
    fn test_invalid_thresholds_detected() {
        let mut cfg = EscalationConfig::default();
        cfg.thresholds_secs = [600, 600, 1200, 2400];
        assert!(!cfg.thresholds_valid());
        cfg.thresholds_secs = [0, 600, 1200, 2400];
        assert!(!cfg.thresholds_valid());
    }

    #[test]
    fn test_coefficient_fallbacks() {
        let mut coeffs = PhaseCoefficients::default();
        assert_eq!(coeffs.coefficient(None), 1.0);
        coeffs.menstrual = -2.0;
        assert_eq!(coeffs.coefficient(Some(CyclePhase::Menstrual)), 1.0);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("AMAE_FUZZY_THRESHOLD", "0.9");
        std::env::set_var("AMAE_PHASE", "follicular");

        let mut cfg = AmaeConfig::default();
        cfg.apply_env_overrides();

        assert!((cfg.normalizer.fuzzy_threshold - 0.9).abs() < 1e-9);
        assert_eq!(cfg.escalation.fixed_phase, Some(CyclePhase::Follicular));

        // Clean up env vars before testing defaults
        std::env::remove_var("AMAE_FUZZY_THRESHOLD");
        std::env::remove_var("AMAE_PHASE");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = AmaeConfig::load_or_default("/nonexistent/path.toml");
        assert!((cfg.normalizer.fuzzy_threshold - 0.70).abs() < 1e-9);
        assert_eq!(cfg.escalation.fixed_phase, None);
    }
}
