//! Residue Store
//!
//! Emotional residue left behind by events, one scalar per axis. Residue fades
//! by a fixed recovery amount per decay interval, counted for each axis from
//! its latest stimulation; affection is held at a floor instead of fading. A
//! coarse tone is derived from the dominant axis and falls back to neutral
//! after a quiet period without events.

use amae_core::{EmotionAxis, EmotionEvent, EmotionVector, MoodCategory, ResidueConfig, Tone};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How quickly a freshly recorded residue fades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayHint {
    #[default]
    Normal,
    /// Half the recovery rate.
    Lingering,
    /// Twice the recovery rate.
    Fleeting,
}

impl DecayHint {
    pub fn multiplier(&self) -> f32 {
        match self {
            DecayHint::Normal => 1.0,
            DecayHint::Lingering => 0.5,
            DecayHint::Fleeting => 2.0,
        }
    }
}

pub struct ResidueStore {
    config: ResidueConfig,
    emotions: EmotionVector,
    /// Per-axis hint, cleared once the axis is back at zero.
    hints: HashMap<EmotionAxis, DecayHint>,
    /// Tone dictated directly by the latest event (e.g. cherished).
    tone_override: Option<Tone>,
    last_event_at: Option<DateTime<Utc>>,
    /// Per-axis start of the current, not yet applied, decay interval.
    /// Present for every non-affection axis above zero once it was recorded
    /// or ticked.
    anchors: HashMap<EmotionAxis, DateTime<Utc>>,
}

impl Default for ResidueStore {
    fn default() -> Self {
        Self::new(ResidueConfig::default())
    }
}

impl ResidueStore {
    pub fn new(config: ResidueConfig) -> Self {
        Self {
            emotions: EmotionVector::with_affection(config.affection_floor),
            hints: HashMap::new(),
            tone_override: None,
            last_event_at: None,
            anchors: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ResidueConfig {
        &self.config
    }

    /// Add `magnitude` to one axis.
    pub fn record(&mut self, axis: EmotionAxis, magnitude: f32, hint: DecayHint) {
        self.record_at(axis, magnitude, hint, Utc::now());
    }

    pub fn record_at(
        &mut self,
        axis: EmotionAxis,
        magnitude: f32,
        hint: DecayHint,
        now: DateTime<Utc>,
    ) {
        self.apply(axis, magnitude, hint, now);
        self.touch(now, None);
    }

    pub fn record_event(&mut self, event: EmotionEvent) {
        self.record_event_at(event, Utc::now());
    }

    pub fn record_event_at(&mut self, event: EmotionEvent, now: DateTime<Utc>) {
        for (axis, delta) in event.impulses() {
            self.apply(axis, delta, DecayHint::Normal, now);
        }
        tracing::debug!("Recorded {:?}: {}", event, self.emotions.describe());
        self.touch(now, event.tone_override());
    }

    /// Write a normalized mood into the residue. Moods without a residue
    /// impulse (calm, drowsy) still count as an event for the tone clock.
    pub fn record_mood_at(&mut self, mood: MoodCategory, magnitude: f32, now: DateTime<Utc>) {
        if let Some((axis, weight)) = mood.residue_impulse() {
            self.apply(axis, magnitude * weight, DecayHint::Normal, now);
        }
        self.touch(now, None);
    }

    pub fn record_mood(&mut self, mood: MoodCategory, magnitude: f32) {
        self.record_mood_at(mood, magnitude, Utc::now());
    }

    /// Settle the axis's pending decay up to `now`, then add `delta`. A
    /// positive delta restarts the axis's interval at `now`.
    fn apply(&mut self, axis: EmotionAxis, delta: f32, hint: DecayHint, now: DateTime<Utc>) {
        if axis != EmotionAxis::Affection {
            self.settle(axis, now);
        }
        let value = self.emotions.add(axis, delta);
        if value <= 0.0 {
            self.hints.remove(&axis);
            self.anchors.remove(&axis);
        } else if delta > 0.0 {
            self.hints.insert(axis, hint);
            if axis != EmotionAxis::Affection {
                self.anchors.insert(axis, now);
            }
        }
    }

    fn touch(&mut self, now: DateTime<Utc>, tone_override: Option<Tone>) {
        self.last_event_at = Some(now);
        self.tone_override = tone_override;
    }

    pub fn decay_tick(&mut self) -> bool {
        self.decay_tick_at(Utc::now())
    }

    /// Apply recovery for every whole interval elapsed since each axis's
    /// anchor. Returns whether anything was subtracted.
    pub fn decay_tick_at(&mut self, now: DateTime<Utc>) -> bool {
        self.enforce_affection_floor();

        let mut changed = false;
        for axis in EmotionAxis::ALL {
            if axis == EmotionAxis::Affection || self.emotions.get(axis) <= 0.0 {
                continue;
            }
            if self.anchors.contains_key(&axis) {
                changed |= self.settle(axis, now);
            } else {
                self.anchors.insert(axis, now);
            }
        }

        tracing::trace!("Decay tick: {}", self.emotions.describe());
        changed
    }

    /// Subtract recovery for the whole intervals between the axis's anchor
    /// and `now`, and move the anchor forward by as many intervals.
    fn settle(&mut self, axis: EmotionAxis, now: DateTime<Utc>) -> bool {
        let Some(anchor) = self.anchors.get(&axis).copied() else {
            return false;
        };

        let interval = self.config.decay_interval_secs.max(1) as i64;
        let elapsed = (now - anchor).num_seconds();
        if elapsed < interval {
            return false;
        }

        let intervals = elapsed / interval;
        let applied = intervals.min(self.config.max_catch_up_intervals.max(1) as i64) as f32;
        if intervals as f32 > applied {
            tracing::debug!(
                "Decay of {} fell {} intervals behind, catching up on {}",
                axis,
                intervals,
                applied
            );
        }

        let before = self.emotions.get(axis);
        let hint = self.hints.get(&axis).copied().unwrap_or_default();
        let amount = self.config.recovery_rate.max(0.0) * hint.multiplier() * applied;
        let after = self.emotions.add(axis, -amount);
        if after <= 0.0 {
            self.hints.remove(&axis);
            self.anchors.remove(&axis);
        } else {
            self.anchors
                .insert(axis, anchor + Duration::seconds(intervals * interval));
        }
        after < before
    }

    fn enforce_affection_floor(&mut self) {
        if self.emotions.affection < self.config.affection_floor {
            self.emotions
                .set(EmotionAxis::Affection, self.config.affection_floor);
        }
    }

    /// Copy of the current vector.
    pub fn snapshot(&self) -> EmotionVector {
        self.emotions
    }

    pub fn tone(&self) -> Tone {
        self.tone_at(Utc::now())
    }

    /// Tone as of `now`: neutral once the quiet period has passed since the
    /// last event, otherwise the event's own tone or the dominant axis.
    pub fn tone_at(&self, now: DateTime<Utc>) -> Tone {
        let Some(last) = self.last_event_at else {
            return Tone::Neutral;
        };
        let quiet = self.config.tone_quiet_period_secs as i64;
        if (now - last).num_seconds() >= quiet {
            return Tone::Neutral;
        }
        if let Some(tone) = self.tone_override {
            return tone;
        }
        let (axis, value) = self.emotions.dominant();
        if value >= self.config.tone_threshold {
            axis.tone()
        } else {
            Tone::Neutral
        }
    }

    pub fn last_event_at(&self) -> Option<DateTime<Utc>> {
        self.last_event_at
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Replace the vector, e.g. with one reloaded from the cache mirror.
    pub fn restore(&mut self, mut emotions: EmotionVector, last_event_at: Option<DateTime<Utc>>) {
        emotions.normalize();
        self.emotions = emotions;
        self.hints.clear();
        self.tone_override = None;
        self.last_event_at = last_event_at;
        self.anchors.clear();
        if let Some(at) = last_event_at {
            for axis in EmotionAxis::ALL {
                if axis != EmotionAxis::Affection && self.emotions.get(axis) > 0.0 {
                    self.anchors.insert(axis, at);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let store = ResidueStore::default();
        let v = store.snapshot();
        assert_eq!(v.affection, 50.0);
        assert_eq!(v.sadness, 0.0);
        assert_eq!(store.tone_at(t0()), Tone::Neutral);
    }

    #[test]
    fn test_event_table() {
        let mut store = ResidueStore::default();
        store.record_event_at(EmotionEvent::Hurt, t0());
        store.record_event_at(EmotionEvent::Excited, t0());
        store.record_event_at(EmotionEvent::Lonely, t0());
        store.record_event_at(EmotionEvent::Rejected, t0());
        store.record_event_at(EmotionEvent::Worried, t0());
        store.record_event_at(EmotionEvent::Cherished, t0());
        let v = store.snapshot();
        assert_eq!(v.hurt, 30.0);
        assert_eq!(v.happiness, 25.0);
        assert_eq!(v.longing, 20.0);
        assert_eq!(v.sadness, 20.0);
        assert_eq!(v.anxiety, 20.0);
        assert_eq!(v.affection, 65.0);

        store.record_event_at(EmotionEvent::Comforted, t0());
        let v = store.snapshot();
        assert_eq!(v.sadness, 5.0);
        assert_eq!(v.anxiety, 10.0);
    }

    #[test]
    fn test_reunion_relieves_longing() {
        let mut store = ResidueStore::default();
        store.record_event_at(EmotionEvent::Lonely, t0());
        store.record_event_at(EmotionEvent::Reunion { magnitude: 40.0 }, t0());
        let v = store.snapshot();
        assert!((v.happiness - 20.0).abs() < 1e-4);
        assert!((v.affection - 58.0).abs() < 1e-4);
        assert!((v.longing - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_record_clamps() {
        let mut store = ResidueStore::default();
        for _ in 0..10 {
            store.record_at(EmotionAxis::Hurt, 30.0, DecayHint::Normal, t0());
        }
        assert_eq!(store.snapshot().hurt, 100.0);
        store.record_at(EmotionAxis::Hurt, -500.0, DecayHint::Normal, t0());
        assert_eq!(store.snapshot().hurt, 0.0);
    }

    #[test]
    fn test_decay_per_interval() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Sadness, 30.0, DecayHint::Normal, t0());

        assert!(!store.decay_tick_at(t0() + Duration::minutes(59)));
        assert_eq!(store.snapshot().sadness, 30.0);

        assert!(store.decay_tick_at(t0() + Duration::hours(1)));
        assert_eq!(store.snapshot().sadness, 25.0);

        assert!(store.decay_tick_at(t0() + Duration::hours(3)));
        assert_eq!(store.snapshot().sadness, 15.0);
    }

    #[test]
    fn test_repeated_tick_is_idempotent() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Sadness, 30.0, DecayHint::Normal, t0());
        let at = t0() + Duration::minutes(90);
        store.decay_tick_at(at);
        store.decay_tick_at(at);
        store.decay_tick_at(at + Duration::minutes(5));
        assert_eq!(store.snapshot().sadness, 25.0);
    }

    #[test]
    fn test_catch_up_is_capped() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Hurt, 100.0, DecayHint::Lingering, t0());
        // 48 h behind: only 24 intervals apply, at half rate
        store.decay_tick_at(t0() + Duration::hours(48));
        assert_eq!(store.snapshot().hurt, 40.0);
    }

    #[test]
    fn test_late_tick_spares_fresh_residue() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Sadness, 10.0, DecayHint::Normal, t0());
        store.decay_tick_at(t0() + Duration::hours(2));
        assert_eq!(store.snapshot().sadness, 0.0);

        // Heartbeat stalls for ten hours, then hurt arrives just before it resumes
        let at = t0() + Duration::hours(12);
        store.record_at(EmotionAxis::Hurt, 30.0, DecayHint::Normal, at);
        assert!(!store.decay_tick_at(at + Duration::seconds(1)));
        assert_eq!(store.snapshot().hurt, 30.0);

        store.decay_tick_at(at + Duration::hours(1));
        assert_eq!(store.snapshot().hurt, 25.0);
    }

    #[test]
    fn test_record_settles_pending_decay() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Sadness, 30.0, DecayHint::Normal, t0());
        // Two intervals owed before the new impulse lands, none after it
        let at = t0() + Duration::hours(2) + Duration::minutes(30);
        store.record_at(EmotionAxis::Sadness, 10.0, DecayHint::Normal, at);
        assert_eq!(store.snapshot().sadness, 30.0);

        assert!(!store.decay_tick_at(at + Duration::minutes(59)));
        assert!(store.decay_tick_at(at + Duration::hours(1)));
        assert_eq!(store.snapshot().sadness, 25.0);
    }

    #[test]
    fn test_decay_hints() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Sadness, 30.0, DecayHint::Lingering, t0());
        store.record_at(EmotionAxis::Anxiety, 30.0, DecayHint::Fleeting, t0());
        store.record_at(EmotionAxis::Hurt, 30.0, DecayHint::Normal, t0());
        store.decay_tick_at(t0() + Duration::hours(2));
        let v = store.snapshot();
        assert_eq!(v.sadness, 25.0);
        assert_eq!(v.anxiety, 10.0);
        assert_eq!(v.hurt, 20.0);
    }

    #[test]
    fn test_hint_clears_at_zero() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Anxiety, 10.0, DecayHint::Fleeting, t0());
        store.decay_tick_at(t0() + Duration::hours(1));
        assert_eq!(store.snapshot().anxiety, 0.0);
        // recorded again without a hint: back to the normal rate
        store.record_at(EmotionAxis::Anxiety, 10.0, DecayHint::Normal, t0() + Duration::hours(1));
        store.decay_tick_at(t0() + Duration::hours(2));
        assert_eq!(store.snapshot().anxiety, 5.0);
    }

    #[test]
    fn test_affection_never_decays() {
        let mut store = ResidueStore::default();
        store.record_event_at(EmotionEvent::Cherished, t0());
        store.decay_tick_at(t0() + Duration::hours(10));
        assert_eq!(store.snapshot().affection, 65.0);
    }

    #[test]
    fn test_affection_floor_restored() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Affection, -40.0, DecayHint::Normal, t0());
        assert_eq!(store.snapshot().affection, 10.0);
        store.decay_tick_at(t0());
        assert_eq!(store.snapshot().affection, 50.0);
    }

    #[test]
    fn test_tone_follows_dominant_axis() {
        let mut store = ResidueStore::default();
        store.record_at(EmotionAxis::Longing, 15.0, DecayHint::Normal, t0());
        assert_eq!(store.tone_at(t0()), Tone::Neutral);
        store.record_at(EmotionAxis::Longing, 10.0, DecayHint::Normal, t0());
        assert_eq!(store.tone_at(t0()), Tone::Lonely);
    }

    #[test]
    fn test_cherished_is_affectionate() {
        let mut store = ResidueStore::default();
        store.record_event_at(EmotionEvent::Hurt, t0());
        store.record_event_at(EmotionEvent::Cherished, t0());
        assert_eq!(store.tone_at(t0()), Tone::Affectionate);
        store.record_event_at(EmotionEvent::Worried, t0());
        assert_eq!(store.tone_at(t0()), Tone::Hurt);
    }

    #[test]
    fn test_tone_reverts_after_quiet_period() {
        let mut store = ResidueStore::default();
        store.record_event_at(EmotionEvent::Hurt, t0());
        assert_eq!(store.tone_at(t0() + Duration::minutes(29)), Tone::Hurt);
        assert_eq!(store.tone_at(t0() + Duration::minutes(30)), Tone::Neutral);
    }

    #[test]
    fn test_record_mood() {
        let mut store = ResidueStore::default();
        store.record_mood_at(MoodCategory::Sadness, 20.0, t0());
        store.record_mood_at(MoodCategory::Gloom, 20.0, t0());
        store.record_mood_at(MoodCategory::Calm, 20.0, t0());
        assert_eq!(store.snapshot().sadness, 30.0);
        assert_eq!(store.last_event_at(), Some(t0()));
    }

    #[test]
    fn test_reset_and_restore() {
        let mut store = ResidueStore::default();
        store.record_event_at(EmotionEvent::Hurt, t0());
        store.reset();
        assert_eq!(store.snapshot(), EmotionVector::default());
        assert!(store.last_event_at().is_none());

        let mut v = EmotionVector::default();
        v.sadness = 42.0;
        store.restore(v, Some(t0()));
        assert_eq!(store.snapshot().sadness, 42.0);
        assert_eq!(store.tone_at(t0()), Tone::Sad);
    }
}
