//! Affect engine
//!
//! `AffectEngine` is the single owner of the affective state of one
//! conversation. It:
//! - normalizes mood signals and records them as residue
//! - feeds inbound/outbound messages into the conversation tracker
//! - resets escalation on inbound traffic and polls it on a timer
//! - decays residue on a timer
//! - broadcasts a snapshot after every mutation and mirrors it to the cache

use crate::escalation::{
    EscalationLevel, EscalationMachine, EscalationState, EscalationTransition,
};
use crate::heartbeat::{HeartbeatConfig, Tick, TickContext};
use crate::mirror::MirrorWriter;
use crate::prompt;
use crate::residue::{DecayHint, ResidueStore};
use crate::snapshot::EngineSnapshot;
use amae_context::{
    ConversationContextSnapshot, ConversationEntry, ConversationTracker, MediaAttachment, Speaker,
};
use amae_core::{
    AmaeConfig, CacheMirror, EmotionEvent, EmotionVector, FixedPhase, MoodCategory,
    MoodNormalizer, NoPhase, NoopMirror, PhaseSource, RawMoodInput, Tone,
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

/// A message from the counterpart.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub speaker: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    pub fn now(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A message the companion sent.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub text: String,
    pub media: Option<MediaAttachment>,
    pub timestamp: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_media(mut self, media: MediaAttachment) -> Self {
        self.media = Some(media);
        self
    }
}

/// Everything mutable, behind one lock so readers never see a partial update.
struct EngineState {
    revision: u64,
    mood: MoodCategory,
    residue: ResidueStore,
    conversation: ConversationTracker,
    escalation: EscalationMachine,
}

impl EngineState {
    fn snapshot(&self, now: DateTime<Utc>) -> EngineSnapshot {
        EngineSnapshot {
            revision: self.revision,
            mood: self.mood,
            emotions: self.residue.snapshot(),
            tone: self.residue.tone_at(now),
            conversation: self.conversation.snapshot(),
            escalation: self.escalation.state().clone(),
            last_event_at: self.residue.last_event_at(),
            taken_at: now,
        }
    }
}

/// State shared with the background loops.
struct EngineInner {
    config: AmaeConfig,
    normalizer: MoodNormalizer,
    state: RwLock<EngineState>,
    phase: Arc<dyn PhaseSource>,
    mirror: Option<MirrorWriter>,
    snapshot_tx: watch::Sender<EngineSnapshot>,
    /// Set while the phase source reports nothing; warned once per outage.
    phase_missing: AtomicBool,
}

impl EngineInner {
    /// Apply `f` under the write lock, then publish the new snapshot.
    async fn mutate<R>(&self, now: DateTime<Utc>, f: impl FnOnce(&mut EngineState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state.write().await;
            let result = f(&mut *state);
            state.revision += 1;
            (result, state.snapshot(now))
        };

        if let Some(mirror) = &self.mirror {
            mirror.spawn_write(&snapshot);
        }
        let _ = self.snapshot_tx.send(snapshot);
        result
    }

    fn tick_context(&self, now: DateTime<Utc>) -> TickContext {
        let phase = self.phase.current_phase();
        match phase {
            None if !self.phase_missing.swap(true, Ordering::Relaxed) => {
                tracing::warn!("Cycle phase unavailable, escalation thresholds unscaled");
            }
            Some(p) if self.phase_missing.swap(false, Ordering::Relaxed) => {
                tracing::info!("Cycle phase available again: {}", p);
            }
            _ => {}
        }
        TickContext {
            now,
            phase,
            phase_coefficient: self.config.escalation.phase_coefficients.coefficient(phase),
        }
    }

    async fn decay_tick_at(&self, now: DateTime<Utc>) -> bool {
        let ctx = TickContext::at(now);
        self.mutate(now, |state| state.residue.tick(&ctx)).await
    }

    async fn escalation_tick_at(&self, now: DateTime<Utc>) -> Option<EscalationTransition> {
        let ctx = self.tick_context(now);
        self.mutate(now, |state| {
            state.escalation.set_phase(ctx.phase);
            state.escalation.tick_at(ctx.now, ctx.phase_coefficient)
        })
        .await
    }
}

/// The affect engine of one conversation.
pub struct AffectEngine {
    inner: Arc<EngineInner>,
    snapshot_rx: watch::Receiver<EngineSnapshot>,
    heartbeat: HeartbeatConfig,
    background: Mutex<Vec<JoinHandle<()>>>,
}

pub struct AffectEngineBuilder {
    config: AmaeConfig,
    phase: Option<Arc<dyn PhaseSource>>,
    mirror: Option<Arc<dyn CacheMirror>>,
    heartbeat: Option<HeartbeatConfig>,
    now: Option<DateTime<Utc>>,
}

impl AffectEngineBuilder {
    /// Source of the cyclical phase. Defaults to the configured fixed phase,
    /// or none at all.
    pub fn phase_source(mut self, phase: Arc<dyn PhaseSource>) -> Self {
        self.phase = Some(phase);
        self
    }

    /// External cache to mirror snapshots into. Enables mirroring.
    pub fn mirror(mut self, mirror: Arc<dyn CacheMirror>) -> Self {
        self.config.mirror.enabled = true;
        self.mirror = Some(mirror);
        self
    }

    pub fn heartbeat(mut self, heartbeat: HeartbeatConfig) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// Moment silence starts counting from. Defaults to now.
    pub fn started_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn build(self) -> AffectEngine {
        let config = self.config;
        let now = self.now.unwrap_or_else(Utc::now);

        let phase: Arc<dyn PhaseSource> = match (self.phase, config.escalation.fixed_phase) {
            (Some(phase), _) => phase,
            (None, Some(fixed)) => Arc::new(FixedPhase(fixed)),
            (None, None) => Arc::new(NoPhase),
        };

        let mirror = config.mirror.enabled.then(|| {
            let target = self.mirror.unwrap_or_else(|| Arc::new(NoopMirror));
            MirrorWriter::new(target, &config.mirror)
        });

        let state = EngineState {
            revision: 0,
            mood: config.normalizer.default_category,
            residue: ResidueStore::new(config.residue.clone()),
            conversation: ConversationTracker::new(config.conversation.clone()),
            escalation: EscalationMachine::new(&config.escalation, now),
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot(now));
        let heartbeat = self
            .heartbeat
            .unwrap_or_else(|| HeartbeatConfig::from_config(&config));

        AffectEngine {
            inner: Arc::new(EngineInner {
                normalizer: MoodNormalizer::new(config.normalizer.clone()),
                state: RwLock::new(state),
                phase,
                mirror,
                snapshot_tx,
                phase_missing: AtomicBool::new(false),
                config,
            }),
            snapshot_rx,
            heartbeat,
            background: Mutex::new(Vec::new()),
        }
    }
}

impl AffectEngine {
    pub fn new(config: AmaeConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: AmaeConfig) -> AffectEngineBuilder {
        AffectEngineBuilder {
            config,
            phase: None,
            mirror: None,
            heartbeat: None,
            now: None,
        }
    }

    pub fn config(&self) -> &AmaeConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------
    // Message events
    // ------------------------------------------------------------------

    /// Inbound message: tracked, escalation reset, tone absorbed into residue.
    pub async fn on_inbound(&self, msg: InboundMessage) -> ConversationEntry {
        let engine = &self.inner.config.engine;
        let feed = engine.feed_inbound_tone;
        let magnitude = engine.inbound_tone_magnitude;
        tracing::debug!("Inbound from {}: {} chars", msg.speaker, msg.text.chars().count());

        self.inner
            .mutate(msg.timestamp, |state| {
                let entry =
                    state
                        .conversation
                        .add_entry_at(Speaker::Counterpart, &msg.text, None, msg.timestamp);
                state.escalation.reset_at(msg.timestamp);
                if feed {
                    if let Some(axis) = entry.tone.residue_axis() {
                        state
                            .residue
                            .record_at(axis, magnitude, DecayHint::Normal, msg.timestamp);
                    }
                }
                entry
            })
            .await
    }

    /// Outbound message: tracked with the residue tone as its hint.
    pub async fn on_outbound(&self, msg: OutboundMessage) -> ConversationEntry {
        self.inner
            .mutate(msg.timestamp, |state| {
                let tone = state.residue.tone_at(msg.timestamp);
                let hint = (!tone.is_neutral()).then_some(tone);
                match msg.media {
                    Some(media) => state.conversation.add_entry_with_media(
                        Speaker::Companion,
                        &msg.text,
                        hint,
                        media,
                        msg.timestamp,
                    ),
                    None => state.conversation.add_entry_at(
                        Speaker::Companion,
                        &msg.text,
                        hint,
                        msg.timestamp,
                    ),
                }
            })
            .await
    }

    // ------------------------------------------------------------------
    // Mood and residue
    // ------------------------------------------------------------------

    /// Normalize a raw mood signal and record it. Returns the category it
    /// resolved to. `None` magnitude uses the configured default.
    pub async fn record_mood(&self, raw: &RawMoodInput, magnitude: Option<f32>) -> MoodCategory {
        self.record_mood_at(raw, magnitude, Utc::now()).await
    }

    pub async fn record_mood_at(
        &self,
        raw: &RawMoodInput,
        magnitude: Option<f32>,
        now: DateTime<Utc>,
    ) -> MoodCategory {
        let mood = self.inner.normalizer.normalize(raw);
        let magnitude = magnitude.unwrap_or(self.inner.config.engine.default_mood_magnitude);
        self.inner
            .mutate(now, |state| {
                state.mood = mood;
                state.residue.record_mood_at(mood, magnitude, now);
            })
            .await;
        mood
    }

    pub async fn record_event(&self, event: EmotionEvent) {
        self.record_event_at(event, Utc::now()).await
    }

    pub async fn record_event_at(&self, event: EmotionEvent, now: DateTime<Utc>) {
        self.inner
            .mutate(now, |state| state.residue.record_event_at(event, now))
            .await
    }

    pub async fn decay_tick(&self) -> bool {
        self.inner.decay_tick_at(Utc::now()).await
    }

    pub async fn decay_tick_at(&self, now: DateTime<Utc>) -> bool {
        self.inner.decay_tick_at(now).await
    }

    // ------------------------------------------------------------------
    // Escalation
    // ------------------------------------------------------------------

    pub async fn escalation_tick(&self) -> Option<EscalationTransition> {
        self.inner.escalation_tick_at(Utc::now()).await
    }

    pub async fn escalation_tick_at(&self, now: DateTime<Utc>) -> Option<EscalationTransition> {
        self.inner.escalation_tick_at(now).await
    }

    /// Time left until the next escalation level under the current phase.
    pub async fn time_to_next_escalation(&self) -> Option<Duration> {
        let ctx = self.inner.tick_context(Utc::now());
        let state = self.inner.state.read().await;
        state.escalation.time_to_next(ctx.now, ctx.phase_coefficient)
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub async fn current_mood_category(&self) -> MoodCategory {
        self.inner.state.read().await.mood
    }

    pub async fn emotion_snapshot(&self) -> EmotionVector {
        self.inner.state.read().await.residue.snapshot()
    }

    pub async fn tone(&self) -> Tone {
        self.inner.state.read().await.residue.tone()
    }

    pub async fn conversation_snapshot(&self) -> ConversationContextSnapshot {
        self.inner.state.read().await.conversation.snapshot()
    }

    pub async fn escalation_level(&self) -> EscalationLevel {
        self.inner.state.read().await.escalation.level()
    }

    pub async fn escalation_state(&self) -> EscalationState {
        self.inner.state.read().await.escalation.state().clone()
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.snapshot_at(Utc::now()).await
    }

    pub async fn snapshot_at(&self, now: DateTime<Utc>) -> EngineSnapshot {
        self.inner.state.read().await.snapshot(now)
    }

    /// Subscribe to snapshots published after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshot_rx.clone()
    }

    /// `base` decorated with the current tone, topic, flow, mood and
    /// escalation annotations.
    pub async fn contextual_prompt_fragment(&self, base: &str) -> String {
        let snapshot = self.snapshot().await;
        prompt::contextual_prompt_fragment(base, &snapshot)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Forget residue, mood and escalation; conversation history is kept.
    pub async fn reset(&self) {
        let now = Utc::now();
        let default_mood = self.inner.config.normalizer.default_category;
        self.inner
            .mutate(now, |state| {
                state.mood = default_mood;
                state.residue.reset();
                state.escalation.reset_at(now);
            })
            .await
    }

    /// Load the last mirrored snapshot. Returns whether anything was restored;
    /// an unreachable or empty cache leaves the local state untouched.
    pub async fn restore_from_mirror(&self) -> bool {
        let Some(mirror) = &self.inner.mirror else {
            return false;
        };
        let Some(saved) = mirror.load().await else {
            return false;
        };

        tracing::info!(
            "Restored affect state (revision {}, taken {})",
            saved.revision,
            saved.taken_at
        );
        self.inner
            .mutate(Utc::now(), |state| {
                state.mood = saved.mood;
                state.residue.restore(saved.emotions, saved.last_event_at);
                state.escalation.restore(saved.escalation);
                state.revision = state.revision.max(saved.revision);
            })
            .await;
        true
    }

    /// Spawn the decay and escalation loops. Calling it again restarts them.
    pub fn start_background(&self) {
        self.stop_background();

        let decay = {
            let inner = Arc::clone(&self.inner);
            let period = self.heartbeat.decay_interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    inner.decay_tick_at(Utc::now()).await;
                }
            })
        };

        let escalation = {
            let inner = Arc::clone(&self.inner);
            let period = self.heartbeat.escalation_interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    interval.tick().await;
                    inner.escalation_tick_at(Utc::now()).await;
                }
            })
        };

        tracing::debug!(
            "Background ticks started (decay {:?}, escalation {:?})",
            self.heartbeat.decay_interval,
            self.heartbeat.escalation_interval
        );
        if let Ok(mut handles) = self.background.lock() {
            handles.push(decay);
            handles.push(escalation);
        }
    }

    pub fn stop_background(&self) {
        if let Ok(mut handles) = self.background.lock() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }
    }
}

impl Drop for AffectEngine {
    fn drop(&mut self) {
        self.stop_background();
    }
}
