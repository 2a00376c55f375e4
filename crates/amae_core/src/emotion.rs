//! Emotion residue vocabulary
//!
//! Six fixed axes, each a scalar in [0, 100]. The vector itself knows how to
//! stay in range; the decay schedule and the event bookkeeping live in the
//! limbic crate's residue store.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const AXIS_MIN: f32 = 0.0;
pub const AXIS_MAX: f32 = 100.0;

/// Guard against NaN and Infinity before a value reaches an axis.
#[inline]
pub fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in emotion value, using fallback {}", fallback);
        fallback
    }
}

fn deserialize_axis<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = f32::deserialize(deserializer)?;
    Ok(sanitize_f32(v, AXIS_MIN).clamp(AXIS_MIN, AXIS_MAX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionAxis {
    Sadness,
    Happiness,
    Anxiety,
    Longing,
    Hurt,
    Affection,
}

impl EmotionAxis {
    pub const ALL: [EmotionAxis; 6] = [
        EmotionAxis::Sadness,
        EmotionAxis::Happiness,
        EmotionAxis::Anxiety,
        EmotionAxis::Longing,
        EmotionAxis::Hurt,
        EmotionAxis::Affection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionAxis::Sadness => "sadness",
            EmotionAxis::Happiness => "happiness",
            EmotionAxis::Anxiety => "anxiety",
            EmotionAxis::Longing => "longing",
            EmotionAxis::Hurt => "hurt",
            EmotionAxis::Affection => "affection",
        }
    }

    /// Tone an axis colors the conversation with when it dominates.
    pub fn tone(&self) -> Tone {
        match self {
            EmotionAxis::Sadness => Tone::Sad,
            EmotionAxis::Happiness => Tone::Happy,
            EmotionAxis::Anxiety => Tone::Anxious,
            EmotionAxis::Longing => Tone::Lonely,
            EmotionAxis::Hurt => Tone::Hurt,
            EmotionAxis::Affection => Tone::Affectionate,
        }
    }
}

impl fmt::Display for EmotionAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-axis emotional intensity, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    #[serde(deserialize_with = "deserialize_axis")]
    pub sadness: f32,
    #[serde(deserialize_with = "deserialize_axis")]
    pub happiness: f32,
    #[serde(deserialize_with = "deserialize_axis")]
    pub anxiety: f32,
    #[serde(deserialize_with = "deserialize_axis")]
    pub longing: f32,
    #[serde(deserialize_with = "deserialize_axis")]
    pub hurt: f32,
    #[serde(deserialize_with = "deserialize_axis")]
    pub affection: f32,
}

impl Default for EmotionVector {
    fn default() -> Self {
        Self::with_affection(50.0)
    }
}

impl EmotionVector {
    /// All axes at zero except affection.
    pub fn with_affection(affection: f32) -> Self {
        Self {
            sadness: 0.0,
            happiness: 0.0,
            anxiety: 0.0,
            longing: 0.0,
            hurt: 0.0,
            affection: sanitize_f32(affection, AXIS_MIN).clamp(AXIS_MIN, AXIS_MAX),
        }
    }

    pub fn get(&self, axis: EmotionAxis) -> f32 {
        match axis {
            EmotionAxis::Sadness => self.sadness,
            EmotionAxis::Happiness => self.happiness,
            EmotionAxis::Anxiety => self.anxiety,
            EmotionAxis::Longing => self.longing,
            EmotionAxis::Hurt => self.hurt,
            EmotionAxis::Affection => self.affection,
        }
    }

    fn slot(&mut self, axis: EmotionAxis) -> &mut f32 {
        match axis {
            EmotionAxis::Sadness => &mut self.sadness,
            EmotionAxis::Happiness => &mut self.happiness,
            EmotionAxis::Anxiety => &mut self.anxiety,
            EmotionAxis::Longing => &mut self.longing,
            EmotionAxis::Hurt => &mut self.hurt,
            EmotionAxis::Affection => &mut self.affection,
        }
    }

    /// Set an axis, clamped to [0, 100].
    pub fn set(&mut self, axis: EmotionAxis, value: f32) {
        let current = self.get(axis);
        *self.slot(axis) = sanitize_f32(value, current).clamp(AXIS_MIN, AXIS_MAX);
    }

    /// Add a (possibly negative) delta to an axis, clamped to [0, 100].
    /// Returns the value after clamping.
    pub fn add(&mut self, axis: EmotionAxis, delta: f32) -> f32 {
        let delta = sanitize_f32(delta, 0.0);
        let next = self.get(axis) + delta;
        self.set(axis, next);
        self.get(axis)
    }

    /// Clamp every axis back into range.
    pub fn normalize(&mut self) {
        for axis in EmotionAxis::ALL {
            let v = self.get(axis);
            *self.slot(axis) = sanitize_f32(v, AXIS_MIN).clamp(AXIS_MIN, AXIS_MAX);
        }
    }

    /// Strongest axis other than affection, with its value.
    pub fn dominant(&self) -> (EmotionAxis, f32) {
        EmotionAxis::ALL
            .iter()
            .filter(|a| **a != EmotionAxis::Affection)
            .map(|a| (*a, self.get(*a)))
            .fold((EmotionAxis::Sadness, f32::MIN), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionAxis, f32)> + '_ {
        EmotionAxis::ALL.iter().map(move |a| (*a, self.get(*a)))
    }

    /// Compact one-line rendering, e.g. for prompt annotations.
    pub fn describe(&self) -> String {
        self.iter()
            .map(|(a, v)| format!("{}={:.0}", a, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Coarse conversational coloring, shared by the residue store's tone state
/// and the per-entry tone of the conversation tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Happy,
    Playful,
    Affectionate,
    Sad,
    Lonely,
    Anxious,
    Angry,
    Hurt,
    Tired,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Happy => "happy",
            Tone::Playful => "playful",
            Tone::Affectionate => "affectionate",
            Tone::Sad => "sad",
            Tone::Lonely => "lonely",
            Tone::Anxious => "anxious",
            Tone::Angry => "angry",
            Tone::Hurt => "hurt",
            Tone::Tired => "tired",
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Tone::Neutral
    }

    pub fn is_emotionally_charged(&self) -> bool {
        matches!(
            self,
            Tone::Affectionate | Tone::Sad | Tone::Lonely | Tone::Anxious | Tone::Angry | Tone::Hurt
        )
    }

    pub fn is_playful(&self) -> bool {
        *self == Tone::Playful
    }

    /// Residue axis a tone feeds when it is absorbed from conversation.
    pub fn residue_axis(&self) -> Option<EmotionAxis> {
        match self {
            Tone::Happy | Tone::Playful => Some(EmotionAxis::Happiness),
            Tone::Affectionate => Some(EmotionAxis::Affection),
            Tone::Sad => Some(EmotionAxis::Sadness),
            Tone::Lonely => Some(EmotionAxis::Longing),
            Tone::Anxious => Some(EmotionAxis::Anxiety),
            Tone::Angry | Tone::Hurt => Some(EmotionAxis::Hurt),
            Tone::Neutral | Tone::Tired => None,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Higher-level emotional happenings with a documented effect on the residue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionEvent {
    /// hurt +30
    Hurt,
    /// happiness +25
    Excited,
    /// longing +20
    Lonely,
    /// sadness +20
    Rejected,
    /// anxiety +20
    Worried,
    /// affection +15
    Cherished,
    /// sadness -15, anxiety -10
    Comforted,
    /// happiness / sadness / longing split 30 / 40 / 30
    Bittersweet { magnitude: f32 },
    /// happiness +50%, affection +20%, longing -30%
    Reunion { magnitude: f32 },
}

impl EmotionEvent {
    /// Per-axis deltas this event applies.
    pub fn impulses(&self) -> Vec<(EmotionAxis, f32)> {
        match *self {
            EmotionEvent::Hurt => vec![(EmotionAxis::Hurt, 30.0)],
            EmotionEvent::Excited => vec![(EmotionAxis::Happiness, 25.0)],
            EmotionEvent::Lonely => vec![(EmotionAxis::Longing, 20.0)],
            EmotionEvent::Rejected => vec![(EmotionAxis::Sadness, 20.0)],
            EmotionEvent::Worried => vec![(EmotionAxis::Anxiety, 20.0)],
            EmotionEvent::Cherished => vec![(EmotionAxis::Affection, 15.0)],
            EmotionEvent::Comforted => vec![
                (EmotionAxis::Sadness, -15.0),
                (EmotionAxis::Anxiety, -10.0),
            ],
            EmotionEvent::Bittersweet { magnitude } => vec![
                (EmotionAxis::Happiness, magnitude * 0.3),
                (EmotionAxis::Sadness, magnitude * 0.4),
                (EmotionAxis::Longing, magnitude * 0.3),
            ],
            EmotionEvent::Reunion { magnitude } => vec![
                (EmotionAxis::Happiness, magnitude * 0.5),
                (EmotionAxis::Affection, magnitude * 0.2),
                (EmotionAxis::Longing, -magnitude * 0.3),
            ],
        }
    }

    /// Tone the event leaves behind, when it dictates one directly.
    pub fn tone_override(&self) -> Option<Tone> {
        match self {
            EmotionEvent::Cherished => Some(Tone::Affectionate),
            _ => None,
        }
    }

    /// Parse a lowercase event name (CLI and config use).
    pub fn from_name(name: &str, magnitude: f32) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "hurt" => Some(EmotionEvent::Hurt),
            "excited" => Some(EmotionEvent::Excited),
            "lonely" => Some(EmotionEvent::Lonely),
            "rejected" => Some(EmotionEvent::Rejected),
            "worried" => Some(EmotionEvent::Worried),
            "cherished" => Some(EmotionEvent::Cherished),
            "comforted" => Some(EmotionEvent::Comforted),
            "bittersweet" => Some(EmotionEvent::Bittersweet { magnitude }),
            "reunion" => Some(EmotionEvent::Reunion { magnitude }),
            _ => None,
        }
    }
}
