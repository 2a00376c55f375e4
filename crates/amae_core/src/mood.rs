//! Mood normalization
//!
//! Mood signals reach the engine from many call sites and in whatever shape
//! each caller had on hand: a label typed by a human, a sentiment score, a
//! boolean flag, a JSON object lifted out of a webhook payload. All of them
//! are folded into one closed vocabulary (`MoodCategory`) before anything is
//! stored.
//!
//! Resolution order for text (first match wins):
//! 1. canonical label passthrough
//! 2. exact alias lookup (English, Japanese and Chinese labels)
//! 3. fuzzy match (normalized Levenshtein similarity)
//! 4. partial match (containment with a small length difference)
//! 5. the configured default category
//!
//! Normalization never fails. Unrecognized input resolves to the default and
//! leaves a `tracing` diagnostic behind.

use crate::config::NormalizerConfig;
use crate::emotion::EmotionAxis;
use crate::error::UnknownLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Object keys probed for a mood value, highest priority first.
pub const OBJECT_MOOD_KEYS: [&str; 4] = ["mood", "emotion", "feeling", "state"];

/// Nested lists/objects deeper than this resolve to the default.
const MAX_DEPTH: usize = 8;

/// Canonical mood vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodCategory {
    Joy,
    Longing,
    Playful,
    Drowsy,
    Irritated,
    #[default]
    Calm,
    Gloom,
    Sadness,
    Loneliness,
    Anger,
    Anxious,
    Affection,
    Nostalgia,
    Sulky,
}

/// Coarse polarity of a mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valence {
    Positive,
    Neutral,
    Negative,
}

impl MoodCategory {
    pub const ALL: [MoodCategory; 14] = [
        MoodCategory::Joy,
        MoodCategory::Longing,
        MoodCategory::Playful,
        MoodCategory::Drowsy,
        MoodCategory::Irritated,
        MoodCategory::Calm,
        MoodCategory::Gloom,
        MoodCategory::Sadness,
        MoodCategory::Loneliness,
        MoodCategory::Anger,
        MoodCategory::Anxious,
        MoodCategory::Affection,
        MoodCategory::Nostalgia,
        MoodCategory::Sulky,
    ];

    /// Canonical lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodCategory::Joy => "joy",
            MoodCategory::Longing => "longing",
            MoodCategory::Playful => "playful",
            MoodCategory::Drowsy => "drowsy",
            MoodCategory::Irritated => "irritated",
            MoodCategory::Calm => "calm",
            MoodCategory::Gloom => "gloom",
            MoodCategory::Sadness => "sadness",
            MoodCategory::Loneliness => "loneliness",
            MoodCategory::Anger => "anger",
            MoodCategory::Anxious => "anxious",
            MoodCategory::Affection => "affection",
            MoodCategory::Nostalgia => "nostalgia",
            MoodCategory::Sulky => "sulky",
        }
    }

    /// Exact canonical label lookup. No aliasing, no fuzziness.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == label)
    }

    pub fn valence(&self) -> Valence {
        match self {
            MoodCategory::Joy | MoodCategory::Playful | MoodCategory::Affection => {
                Valence::Positive
            }
            MoodCategory::Calm | MoodCategory::Drowsy | MoodCategory::Nostalgia => Valence::Neutral,
            MoodCategory::Longing
            | MoodCategory::Irritated
            | MoodCategory::Gloom
            | MoodCategory::Sadness
            | MoodCategory::Loneliness
            | MoodCategory::Anger
            | MoodCategory::Anxious
            | MoodCategory::Sulky => Valence::Negative,
        }
    }

    /// Which residue axis a mood writes into, and with what weight.
    ///
    /// Moods with no lasting residue (calm, drowsy) return `None`.
    pub fn residue_impulse(&self) -> Option<(EmotionAxis, f32)> {
        match self {
            MoodCategory::Joy => Some((EmotionAxis::Happiness, 1.0)),
            MoodCategory::Playful => Some((EmotionAxis::Happiness, 0.5)),
            MoodCategory::Longing => Some((EmotionAxis::Longing, 1.0)),
            MoodCategory::Nostalgia => Some((EmotionAxis::Longing, 0.5)),
            MoodCategory::Loneliness => Some((EmotionAxis::Longing, 0.8)),
            MoodCategory::Sadness => Some((EmotionAxis::Sadness, 1.0)),
            MoodCategory::Gloom => Some((EmotionAxis::Sadness, 0.5)),
            MoodCategory::Anger => Some((EmotionAxis::Hurt, 1.0)),
            MoodCategory::Irritated => Some((EmotionAxis::Hurt, 0.5)),
            MoodCategory::Sulky => Some((EmotionAxis::Hurt, 0.7)),
            MoodCategory::Anxious => Some((EmotionAxis::Anxiety, 1.0)),
            MoodCategory::Affection => Some((EmotionAxis::Affection, 1.0)),
            MoodCategory::Calm | MoodCategory::Drowsy => None,
        }
    }
}

impl fmt::Display for MoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodCategory {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(&s.trim().to_lowercase()).ok_or_else(|| UnknownLabel {
            kind: "mood",
            label: s.to_string(),
        })
    }
}

/// Many-to-one alias table. Order matters: on equal fuzzy similarity the
/// earlier entry wins.
const ALIASES: &[(&str, MoodCategory)] = &[
    // canonical labels double as alias keys so fuzzy matching covers them
    ("joy", MoodCategory::Joy),
    ("longing", MoodCategory::Longing),
    ("playful", MoodCategory::Playful),
    ("drowsy", MoodCategory::Drowsy),
    ("irritated", MoodCategory::Irritated),
    ("calm", MoodCategory::Calm),
    ("gloom", MoodCategory::Gloom),
    ("sadness", MoodCategory::Sadness),
    ("loneliness", MoodCategory::Loneliness),
    ("anger", MoodCategory::Anger),
    ("anxious", MoodCategory::Anxious),
    ("affection", MoodCategory::Affection),
    ("nostalgia", MoodCategory::Nostalgia),
    ("sulky", MoodCategory::Sulky),
    // joy
    ("happy", MoodCategory::Joy),
    ("glad", MoodCategory::Joy),
    ("cheerful", MoodCategory::Joy),
    ("joyful", MoodCategory::Joy),
    ("excited", MoodCategory::Joy),
    ("elated", MoodCategory::Joy),
    ("delighted", MoodCategory::Joy),
    ("great", MoodCategory::Joy),
    ("good", MoodCategory::Joy),
    ("yay", MoodCategory::Joy),
    ("嬉しい", MoodCategory::Joy),
    ("うれしい", MoodCategory::Joy),
    ("楽しい", MoodCategory::Joy),
    ("开心", MoodCategory::Joy),
    ("高兴", MoodCategory::Joy),
    // longing
    ("yearning", MoodCategory::Longing),
    ("missing", MoodCategory::Longing),
    ("miss", MoodCategory::Longing),
    ("pining", MoodCategory::Longing),
    ("恋しい", MoodCategory::Longing),
    ("想念", MoodCategory::Longing),
    // playful
    ("teasing", MoodCategory::Playful),
    ("silly", MoodCategory::Playful),
    ("cheeky", MoodCategory::Playful),
    ("mischievous", MoodCategory::Playful),
    ("fun", MoodCategory::Playful),
    ("ふざけ", MoodCategory::Playful),
    ("调皮", MoodCategory::Playful),
    // drowsy
    ("sleepy", MoodCategory::Drowsy),
    ("tired", MoodCategory::Drowsy),
    ("exhausted", MoodCategory::Drowsy),
    ("yawn", MoodCategory::Drowsy),
    ("眠い", MoodCategory::Drowsy),
    ("ねむい", MoodCategory::Drowsy),
    ("困", MoodCategory::Drowsy),
    // irritated
    ("annoyed", MoodCategory::Irritated),
    ("grumpy", MoodCategory::Irritated),
    ("cranky", MoodCategory::Irritated),
    ("frustrated", MoodCategory::Irritated),
    ("bothered", MoodCategory::Irritated),
    ("イライラ", MoodCategory::Irritated),
    ("烦", MoodCategory::Irritated),
    // calm
    ("peaceful", MoodCategory::Calm),
    ("relaxed", MoodCategory::Calm),
    ("chill", MoodCategory::Calm),
    ("serene", MoodCategory::Calm),
    ("content", MoodCategory::Calm),
    ("fine", MoodCategory::Calm),
    ("okay", MoodCategory::Calm),
    ("ok", MoodCategory::Calm),
    ("neutral", MoodCategory::Calm),
    ("穏やか", MoodCategory::Calm),
    ("平静", MoodCategory::Calm),
    // gloom
    ("gloomy", MoodCategory::Gloom),
    ("down", MoodCategory::Gloom),
    ("blue", MoodCategory::Gloom),
    ("moody", MoodCategory::Gloom),
    ("meh", MoodCategory::Gloom),
    ("憂鬱", MoodCategory::Gloom),
    ("郁闷", MoodCategory::Gloom),
    // sadness
    ("sad", MoodCategory::Sadness),
    ("unhappy", MoodCategory::Sadness),
    ("crying", MoodCategory::Sadness),
    ("upset", MoodCategory::Sadness),
    ("heartbroken", MoodCategory::Sadness),
    ("悲しい", MoodCategory::Sadness),
    ("かなしい", MoodCategory::Sadness),
    ("难过", MoodCategory::Sadness),
    ("伤心", MoodCategory::Sadness),
    // loneliness
    ("lonely", MoodCategory::Loneliness),
    ("alone", MoodCategory::Loneliness),
    ("isolated", MoodCategory::Loneliness),
    ("寂しい", MoodCategory::Loneliness),
    ("さみしい", MoodCategory::Loneliness),
    ("孤独", MoodCategory::Loneliness),
    ("寂寞", MoodCategory::Loneliness),
    // anger
    ("angry", MoodCategory::Anger),
    ("mad", MoodCategory::Anger),
    ("furious", MoodCategory::Anger),
    ("rage", MoodCategory::Anger),
    ("livid", MoodCategory::Anger),
    ("怒り", MoodCategory::Anger),
    ("怒", MoodCategory::Anger),
    ("生气", MoodCategory::Anger),
    // anxious
    ("anxiety", MoodCategory::Anxious),
    ("worried", MoodCategory::Anxious),
    ("concerned", MoodCategory::Anxious),
    ("nervous", MoodCategory::Anxious),
    ("scared", MoodCategory::Anxious),
    ("afraid", MoodCategory::Anxious),
    ("uneasy", MoodCategory::Anxious),
    ("不安", MoodCategory::Anxious),
    ("心配", MoodCategory::Anxious),
    ("焦虑", MoodCategory::Anxious),
    ("担心", MoodCategory::Anxious),
    // affection
    ("love", MoodCategory::Affection),
    ("loving", MoodCategory::Affection),
    ("affectionate", MoodCategory::Affection),
    ("adoring", MoodCategory::Affection),
    ("fond", MoodCategory::Affection),
    ("sweet", MoodCategory::Affection),
    ("大好き", MoodCategory::Affection),
    ("爱", MoodCategory::Affection),
    ("喜欢", MoodCategory::Affection),
    // nostalgia
    ("nostalgic", MoodCategory::Nostalgia),
    ("reminiscent", MoodCategory::Nostalgia),
    ("wistful", MoodCategory::Nostalgia),
    ("懐かしい", MoodCategory::Nostalgia),
    ("怀念", MoodCategory::Nostalgia),
    // sulky
    ("sulking", MoodCategory::Sulky),
    ("pouty", MoodCategory::Sulky),
    ("pouting", MoodCategory::Sulky),
    ("huffy", MoodCategory::Sulky),
    ("拗ね", MoodCategory::Sulky),
    ("すねる", MoodCategory::Sulky),
    ("生闷气", MoodCategory::Sulky),
];

/// Loosely-typed mood signal as it arrives from a call site.
///
/// Never stored: it only exists long enough to be normalized.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawMoodInput {
    #[default]
    Absent,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<RawMoodInput>),
    Object(BTreeMap<String, RawMoodInput>),
    /// A shape the engine cannot interpret (callbacks, binary blobs...).
    Unsupported(String),
}

impl RawMoodInput {
    fn kind(&self) -> &'static str {
        match self {
            RawMoodInput::Absent => "absent",
            RawMoodInput::Bool(_) => "bool",
            RawMoodInput::Number(_) => "number",
            RawMoodInput::Text(_) => "text",
            RawMoodInput::List(_) => "list",
            RawMoodInput::Object(_) => "object",
            RawMoodInput::Unsupported(_) => "unsupported",
        }
    }

    /// Build an object input from key/value pairs.
    pub fn object<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<RawMoodInput>,
        I: IntoIterator<Item = (K, V)>,
    {
        RawMoodInput::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for RawMoodInput {
    fn from(s: &str) -> Self {
        RawMoodInput::Text(s.to_string())
    }
}

impl From<String> for RawMoodInput {
    fn from(s: String) -> Self {
        RawMoodInput::Text(s)
    }
}

impl From<bool> for RawMoodInput {
    fn from(b: bool) -> Self {
        RawMoodInput::Bool(b)
    }
}

impl From<f64> for RawMoodInput {
    fn from(n: f64) -> Self {
        RawMoodInput::Number(n)
    }
}

impl From<i64> for RawMoodInput {
    fn from(n: i64) -> Self {
        RawMoodInput::Number(n as f64)
    }
}

impl<T: Into<RawMoodInput>> From<Option<T>> for RawMoodInput {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawMoodInput::Absent)
    }
}

impl<T: Into<RawMoodInput>> From<Vec<T>> for RawMoodInput {
    fn from(items: Vec<T>) -> Self {
        RawMoodInput::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for RawMoodInput {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => RawMoodInput::Absent,
            Value::Bool(b) => RawMoodInput::Bool(b),
            Value::Number(n) => RawMoodInput::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => RawMoodInput::Text(s),
            Value::Array(items) => {
                RawMoodInput::List(items.into_iter().map(RawMoodInput::from).collect())
            }
            Value::Object(map) => RawMoodInput::Object(
                map.into_iter()
                    .map(|(k, v)| (k, RawMoodInput::from(v)))
                    .collect(),
            ),
        }
    }
}

/// How a category was reached. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    Flag,
    Score,
    Canonical,
    Alias,
    Fuzzy { similarity: f64 },
    Partial,
    Fallback,
}

/// Normalized Levenshtein similarity in [0, 1], measured in chars.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein::levenshtein(a, b) as f64 / max_len as f64
}

/// Trim, lowercase, drop everything but letters/whitespace/hyphens and keep
/// the leading word.
fn leading_token(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned.split_whitespace().next().map(str::to_string)
}

/// Folds raw mood signals into `MoodCategory`.
#[derive(Debug, Clone, Default)]
pub struct MoodNormalizer {
    config: NormalizerConfig,
}

impl MoodNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize any raw input. Total: always returns a category.
    pub fn normalize(&self, input: &RawMoodInput) -> MoodCategory {
        self.classify(input).0
    }

    pub fn normalize_str(&self, input: &str) -> MoodCategory {
        self.classify_text(input).0
    }

    pub fn normalize_json(&self, value: &serde_json::Value) -> MoodCategory {
        self.normalize(&RawMoodInput::from(value.clone()))
    }

    /// Normalize and report which rule produced the answer.
    pub fn classify(&self, input: &RawMoodInput) -> (MoodCategory, MatchKind) {
        self.classify_at_depth(input, 0)
    }

    fn classify_at_depth(&self, input: &RawMoodInput, depth: usize) -> (MoodCategory, MatchKind) {
        if depth > MAX_DEPTH {
            return self.fallback("nesting too deep");
        }

        match input {
            RawMoodInput::Bool(true) => (MoodCategory::Joy, MatchKind::Flag),
            RawMoodInput::Bool(false) => (MoodCategory::Sadness, MatchKind::Flag),
            RawMoodInput::Number(n) => (self.score_band(*n), MatchKind::Score),
            RawMoodInput::Text(s) => self.classify_text(s),
            RawMoodInput::List(items) => match items.iter().find(|i| matches!(i, RawMoodInput::Text(_))) {
                Some(first) => self.classify_at_depth(first, depth + 1),
                None => self.fallback("list without text elements"),
            },
            RawMoodInput::Object(map) => {
                let candidate = OBJECT_MOOD_KEYS
                    .iter()
                    .filter_map(|key| map.get(*key))
                    .find(|v| !matches!(v, RawMoodInput::Absent));
                match candidate {
                    Some(value) => self.classify_at_depth(value, depth + 1),
                    None => self.fallback("object without a mood key"),
                }
            }
            RawMoodInput::Absent | RawMoodInput::Unsupported(_) => self.fallback(input.kind()),
        }
    }

    fn score_band(&self, n: f64) -> MoodCategory {
        if n > self.config.score_high {
            MoodCategory::Joy
        } else if n < self.config.score_low {
            MoodCategory::Sadness
        } else {
            // NaN also lands here
            MoodCategory::Calm
        }
    }

    fn classify_text(&self, raw: &str) -> (MoodCategory, MatchKind) {
        let Some(token) = leading_token(raw) else {
            return self.fallback("empty text");
        };

        if let Some(mood) = MoodCategory::from_label(&token) {
            return (mood, MatchKind::Canonical);
        }

        if let Some((_, mood)) = ALIASES.iter().find(|(key, _)| *key == token) {
            return (*mood, MatchKind::Alias);
        }

        if let Some((mood, sim)) = self.fuzzy_match(&token) {
            tracing::trace!("Fuzzy mood match '{}' -> {} ({:.2})", token, mood, sim);
            return (mood, MatchKind::Fuzzy { similarity: sim });
        }

        if let Some(mood) = self.partial_match(&token) {
            tracing::trace!("Partial mood match '{}' -> {}", token, mood);
            return (mood, MatchKind::Partial);
        }

        self.fallback(&token)
    }

    fn fuzzy_match(&self, token: &str) -> Option<(MoodCategory, f64)> {
        let mut best: Option<(MoodCategory, f64)> = None;
        for (key, mood) in ALIASES {
            let sim = similarity(token, key);
            if best.map_or(true, |(_, b)| sim > b) {
                best = Some((*mood, sim));
            }
        }
        best.filter(|(_, sim)| *sim > self.config.fuzzy_threshold)
    }

    fn partial_match(&self, token: &str) -> Option<MoodCategory> {
        let token_len = token.chars().count();
        ALIASES
            .iter()
            .find(|(key, _)| {
                let key_len = key.chars().count();
                (key.contains(token) || token.contains(key))
                    && token_len.abs_diff(key_len) <= self.config.partial_max_len_diff
            })
            .map(|(_, mood)| *mood)
    }

    fn fallback(&self, what: &str) -> (MoodCategory, MatchKind) {
        tracing::debug!(
            "Unrecognized mood input ({}), defaulting to {}",
            what,
            self.config.default_category
        );
        (self.config.default_category, MatchKind::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n() -> MoodNormalizer {
        MoodNormalizer::default()
    }

    #[test]
    fn test_bool_dispatch() {
        assert_eq!(n().normalize(&true.into()), MoodCategory::Joy);
        assert_eq!(n().normalize(&false.into()), MoodCategory::Sadness);
    }

    #[test]
    fn test_number_bands() {
        assert_eq!(n().normalize(&0.9.into()), MoodCategory::Joy);
        assert_eq!(n().normalize(&0.5.into()), MoodCategory::Calm);
        assert_eq!(n().normalize(&0.1.into()), MoodCategory::Sadness);
        assert_eq!(n().normalize(&RawMoodInput::from(-5i64)), MoodCategory::Sadness);
        assert_eq!(n().normalize(&RawMoodInput::from(1i64)), MoodCategory::Joy);
        assert_eq!(n().normalize(&RawMoodInput::from(0i64)), MoodCategory::Sadness);
        assert_eq!(n().normalize(&f64::NAN.into()), MoodCategory::Calm);
    }

    #[test]
    fn test_canonical_passthrough() {
        for mood in MoodCategory::ALL {
            let (out, kind) = n().classify(&mood.as_str().into());
            assert_eq!(out, mood);
            assert_eq!(kind, MatchKind::Canonical);
        }
    }

    #[test]
    fn test_alias_lookup() {
        assert_eq!(n().normalize_str("peaceful"), MoodCategory::Calm);
        assert_eq!(n().normalize_str("worried"), MoodCategory::Anxious);
        assert_eq!(n().normalize_str("concerned"), MoodCategory::Anxious);
        assert_eq!(n().normalize_str("寂しい"), MoodCategory::Loneliness);
        assert_eq!(n().normalize_str("开心"), MoodCategory::Joy);
    }

    #[test]
    fn test_preprocessing_strips_noise() {
        assert_eq!(n().normalize_str("  HAPPY!! "), MoodCategory::Joy);
        assert_eq!(n().normalize_str("sad and tired"), MoodCategory::Sadness);
        assert_eq!(n().normalize_str("Lonely..."), MoodCategory::Loneliness);
    }

    #[test]
    fn test_fuzzy_match() {
        let (mood, kind) = n().classify(&"happpy".into());
        assert_eq!(mood, MoodCategory::Joy);
        match kind {
            MatchKind::Fuzzy { similarity } => assert!(similarity > 0.8 && similarity < 0.84),
            other => panic!("expected fuzzy match, got {:?}", other),
        }
        assert_eq!(n().normalize_str("lonelyy"), MoodCategory::Loneliness);
    }

    #[test]
    fn test_partial_match() {
        let (mood, kind) = n().classify(&"madd".into());
        assert_eq!(mood, MoodCategory::Anger);
        assert!(matches!(kind, MatchKind::Partial | MatchKind::Fuzzy { .. }));

        let (mood, kind) = n().classify(&"sadxy".into());
        assert_eq!(mood, MoodCategory::Sadness);
        assert_eq!(kind, MatchKind::Partial);
    }

    #[test]
    fn test_partial_match_short_tokens() {
        let (mood, kind) = n().classify(&"怒る".into());
        assert_eq!(mood, MoodCategory::Anger);
        assert_eq!(kind, MatchKind::Partial);

        let (mood, kind) = n().classify(&"不安だ".into());
        assert_eq!(mood, MoodCategory::Anxious);
        assert_eq!(kind, MatchKind::Partial);

        let (mood, kind) = n().classify(&"ma".into());
        assert_eq!(mood, MoodCategory::Anger);
        assert_eq!(kind, MatchKind::Partial);
    }

    #[test]
    fn test_fallbacks() {
        for input in [
            RawMoodInput::Absent,
            "".into(),
            "   ".into(),
            "!!!???".into(),
            "xyz123".into(),
            RawMoodInput::Unsupported("fn".to_string()),
            RawMoodInput::List(vec![]),
            RawMoodInput::object(Vec::<(String, RawMoodInput)>::new()),
        ] {
            let (mood, kind) = n().classify(&input);
            assert_eq!(mood, MoodCategory::Calm, "input {:?}", input);
            assert_eq!(kind, MatchKind::Fallback, "input {:?}", input);
        }
    }

    #[test]
    fn test_list_takes_first_text() {
        let input = RawMoodInput::List(vec![
            RawMoodInput::Number(0.1),
            "happy".into(),
            "sad".into(),
        ]);
        assert_eq!(n().normalize(&input), MoodCategory::Joy);
    }

    #[test]
    fn test_object_key_priority() {
        let input = RawMoodInput::object([("feeling", "worried")]);
        assert_eq!(n().normalize(&input), MoodCategory::Anxious);

        let input = RawMoodInput::object([("state", "sleepy"), ("mood", "sad")]);
        assert_eq!(n().normalize(&input), MoodCategory::Sadness);

        // absent values are skipped
        let input = RawMoodInput::object([
            ("mood", RawMoodInput::Absent),
            ("emotion", RawMoodInput::from(true)),
        ]);
        assert_eq!(n().normalize(&input), MoodCategory::Joy);
    }

    #[test]
    fn test_json_input() {
        let value = serde_json::json!({ "mood": ["lonely", "sad"] });
        assert_eq!(n().normalize_json(&value), MoodCategory::Loneliness);
        assert_eq!(n().normalize_json(&serde_json::Value::Null), MoodCategory::Calm);
        assert_eq!(n().normalize_json(&serde_json::json!(0.95)), MoodCategory::Joy);
    }

    #[test]
    fn test_deep_nesting_falls_back() {
        let mut input = RawMoodInput::from("happy");
        for _ in 0..20 {
            input = RawMoodInput::object([("mood", input)]);
        }
        assert_eq!(n().normalize(&input), MoodCategory::Calm);
    }

    #[test]
    fn test_custom_default() {
        let config = NormalizerConfig {
            default_category: MoodCategory::Sulky,
            ..Default::default()
        };
        assert_eq!(MoodNormalizer::new(config).normalize_str("qqqq"), MoodCategory::Sulky);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Joy".parse::<MoodCategory>().unwrap(), MoodCategory::Joy);
        assert!("happy".parse::<MoodCategory>().is_err());
    }

    #[test]
    fn test_similarity() {
        assert!((similarity("happy", "happy") - 1.0).abs() < 1e-9);
        assert!((similarity("", "") - 1.0).abs() < 1e-9);
        assert!(similarity("xyz", "joy") < 0.1);
    }

    #[test]
    fn test_alias_table_targets_canonical_set() {
        for (key, mood) in ALIASES {
            assert!(MoodCategory::ALL.contains(mood));
            assert_eq!(leading_token(key).as_deref(), Some(*key), "alias '{}' is not normalized", key);
        }
    }
}
