//! Keyword-based tone and topic inference for English/Japanese/Chinese text.
//!
//! Deliberately independent of the mood normalizer: this scores whole
//! messages, the normalizer resolves single labels.

use amae_core::Tone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a message is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    #[default]
    General,
    Food,
    Work,
    Sleep,
    Weather,
    Health,
    Hobby,
    Love,
    /// A shared photo, with its caption (possibly empty).
    Photo(String),
}

impl Topic {
    /// Generic topics never count towards continuity.
    pub fn is_generic(&self) -> bool {
        *self == Topic::General
    }

    pub fn as_str(&self) -> &str {
        match self {
            Topic::General => "general",
            Topic::Food => "food",
            Topic::Work => "work",
            Topic::Sleep => "sleep",
            Topic::Weather => "weather",
            Topic::Health => "health",
            Topic::Hobby => "hobby",
            Topic::Love => "love",
            Topic::Photo(_) => "photo",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Photo(caption) if !caption.is_empty() => write!(f, "photo ({})", caption),
            other => f.write_str(other.as_str()),
        }
    }
}

// Table order breaks ties.
const TONE_KEYWORDS: &[(Tone, &[&str])] = &[
    (
        Tone::Hurt,
        &["hurt", "hurts", "betrayed", "ouch", "傷つ", "ひどい", "受伤", "心痛"],
    ),
    (
        Tone::Angry,
        &[
            "angry", "mad", "annoyed", "furious", "hate", "pissed", "怒", "ムカつ", "腹立", "生气",
            "讨厌", "烦", "😡", "😠",
        ],
    ),
    (
        Tone::Sad,
        &[
            "sad", "cry", "crying", "cried", "upset", "depressed", "悲しい", "泣", "难过", "伤心",
            "😢", "😭",
        ],
    ),
    (
        Tone::Lonely,
        &[
            "lonely", "alone", "miss", "missing", "missed", "寂しい", "さみしい", "会いたい",
            "寂寞", "想你",
        ],
    ),
    (
        Tone::Anxious,
        &[
            "worried", "worry", "anxious", "nervous", "scared", "afraid", "不安", "心配", "怖い",
            "担心", "害怕", "紧张",
        ],
    ),
    (
        Tone::Affectionate,
        &[
            "love", "darling", "dear", "sweetheart", "hug", "hugs", "cuddle", "kiss", "好き",
            "大好き", "爱你", "喜欢", "亲亲", "❤️", "💕", "🥰",
        ],
    ),
    (
        Tone::Tired,
        &[
            "tired", "sleepy", "exhausted", "drained", "眠い", "疲れ", "しんどい", "累", "困了",
            "😴",
        ],
    ),
    (
        Tone::Playful,
        &[
            "haha", "hahaha", "lol", "lmao", "hehe", "jk", "teasing", "www", "笑", "哈哈", "嘿嘿",
            "😜", "😝", "😆",
        ],
    ),
    (
        Tone::Happy,
        &[
            "happy", "glad", "great", "awesome", "yay", "nice", "wonderful", "excited", "嬉しい",
            "楽しい", "やった", "开心", "高兴", "太好了", "😊", "😄",
        ],
    ),
];

const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (
        Topic::Food,
        &[
            "food", "eat", "eating", "ate", "lunch", "dinner", "breakfast", "hungry", "cook",
            "cooking", "ramen", "sushi", "pizza", "snack", "ご飯", "ごはん", "食べ", "お腹", "吃",
            "饭", "饿",
        ],
    ),
    (
        Topic::Work,
        &[
            "work", "working", "job", "office", "boss", "meeting", "deadline", "project",
            "overtime", "仕事", "会社", "残業", "工作", "上班", "加班", "老板",
        ],
    ),
    (
        Topic::Sleep,
        &[
            "sleep", "sleeping", "slept", "bed", "nap", "dream", "insomnia", "寝", "眠", "夢",
            "睡", "做梦",
        ],
    ),
    (
        Topic::Weather,
        &[
            "weather", "rain", "raining", "rainy", "sunny", "snow", "snowing", "storm", "天気",
            "雨", "雪", "天气", "下雨",
        ],
    ),
    (
        Topic::Health,
        &[
            "sick", "ill", "fever", "cold", "doctor", "headache", "hospital", "medicine", "病院",
            "風邪", "熱", "薬", "生病", "医院", "感冒", "发烧",
        ],
    ),
    (
        Topic::Hobby,
        &[
            "game", "games", "gaming", "movie", "movies", "music", "song", "book", "reading",
            "anime", "drawing", "趣味", "ゲーム", "映画", "アニメ", "游戏", "电影", "音乐",
        ],
    ),
    (
        Topic::Love,
        &[
            "date", "dating", "boyfriend", "girlfriend", "relationship", "crush", "romance",
            "デート", "恋", "彼氏", "彼女", "约会", "恋爱", "男朋友", "女朋友",
        ],
    ),
];

/// Lowercased text plus its alphanumeric word tokens.
struct Prepared {
    lower: String,
    tokens: Vec<String>,
}

impl Prepared {
    fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let tokens = lower
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .map(|t| t.trim_matches('\'').to_string())
            .collect();
        Self { lower, tokens }
    }

    /// ASCII keywords must match a whole word; anything else is a substring
    /// match (CJK has no word boundaries, emoji are single graphemes).
    fn hits(&self, keyword: &str) -> bool {
        if keyword.is_ascii() {
            self.tokens.iter().any(|t| t == keyword)
        } else {
            self.lower.contains(keyword)
        }
    }

    fn score(&self, keywords: &[&str]) -> usize {
        keywords.iter().filter(|k| self.hits(k)).count()
    }
}

fn best_match<'a, T>(table: &'a [(T, &[&str])], prepared: &Prepared) -> Option<&'a T> {
    let mut best: Option<(&T, usize)> = None;
    for (label, keywords) in table {
        let score = prepared.score(keywords);
        if score > 0 && best.map_or(true, |(_, b)| score > b) {
            best = Some((label, score));
        }
    }
    best.map(|(label, _)| label)
}

/// Infer the tone of a message. No keyword hit is `Tone::Neutral`.
pub fn infer_tone(text: &str) -> Tone {
    let prepared = Prepared::new(text);
    best_match(TONE_KEYWORDS, &prepared)
        .copied()
        .unwrap_or(Tone::Neutral)
}

/// Infer the topic of a message. No keyword hit is `Topic::General`.
pub fn infer_topic(text: &str) -> Topic {
    let prepared = Prepared::new(text);
    best_match(TOPIC_KEYWORDS, &prepared)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_text() {
        assert_eq!(infer_tone("see you tomorrow"), Tone::Neutral);
        assert_eq!(infer_tone(""), Tone::Neutral);
    }

    #[test]
    fn test_english_tones() {
        assert_eq!(infer_tone("I'm so happy today!"), Tone::Happy);
        assert_eq!(infer_tone("haha you're silly"), Tone::Playful);
        assert_eq!(infer_tone("I really miss you"), Tone::Lonely);
        assert_eq!(infer_tone("ugh I'm so tired"), Tone::Tired);
        assert_eq!(infer_tone("that really hurt"), Tone::Hurt);
    }

    #[test]
    fn test_cjk_tones() {
        assert_eq!(infer_tone("今日はすごく嬉しい"), Tone::Happy);
        assert_eq!(infer_tone("我很难过"), Tone::Sad);
        assert_eq!(infer_tone("寂しいよ"), Tone::Lonely);
    }

    #[test]
    fn test_emoji_tone() {
        assert_eq!(infer_tone("😭😭"), Tone::Sad);
    }

    #[test]
    fn test_whole_word_matching() {
        // "great" must not register "eat", "madness" is not "mad"
        assert_eq!(infer_topic("great news"), Topic::General);
        assert_eq!(infer_tone("madness"), Tone::Neutral);
    }

    #[test]
    fn test_strongest_tone_wins() {
        assert_eq!(infer_tone("sad and crying but glad you're here"), Tone::Sad);
    }

    #[test]
    fn test_topics() {
        assert_eq!(infer_topic("ramen for lunch?"), Topic::Food);
        assert_eq!(infer_topic("my boss called another meeting"), Topic::Work);
        assert_eq!(infer_topic("it's raining again"), Topic::Weather);
        assert_eq!(infer_topic("今日は仕事が大変"), Topic::Work);
        assert_eq!(infer_topic("晚上吃什么"), Topic::Food);
        assert_eq!(infer_topic("hello"), Topic::General);
    }

    #[test]
    fn test_topic_display() {
        assert_eq!(Topic::Food.to_string(), "food");
        assert_eq!(Topic::Photo("sunset".into()).to_string(), "photo (sunset)");
        assert_eq!(Topic::Photo(String::new()).to_string(), "photo");
        assert!(Topic::General.is_generic());
        assert!(!Topic::Photo(String::new()).is_generic());
    }
}
