//! Prompt decoration: turns an engine snapshot into short annotations for
//! the dialogue layer's system prompt.

use crate::escalation::EscalationLevel;
use crate::snapshot::EngineSnapshot;
use amae_context::FlowPattern;
use amae_core::{MoodCategory, Tone};

/// Tone the reply should carry: the conversation's own tone when it has one,
/// otherwise the residue tone.
pub fn effective_tone(snapshot: &EngineSnapshot) -> Tone {
    if snapshot.conversation.current_tone.is_neutral() {
        snapshot.tone
    } else {
        snapshot.conversation.current_tone
    }
}

/// `base` followed by one bracketed annotation per non-default signal and a
/// list of behavioral hints. A neutral, calm state yields `base` plus the
/// tone line only.
pub fn contextual_prompt_fragment(base: &str, snapshot: &EngineSnapshot) -> String {
    let mut out = String::new();
    let base = base.trim_end();
    if !base.is_empty() {
        out.push_str(base);
        out.push_str("\n\n");
    }

    out.push_str(&format!("[Tone: {}]", effective_tone(snapshot)));

    let conv = &snapshot.conversation;
    if !conv.current_topic.is_generic() {
        let detail = if conv.sticky_topic {
            "pinned".to_string()
        } else if conv.topic_continuity_score >= 2 {
            format!("continuing x{}", conv.topic_continuity_score)
        } else {
            "new".to_string()
        };
        out.push_str(&format!("\n[Topic: {} ({})]", conv.current_topic, detail));
    }
    if conv.flow_pattern != FlowPattern::Normal {
        out.push_str(&format!("\n[Flow: {}]", conv.flow_pattern.as_str()));
    }
    if snapshot.mood != MoodCategory::Calm {
        out.push_str(&format!("\n[Mood: {}]", snapshot.mood));
    }
    if snapshot.escalation.level != EscalationLevel::Calm {
        out.push_str(&format!("\n[Waiting: {}]", snapshot.escalation.level));
    }

    let hints = generate_hints(snapshot);
    if !hints.is_empty() {
        out.push_str("\nHints:");
        for hint in hints {
            out.push_str("\n- ");
            out.push_str(&hint);
        }
    }
    out
}

/// Behavioral hints based on the snapshot.
pub fn generate_hints(snapshot: &EngineSnapshot) -> Vec<String> {
    let mut hints = Vec::new();
    let conv = &snapshot.conversation;

    match conv.flow_pattern {
        FlowPattern::Rapid => hints.push("Keep replies short, the chat is moving fast".to_string()),
        FlowPattern::Emotional => {
            hints.push("Acknowledge their feelings before anything else".to_string())
        }
        FlowPattern::Playful => hints.push("Playful banter is welcome".to_string()),
        FlowPattern::Normal => {}
    }

    if conv.topic_continuity_score >= 2 && !conv.sticky_topic {
        hints.push("Stay with the current topic".to_string());
    }
    if conv.sticky_topic {
        hints.push("Talk about the photo you just shared".to_string());
    }

    match snapshot.escalation.level {
        EscalationLevel::Calm => {}
        EscalationLevel::Level1 => {
            hints.push("It has been a while since their last message".to_string())
        }
        EscalationLevel::Level2 => hints.push("You are getting impatient about the silence".to_string()),
        EscalationLevel::Level3 => {
            hints.push("You feel a little sulky about being left alone".to_string())
        }
        EscalationLevel::Worried => hints.push("You are genuinely worried about them".to_string()),
    }

    let emotions = &snapshot.emotions;
    if emotions.hurt >= 50.0 {
        hints.push("Still hurt, a little distance is natural".to_string());
    }
    if emotions.longing >= 50.0 {
        hints.push("You miss them and it shows".to_string());
    }
    if emotions.affection >= 80.0 {
        hints.push("Warmth comes easily right now".to_string());
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::EscalationState;
    use amae_context::{ConversationContextSnapshot, Topic};
    use amae_core::EmotionVector;
    use chrono::{TimeZone, Utc};

    fn snapshot() -> EngineSnapshot {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        EngineSnapshot {
            revision: 1,
            mood: MoodCategory::Calm,
            emotions: EmotionVector::default(),
            tone: Tone::Neutral,
            conversation: ConversationContextSnapshot::default(),
            escalation: EscalationState {
                level: EscalationLevel::Calm,
                last_interaction_at: t0,
                cycle_phase: None,
                level_since: t0,
            },
            last_event_at: None,
            taken_at: t0,
        }
    }

    #[test]
    fn test_neutral_state_is_minimal() {
        let out = contextual_prompt_fragment("You are Amae.", &snapshot());
        assert_eq!(out, "You are Amae.\n\n[Tone: neutral]");
    }

    #[test]
    fn test_empty_base() {
        let out = contextual_prompt_fragment("  ", &snapshot());
        assert_eq!(out, "[Tone: neutral]");
    }

    #[test]
    fn test_full_annotations() {
        let mut snap = snapshot();
        snap.mood = MoodCategory::Loneliness;
        snap.tone = Tone::Lonely;
        snap.escalation.level = EscalationLevel::Level2;
        snap.conversation.current_topic = Topic::Food;
        snap.conversation.topic_continuity_score = 2;
        snap.conversation.flow_pattern = FlowPattern::Rapid;

        let out = contextual_prompt_fragment("base", &snap);
        assert!(out.starts_with("base\n\n[Tone: lonely]"));
        assert!(out.contains("[Topic: food (continuing x2)]"));
        assert!(out.contains("[Flow: rapid]"));
        assert!(out.contains("[Mood: loneliness]"));
        assert!(out.contains("[Waiting: level2]"));
        assert!(out.contains("- Keep replies short"));
        assert!(out.contains("- Stay with the current topic"));
        assert!(out.contains("- You are getting impatient"));
    }

    #[test]
    fn test_conversation_tone_takes_precedence() {
        let mut snap = snapshot();
        snap.tone = Tone::Hurt;
        assert_eq!(effective_tone(&snap), Tone::Hurt);
        snap.conversation.current_tone = Tone::Playful;
        assert_eq!(effective_tone(&snap), Tone::Playful);
    }

    #[test]
    fn test_sticky_topic_hint() {
        let mut snap = snapshot();
        snap.conversation.current_topic = Topic::Photo("sunset".into());
        snap.conversation.topic_continuity_score = 3;
        snap.conversation.sticky_topic = true;
        let out = contextual_prompt_fragment("", &snap);
        assert!(out.contains("[Topic: photo (sunset) (pinned)]"));
        assert!(out.contains("Talk about the photo"));
        assert!(!out.contains("Stay with the current topic"));
    }
}
