//! Console command parsing.

use amae_core::{CyclePhase, EmotionEvent, RawMoodInput};

/// Magnitude used by `/event` when none is given.
const DEFAULT_EVENT_MAGNITUDE: f32 = 30.0;

pub const HELP: &str = "\
Commands:
  <text>                 message from the counterpart
  /say <text>            message from the companion
  /photo <caption>       companion shares a photo
  /mood <json|text> [m]  record a mood signal (optional magnitude)
  /event <name> [m]      record an emotion event
  /phase <name|none>     set the cycle phase
  /decay                 run a decay tick now
  /tick                  run an escalation tick now
  /status                show the current state
  /prompt [base]         show the decorated prompt fragment
  /reset                 forget residue, mood and escalation
  /help                  this text
  quit                   leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Inbound(String),
    Say(String),
    Photo(String),
    Mood(RawMoodInput, Option<f32>),
    Event(EmotionEvent),
    Phase(Option<CyclePhase>),
    Decay,
    Tick,
    Status,
    Prompt(String),
    Reset,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Parse one console line.
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if line == "quit" || line == "exit" {
        return Command::Quit;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Inbound(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "say" if !arg.is_empty() => Command::Say(arg.to_string()),
        "photo" => Command::Photo(arg.to_string()),
        "mood" if !arg.is_empty() => parse_mood(arg),
        "event" => parse_event(arg),
        "phase" => parse_phase(arg),
        "decay" => Command::Decay,
        "tick" => Command::Tick,
        "status" => Command::Status,
        "prompt" => Command::Prompt(arg.to_string()),
        "reset" => Command::Reset,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "say" | "mood" => Command::Invalid(format!("/{} needs an argument", name)),
        other => Command::Invalid(format!("unknown command /{}", other)),
    }
}

/// JSON when it parses as JSON, plain text otherwise. A trailing number after
/// a JSON value or a single word is read as the magnitude.
fn parse_mood(arg: &str) -> Command {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(arg) {
        return Command::Mood(RawMoodInput::from(value), None);
    }

    if let Some((head, tail)) = arg.rsplit_once(char::is_whitespace) {
        if let Ok(magnitude) = tail.parse::<f32>() {
            let head = head.trim();
            let raw = serde_json::from_str::<serde_json::Value>(head)
                .map(RawMoodInput::from)
                .unwrap_or_else(|_| RawMoodInput::from(head));
            return Command::Mood(raw, Some(magnitude));
        }
    }
    Command::Mood(RawMoodInput::from(arg), None)
}

fn parse_event(arg: &str) -> Command {
    let mut parts = arg.split_whitespace();
    let Some(name) = parts.next() else {
        return Command::Invalid("/event needs a name".to_string());
    };
    let magnitude = match parts.next().map(str::parse::<f32>) {
        None => DEFAULT_EVENT_MAGNITUDE,
        Some(Ok(m)) => m,
        Some(Err(_)) => return Command::Invalid(format!("bad magnitude for /event {}", name)),
    };
    match EmotionEvent::from_name(name, magnitude) {
        Some(event) => Command::Event(event),
        None => Command::Invalid(format!("unknown event '{}'", name)),
    }
}

fn parse_phase(arg: &str) -> Command {
    match arg {
        "" | "none" => Command::Phase(None),
        name => match name.parse::<CyclePhase>() {
            Ok(phase) => Command::Phase(Some(phase)),
            Err(e) => Command::Invalid(e.to_string()),
        },
    }
}
