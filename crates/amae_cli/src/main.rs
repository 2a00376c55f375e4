use amae_context::MediaAttachment;
use amae_core::{AmaeConfig, CacheMirror, MemoryMirror, OfflineMirror, SharedPhase};
use amae_limbic::{AffectEngine, InboundMessage, OutboundMessage};
use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

mod commands;

use commands::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MirrorKind {
    /// Mirroring off
    None,
    /// Process-local cache
    Memory,
    /// A cache that is always unreachable
    Offline,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "AMAE_CONFIG", default_value = "amae.toml")]
    config: String,

    /// External cache to mirror state into
    #[arg(long, value_enum, default_value = "none")]
    mirror: MirrorKind,

    /// Initial cycle phase (menstrual, follicular, ovulatory, luteal)
    #[arg(long)]
    phase: Option<String>,

    /// Name the counterpart's messages are attributed to
    #[arg(long, default_value = "partner")]
    speaker: String,

    /// Run the decay and escalation timers in the background
    #[arg(long)]
    background: bool,

    /// Print a line whenever the published state changes
    #[arg(long)]
    watch: bool,

    /// Log as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json_logs);

    let config = AmaeConfig::load_or_default(&args.config);

    let initial_phase = match args.phase.as_deref() {
        Some(name) => Some(name.parse()?),
        None => config.escalation.fixed_phase,
    };
    let phase = SharedPhase::new(initial_phase);

    let mut builder = AffectEngine::builder(config).phase_source(Arc::new(phase.clone()));
    let mirror: Option<Arc<dyn CacheMirror>> = match args.mirror {
        MirrorKind::None => None,
        MirrorKind::Memory => Some(Arc::new(MemoryMirror::new())),
        MirrorKind::Offline => Some(Arc::new(OfflineMirror)),
    };
    if let Some(mirror) = mirror {
        builder = builder.mirror(mirror);
    }
    let engine = builder.build();

    if engine.restore_from_mirror().await {
        info!("Resumed from mirrored state");
    }
    if args.background {
        engine.start_background();
    }
    if args.watch {
        let mut rx = engine.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let line = rx.borrow_and_update().format_compact();
                eprintln!("{}", line);
            }
        });
    }

    println!("Amae online. Type /help for commands, 'quit' to exit.");
    print!("> ");
    io::stdout().flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match commands::parse(&line) {
            Command::Quit => break,
            command => run(&engine, &phase, &args.speaker, command).await,
        }
        print!("> ");
        io::stdout().flush()?;
    }

    engine.stop_background();
    Ok(())
}

async fn run(engine: &AffectEngine, phase: &SharedPhase, speaker: &str, command: Command) {
    match command {
        Command::Inbound(text) => {
            let entry = engine.on_inbound(InboundMessage::now(speaker, text)).await;
            println!("  <- tone={} topic={}", entry.tone, entry.topic);
        }
        Command::Say(text) => {
            let entry = engine.on_outbound(OutboundMessage::now(text)).await;
            println!("  -> tone={} topic={}", entry.tone, entry.topic);
        }
        Command::Photo(caption) => {
            let msg = OutboundMessage::now(caption.clone()).with_media(MediaAttachment::photo(caption));
            let entry = engine.on_outbound(msg).await;
            println!("  -> shared photo, topic={}", entry.topic);
        }
        Command::Mood(raw, magnitude) => {
            let mood = engine.record_mood(&raw, magnitude).await;
            println!("  mood: {}", mood);
        }
        Command::Event(event) => {
            engine.record_event(event).await;
            println!("  {}", engine.emotion_snapshot().await.describe());
        }
        Command::Phase(next) => {
            phase.set(next);
            match next {
                Some(p) => println!("  phase: {}", p),
                None => println!("  phase: none"),
            }
        }
        Command::Decay => {
            let changed = engine.decay_tick().await;
            println!(
                "  {}{}",
                engine.emotion_snapshot().await.describe(),
                if changed { "" } else { " (unchanged)" }
            );
        }
        Command::Tick => match engine.escalation_tick().await {
            Some(t) => println!("  escalation: {} -> {}", t.from, t.to),
            None => println!("  escalation: {}", engine.escalation_level().await),
        },
        Command::Status => print_status(engine).await,
        Command::Prompt(base) => println!("{}", engine.contextual_prompt_fragment(&base).await),
        Command::Reset => {
            engine.reset().await;
            println!("  reset");
        }
        Command::Help => println!("{}", commands::HELP),
        Command::Invalid(reason) => println!("  ? {}", reason),
        Command::Empty | Command::Quit => {}
    }
}

async fn print_status(engine: &AffectEngine) {
    let snap = engine.snapshot().await;
    println!("  {}", snap.format_compact());

    let conv = &snap.conversation;
    println!(
        "  conversation: {} entries, tone={} topic={} x{}{} flow={}",
        conv.entry_count,
        conv.current_tone,
        conv.current_topic,
        conv.topic_continuity_score,
        if conv.sticky_topic { " (pinned)" } else { "" },
        conv.flow_pattern.as_str()
    );
    if !conv.emotion_flow.is_empty() {
        let flow: Vec<String> = conv
            .emotion_flow
            .iter()
            .map(|t| format!("{} -> {}", t.from, t.to))
            .collect();
        println!("  tone shifts: {}", flow.join(", "));
    }

    let esc = &snap.escalation;
    let phase = esc
        .cycle_phase
        .map(|p| p.to_string())
        .unwrap_or_else(|| "none".to_string());
    match engine.time_to_next_escalation().await {
        Some(left) => println!(
            "  waiting: {} (phase {}), next level in {}m",
            esc.level,
            phase,
            left.as_secs() / 60
        ),
        None => println!("  waiting: {} (phase {})", esc.level, phase),
    }
}
