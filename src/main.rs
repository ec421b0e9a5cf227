//! Decorates a JSON snapshot of a room timeline and prints the resulting display metadata.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ruma::OwnedUserId;
use serde::Deserialize;
use timeline_decorations::{
    DecorationPreferences, MessageDecorationEngine, MessageDisplayMetadata, RoomContext,
    TimelineEvent, TrustSnapshot, timeline::pass::decorate_timeline,
};
use tracing::Level;

#[derive(Parser, Debug)]
struct Cli {
    /// A JSON file with the viewer's user ID, the room, trust info, and the timeline events.
    #[clap(value_parser)]
    snapshot: PathBuf,

    /// A JSON file with the decoration preferences.
    #[clap(short, long)]
    prefs: Option<PathBuf>,

    /// Enable verbose logging output.
    #[clap(short, long, action)]
    verbose: bool,

    /// Pretty-print the output.
    #[clap(long, action)]
    pretty: bool,
}

/// A timeline as seen by one user.
#[derive(Debug, Deserialize)]
struct Snapshot {
    my_user_id: OwnedUserId,
    room: RoomContext,
    #[serde(default)]
    trust: TrustSnapshot,
    /// The timeline's events, oldest first.
    events: Vec<TimelineEvent>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let prefs = match &cli.prefs {
        Some(path) => DecorationPreferences::load(path)?,
        None => DecorationPreferences::default(),
    };

    let json = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("failed to read snapshot {}", cli.snapshot.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&json)
        .with_context(|| format!("invalid snapshot {}", cli.snapshot.display()))?;
    tracing::debug!(
        "Loaded {} events of room {} for {}",
        snapshot.events.len(),
        snapshot.room.room_id,
        snapshot.my_user_id,
    );

    let engine = MessageDecorationEngine::new(&snapshot.my_user_id, &snapshot.trust, &prefs);
    // Hidden events never reach the snapshot, so every event is displayable.
    let decorated = decorate_timeline(&engine, &snapshot.events, &snapshot.room, |_| true);
    let items: Vec<&MessageDisplayMetadata> = decorated.values().collect();

    let output = if cli.pretty {
        serde_json::to_string_pretty(&items)?
    } else {
        serde_json::to_string(&items)?
    };
    println!("{output}");
    Ok(())
}
