//! Quadball Core Demo
//!
//! Runs a scripted standard match, checks that a mid-run clone stays in
//! lockstep with the original, then hosts a room briefly in real time.
//!
//! Usage: `quadball-core [config.json] [ticks]`

use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use quadball::{
    game::events::GameEventData,
    host::Room,
    Match, MatchConfig, PlayerId, Vec2, DEFAULT_TICK_RATE, VERSION,
};

/// Ticks simulated when no count is given (one game minute at defaults).
const DEFAULT_DEMO_TICKS: u64 = 400;

/// Real time the room host runs for.
const ROOM_WINDOW: Duration = Duration::from_secs(2);

/// Room updates between progress lines.
const REPORT_EVERY: u64 = DEFAULT_TICK_RATE as u64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Quadball Core v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => MatchConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => MatchConfig::default(),
    };
    let config = config.apply_env().context("applying environment overrides")?;
    let ticks = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid tick count {n}"))?,
        None => DEFAULT_DEMO_TICKS,
    };
    info!(
        seed = config.seed,
        tick_rate = config.tick_rate,
        default_tick_rate = DEFAULT_TICK_RATE,
        dt = config.dt(),
        "configuration"
    );

    demo_match(&config, ticks)?;
    demo_room(&config).await?;
    Ok(())
}

/// Scripted input: every player sweeps through directions at its own rate,
/// and carriers throw every few seconds.
fn drive(game: &mut Match, t: u64) {
    let ids: Vec<PlayerId> = game.state().players.keys().copied().collect();
    for id in ids {
        let angle = ((t * (id.0 as u64 + 1) * 7) % 360) as f64;
        let dir = Vec2::new(angle.to_radians().cos(), angle.to_radians().sin());
        // Both components are finite and the id exists.
        let _ = game.set_direction(id, dir);
        if t % 25 == id.0 as u64 % 25 {
            game.throw(id);
        }
    }
}

fn demo_match(config: &MatchConfig, ticks: u64) -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");
    let mut game = Match::from_config(config).context("building match")?;
    let dt = config.dt();
    let fork_at = ticks / 2;
    let mut fork: Option<Match> = None;
    let mut total_events = 0usize;

    for t in 0..ticks {
        if t == fork_at {
            fork = Some(game.clone());
            info!(tick = game.state().tick, hash = %hex::encode(game.compute_hash()), "cloned match");
        }

        drive(&mut game, t);
        let result = game.update(dt);
        total_events += result.events.len();

        for event in &result.events {
            match &event.data {
                GameEventData::GoalScored { hoop_id, credited, score, .. } => {
                    info!(tick = event.tick, hoop = hoop_id.0, ?credited, ?score, "goal");
                }
                GameEventData::KnockedOut { player_id, .. } => {
                    info!(tick = event.tick, player = player_id.0, "knocked out");
                }
                GameEventData::DelayOfGamePenalty { team } => {
                    info!(tick = event.tick, ?team, "delay of game penalty");
                }
                _ => {}
            }
        }

        if let Some(fork) = fork.as_mut() {
            drive(fork, t);
            fork.update(dt);
        }
    }

    info!("=== Match Results ===");
    let hash = game.compute_hash();
    info!(score = ?game.score(), total_events, hash = %hex::encode(hash), "final state");

    if let Some(fork) = fork {
        let fork_hash = fork.compute_hash();
        info!(hash = %hex::encode(fork_hash), "clone final state");
        if fork_hash != hash {
            bail!("clone diverged from the live match");
        }
        info!("DETERMINISM VERIFIED: Hashes match!");
    }
    Ok(())
}

async fn demo_room(config: &MatchConfig) -> anyhow::Result<()> {
    info!("=== Hosting Room ===");
    let (handle, task) = Room::spawn(config).context("spawning room")?;
    let mut updates = handle.subscribe();

    handle.set_direction(PlayerId(0), Vec2::RIGHT).await?;

    let watcher = tokio::spawn(async move {
        let mut received = 0u64;
        while let Ok(update) = updates.recv().await {
            received += 1;
            if update.tick % REPORT_EVERY == 0 {
                info!(tick = update.tick, score = ?update.score, "room update");
            }
        }
        received
    });

    tokio::time::sleep(ROOM_WINDOW).await;
    handle.shutdown().await?;
    let game = task.await.context("room task panicked")?;
    drop(handle);

    let received = watcher.await.context("watcher task panicked")?;
    if received == 0 {
        warn!("room produced no updates");
    }
    info!(ticks = game.state().tick, received, score = ?game.score(), "room closed");
    Ok(())
}
