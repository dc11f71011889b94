//! Headless match server.
//!
//! Hosts one authoritative match and drives both teams with scripted
//! observers, while a spectator follows the replicated feed.
//!
//! # Configuration
//!
//! Rules and runtime settings come from `TACTICS_*` environment variables
//! (a `.env` file is honoured); log filtering from `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=tactics=debug,runtime=info cargo run -p tactics-server
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tactics_core::{Archetype, MatchResult, MatchSetup, Notification, Obstacle, Point, TeamId};
use tactics_runtime::wire::{self, ServerMessage};
use tactics_runtime::{
    ActionProvider, Event, ObserverClient, Runtime, RuntimeConfig, RuntimeHandle,
    SkirmishProvider,
};

/// Upper bound on a demo match in wall-clock time.
const MATCH_DEADLINE: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    setup_logging();

    let config = RuntimeConfig::from_env();
    info!(
        turn_time = config.match_rules.turn_time,
        timer_scope = %config.match_rules.timer_scope,
        tick_ms = config.tick_interval.as_millis() as u64,
        "configuration loaded"
    );

    let runtime = Runtime::builder()
        .config(config)
        .setup(demo_arena()?)
        .build()
        .await
        .context("failed to start match")?;
    let handle = runtime.handle();

    let host = spawn_team(&handle, TeamId::Zero, SkirmishProvider).await?;
    let guest = spawn_team(&handle, TeamId::One, SkirmishProvider).await?;
    let spectator = ObserverClient::connect(handle.clone(), None).await?;

    match tokio::time::timeout(MATCH_DEADLINE, spectate(spectator)).await {
        Ok(result) => {
            let result = result?;
            info!(%result, "match finished");
        }
        Err(_) => warn!(deadline_secs = MATCH_DEADLINE.as_secs(), "match deadline reached"),
    }

    runtime.shutdown().await?;
    for team in [host, guest] {
        if let Ok(Err(err)) = team.await {
            debug!(error = %err, "team driver stopped");
        }
    }
    Ok(())
}

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Two units a side with a pillar in the middle of the field.
fn demo_arena() -> Result<MatchSetup> {
    let mut setup = MatchSetup::new();
    setup.spawn(TeamId::Zero, Archetype::Standard, Point::ground(0.0, 0.0))?;
    setup.spawn(TeamId::Zero, Archetype::LongRange, Point::ground(0.0, 4.0))?;
    setup.spawn(TeamId::One, Archetype::ShortRange, Point::ground(8.0, 0.0))?;
    setup.spawn(TeamId::One, Archetype::Standard, Point::ground(8.0, 4.0))?;
    setup.obstacle(Obstacle::pillar(Point::ground(4.0, 2.0), 0.5, 0.5, 2.0));
    Ok(setup)
}

async fn spawn_team(
    handle: &RuntimeHandle,
    team: TeamId,
    provider: impl ActionProvider + 'static,
) -> Result<tokio::task::JoinHandle<tactics_runtime::Result<MatchResult>>> {
    let mut client = ObserverClient::connect(handle.clone(), Some(team)).await?;
    info!(%team, connection = %client.connection().id, "team driver connected");

    Ok(tokio::spawn(async move { client.play(&provider).await }))
}

/// Follows the feed until the match ends, logging each cue.
async fn spectate(mut spectator: ObserverClient) -> Result<MatchResult> {
    loop {
        let event = spectator.next_event().await?;
        if tracing::enabled!(target: "server::feed", tracing::Level::DEBUG) {
            let frame = wire::encode(&ServerMessage::from(event.clone()))?;
            debug!(target: "server::feed", %frame);
        }

        let Event::Notification(notification) = event else {
            continue;
        };
        match notification {
            Notification::ActiveUnitChanged { actor, team } => {
                let remaining = spectator.replica().remaining_time();
                info!(%team, %actor, remaining, "unit active");
            }
            Notification::AttackPerformed { attacker, target } => {
                info!(%attacker, %target, "attack");
            }
            Notification::ActorDied { actor } => info!(%actor, "unit down"),
            Notification::MatchEnded { result } => return Ok(result),
            Notification::HitTaken { .. } | Notification::TurnEnded { .. } => {}
        }
    }
}
