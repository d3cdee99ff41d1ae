//! Lane Runner Simulator
//!
//! Runs a seeded headless session with a simple autopilot, then replays
//! the same seed and input to check that both runs hash identically.
//!
//! ```text
//! lane-runner-sim [--config FILE] [--catalog FILE] [--character NAME] [--frames N]
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use lane_runner::{
    FRAME_DT, TICK_RATE, VERSION,
    config::GameConfig,
    core::StateHash,
    game::{
        camera::FollowCamera,
        environment::{CharacterId, EnvironmentCatalog},
        events::GameEventData,
        services::Services,
        session::GameSession,
        state::GameState,
    },
};

/// Default run length: two minutes.
const DEFAULT_FRAMES: u64 = 120 * TICK_RATE as u64;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    character: Option<String>,
    frames: Option<u64>,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Self::default();
        let mut iter = std::env::args().skip(1);
        while let Some(flag) = iter.next() {
            let mut value = || iter.next().with_context(|| format!("missing value for {}", flag));
            match flag.as_str() {
                "--config" => args.config = Some(value()?.into()),
                "--catalog" => args.catalog = Some(value()?.into()),
                "--character" => args.character = Some(value()?),
                "--frames" => {
                    args.frames = Some(value()?.parse().context("--frames expects a number")?)
                }
                other => bail!("unknown argument: {}", other),
            }
        }
        Ok(args)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Lane Runner Simulator v{}", VERSION);
    info!("Frame Rate: {} Hz", TICK_RATE);

    let args = Args::parse()?;

    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            EnvironmentCatalog::from_json_str(&json)?
        }
        None => EnvironmentCatalog::default(),
    };
    let character = args.character.map(CharacterId::new);
    let frames = args.frames.unwrap_or(DEFAULT_FRAMES);

    info!("=== Starting Demo Run ===");
    let hash = demo_run(&config, &catalog, character.as_ref(), frames, true)?;
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replay_hash = demo_run(&config, &catalog, character.as_ref(), frames, false)?;
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        bail!("DETERMINISM FAILURE: Hashes differ!");
    }

    Ok(())
}

/// Play one run with the autopilot and return the final state hash.
fn demo_run(
    config: &GameConfig,
    catalog: &EnvironmentCatalog,
    character: Option<&CharacterId>,
    frames: u64,
    verbose: bool,
) -> Result<StateHash> {
    let services = Services::headless(Box::new(FollowCamera::new(&config.camera)));
    let mut session = GameSession::new(config.clone(), catalog, character, services)?;

    if verbose {
        info!("Environment: {}", session.environment().name);
        info!("Run Seed: {:#018x}", session.run_seed());
        session.subscribe_events(|event| match &event.data {
            GameEventData::PlayerDied { cause } => {
                info!("Frame {}: player died ({:?})", event.frame, cause);
            }
            GameEventData::BirdLaunched { bird } => {
                info!("Frame {}: bird {} launched", event.frame, bird.index);
            }
            GameEventData::RunEnded { score, high_score, .. } => {
                info!("Frame {}: run ended, score {} (best {})", event.frame, score, high_score);
            }
            _ => {}
        });
    }

    session.start_game();

    let mut last_report = 0;
    for frame in 0..frames {
        let steering = autopilot(&session);
        session.update(FRAME_DT, steering);

        if verbose && frame - last_report >= 10 * TICK_RATE as u64 {
            info!(
                "Frame {}: z {:.1}, score {}, state {:?}",
                frame,
                session.player().position.z,
                session.scoreboard().score(),
                session.state()
            );
            last_report = frame;
        }

        if session.state() == GameState::GameOver {
            break;
        }
    }

    if verbose {
        info!("=== Run Results ===");
        info!("Frames: {}", session.frame());
        info!("Score: {}", session.scoreboard().score());
        info!("High Score: {}", session.scoreboard().high_score());
    }

    Ok(session.compute_hash())
}

/// Steer back toward the middle of the current wall pair.
fn autopilot(session: &GameSession) -> bool {
    let track = session.track();
    let position = session.player().position;

    // Pair whose span covers the player's z
    let stride = track.config().wall_stride;
    let pair = track
        .left_walls()
        .iter()
        .zip(track.right_walls())
        .find(|(left, _)| (left.position.z - position.z).abs() <= stride / 2.0);

    let center = match pair {
        Some((left, right)) => (left.position.x + right.position.x) / 2.0,
        None => 0.0,
    };
    position.x > center
}
