use std::path::PathBuf;

use clap::Parser;
use dose_runner::config::RunnerConfig;
use dose_runner::logging::init_logging;
use dose_runner::maze::Maze;
use dose_runner::player_info::validate_player_info;
use dose_runner::prefs::{FilePreferences, MemoryPreferences, SharedPreferences};
use dose_runner::runtime::{connect_leaderboard, SessionRunner};
use dose_runner::session::{Collaborators, GameSession};
use dose_runner::types::{
    AxisInput, Direction, LeaderboardSnapshot, PursuerName, Scene, SessionEvent, SessionInput,
    SessionSnapshot, SessionState,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const HEADINGS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

/// Plays one headless session with random input and prints JSON lines.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 6_000)]
    ticks: u64,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    endpoint: Option<String>,
    #[arg(long)]
    offline: bool,
    /// Keep player prefs in memory instead of the configured file.
    #[arg(long)]
    ephemeral_prefs: bool,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Per-tick chance of touching a random pursuer.
    #[arg(long, default_value_t = 0.004)]
    contact_rate: f64,
    /// Pace ticks on a wall-clock interval instead of running flat out.
    #[arg(long)]
    realtime: bool,
    #[arg(long)]
    log_json: bool,
}

#[derive(Serialize)]
struct EventLine<'a> {
    tick: u64,
    #[serde(flatten)]
    event: &'a SessionEvent,
}

#[derive(Serialize)]
struct RunReport {
    #[serde(rename = "type")]
    kind: &'static str,
    seed: u64,
    ticks: u64,
    online: bool,
    snapshot: SessionSnapshot,
    leaderboard: Option<LeaderboardSnapshot>,
    #[serde(rename = "collaboratorCalls")]
    collaborator_calls: usize,
}

struct RandomPilot {
    rng: StdRng,
    heading: Direction,
    contact_rate: f64,
}

impl RandomPilot {
    fn new(seed: u64, contact_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            heading: Direction::Left,
            contact_rate: contact_rate.clamp(0.0, 1.0),
        }
    }

    fn next_input(&mut self, session: &GameSession) -> SessionInput {
        if self.rng.random_bool(0.05) {
            self.heading = HEADINGS[self.rng.random_range(0..HEADINGS.len())];
        }
        let mut pursuer_contacts = Vec::new();
        if session.state() == SessionState::Active && self.rng.random_bool(self.contact_rate) {
            pursuer_contacts.push(PursuerName::ALL[self.rng.random_range(0..PursuerName::ALL.len())]);
        }
        SessionInput {
            axes: AxisInput::from_direction(self.heading),
            toggle_mute: false,
            pursuer_contacts,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let mut config = RunnerConfig::load(cli.config.as_deref())?;
    if let Some(endpoint) = cli.endpoint.clone() {
        config.leaderboard.endpoint = endpoint;
        config.validate()?;
    }
    let seed = cli.seed.unwrap_or_else(rand::random);

    let prefs: SharedPreferences = if cli.ephemeral_prefs {
        MemoryPreferences::new().shared()
    } else {
        FilePreferences::new(config.prefs_path.clone()).shared()
    };
    let identity = match (cli.name.as_deref(), cli.email.as_deref()) {
        (Some(name), Some(email)) => match validate_player_info(name, email) {
            Ok(identity) => {
                prefs.store_identity(&identity.name, &identity.email);
                Some(identity)
            }
            Err(rejection) => {
                eprintln!("{rejection}");
                std::process::exit(2);
            }
        },
        _ => None,
    };

    let (collaborators, calls) = Collaborators::recording(config.gameplay.starting_lives);
    let session = GameSession::new(
        config.gameplay.clone(),
        collaborators,
        prefs.clone(),
        Maze::builtin()?,
    );
    let leaderboard = if cli.offline {
        None
    } else {
        Some(connect_leaderboard(&config.leaderboard, prefs.clone())?)
    };
    let mut runner = SessionRunner::new(session, leaderboard);
    runner.settle().await;
    tracing::info!(
        seed,
        online = runner.is_online(),
        endpoint = %config.leaderboard.endpoint,
        "simulation started"
    );

    let mut pilot = RandomPilot::new(seed, cli.contact_rate);
    let mut tick = 0u64;
    if cli.realtime {
        runner
            .run_realtime(
                cli.ticks,
                |session| pilot.next_input(session),
                |_, events| {
                    tick += 1;
                    print_events(tick, &events);
                },
            )
            .await;
    } else {
        let mut scores_shown = false;
        while tick < cli.ticks && !scores_shown {
            tick += 1;
            let input = pilot.next_input(runner.session());
            let events = runner.step(&input);
            print_events(tick, &events);
            scores_shown = events.iter().any(|event| {
                matches!(
                    event,
                    SessionEvent::SceneRequested {
                        scene: Scene::Scores
                    }
                )
            });

            if runner.session().is_awaiting_identity() {
                if let Some(identity) = identity.as_ref() {
                    if let Err(rejection) = runner
                        .session_mut()
                        .submit_entered_identity(&identity.name, &identity.email)
                    {
                        tracing::warn!(%rejection, "stored identity rejected");
                    }
                }
            }
        }
    }

    runner.settle().await;
    let report = RunReport {
        kind: "report",
        seed,
        ticks: tick,
        online: runner.is_online(),
        snapshot: runner.session().snapshot(),
        leaderboard: runner.session().leaderboard().cloned(),
        collaborator_calls: calls.calls().len(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn print_events(tick: u64, events: &[SessionEvent]) {
    for event in events {
        match serde_json::to_string(&EventLine { tick, event }) {
            Ok(line) => println!("{line}"),
            Err(error) => tracing::warn!(error = %error, "failed to serialize event"),
        }
    }
}
