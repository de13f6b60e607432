//! The game session state machine.
//!
//! A session owns the lives/score counters, the current maze, the agent's motion and the
//! pursuers' shared behavior state. Time only moves through [`GameSession::tick`]; delayed
//! flows (ready screen, death animation, game-over display) are deadlines checked there.
//! Leaderboard work is queued as [`LeaderboardRequest`]s for the runner to forward.

pub mod collaborators;

use crate::config::GameplayConfig;
use crate::constants::{level_speed_bonus, AGENT_SPAWN, NODE_SCORE, PURSUER_SPAWNS};
use crate::error::{InputRejection, MissingCollaborator};
use crate::leaderboard::{LeaderboardRequest, LeaderboardUpdate, SubmitOutcome};
use crate::maze::{Collectible, Maze};
use crate::motion::AgentMotionController;
use crate::player_info::validate_player_info;
use crate::prefs::SharedPreferences;
use crate::pursuers::{PursuerBehaviorState, ScareChange};
use crate::types::{
    GameOverBranch, LeaderboardSnapshot, PendingSubmission, PursuerMode, PursuerName,
    PursuerView, Scene, ScoreThresholds, SessionEvent, SessionInput, SessionSnapshot,
    SessionState, SoundCue,
};

pub use collaborators::{
    CallLog, CollaboratorCall, Collaborators, GameUi, LifeIndicators, PursuerBodies,
    SceneDirector, SoundBoard, StaticPursuers,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScorePersistence {
    Unsaved,
    Saved { score: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deadline {
    Ready { at_ms: u64 },
    Death { at_ms: u64 },
    ShowScores { at_ms: u64 },
}

impl Deadline {
    fn at_ms(self) -> u64 {
        match self {
            Deadline::Ready { at_ms }
            | Deadline::Death { at_ms }
            | Deadline::ShowScores { at_ms } => at_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactOutcome {
    Ignored,
    Eliminated { streak: u32, bonus: i32 },
    Defeated(LifeLoss),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifeLoss {
    Ignored,
    Lost { remaining: i32 },
    Final { score: i32 },
}

pub struct GameSession {
    config: GameplayConfig,
    collaborators: Collaborators,
    prefs: SharedPreferences,
    template: Maze,
    maze: Maze,
    motion: AgentMotionController,
    pursuers: PursuerBehaviorState,
    state: SessionState,
    lives: i32,
    score: i32,
    level: u32,
    now_ms: u64,
    muted: bool,
    persistence: ScorePersistence,
    deadline: Option<Deadline>,
    awaiting_identity: bool,
    thresholds: ScoreThresholds,
    leaderboard: Option<LeaderboardSnapshot>,
    events: Vec<SessionEvent>,
    outbox: Vec<LeaderboardRequest>,
}

impl GameSession {
    pub fn new(
        config: GameplayConfig,
        collaborators: Collaborators,
        prefs: SharedPreferences,
        maze: Maze,
    ) -> Self {
        let first_level = config.first_playable_level;
        let mut session = Self {
            motion: AgentMotionController::new(AGENT_SPAWN, config.agent_speed),
            pursuers: PursuerBehaviorState::new(config.scare_length_ms),
            lives: config.starting_lives,
            config,
            collaborators,
            prefs,
            template: maze.clone(),
            maze,
            state: SessionState::Init,
            score: 0,
            level: first_level,
            now_ms: 0,
            muted: false,
            persistence: ScorePersistence::Unsaved,
            deadline: None,
            awaiting_identity: false,
            thresholds: ScoreThresholds::unknown(),
            leaderboard: None,
            events: Vec::new(),
            outbox: vec![LeaderboardRequest::BeginSession],
        };
        session.enter_level(first_level);
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_score_saved(&self) -> bool {
        matches!(self.persistence, ScorePersistence::Saved { .. })
    }

    pub fn persisted_score(&self) -> Option<i32> {
        match self.persistence {
            ScorePersistence::Saved { score } => Some(score),
            ScorePersistence::Unsaved => None,
        }
    }

    pub fn is_awaiting_identity(&self) -> bool {
        self.awaiting_identity
    }

    pub fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    pub fn leaderboard(&self) -> Option<&LeaderboardSnapshot> {
        self.leaderboard.as_ref()
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn motion(&self) -> &AgentMotionController {
        &self.motion
    }

    pub fn pursuers(&self) -> &PursuerBehaviorState {
        &self.pursuers
    }

    /// Skips the rest of the ready delay. Returns false outside `Init`.
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Init {
            return false;
        }
        self.deadline = None;
        self.state = SessionState::Active;
        tracing::debug!(level = self.level, "session active");
        true
    }

    pub fn tick(&mut self, dt_ms: u64, input: &SessionInput) {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        if input.toggle_mute {
            self.toggle_mute();
        }
        self.fire_due_deadline();

        if self.state != SessionState::Active {
            return;
        }

        if self.pursuers.update(self.now_ms) == ScareChange::Calmed {
            self.events.push(SessionEvent::ScareEnded);
        }

        let step = self
            .motion
            .tick(&self.maze, input.axes, dt_ms as f32 / 1000.0);
        if let Some((cell, kind)) = self.maze.take_collectible(step.position) {
            self.consume(cell, kind);
        }

        for name in &input.pursuer_contacts {
            if self.state != SessionState::Active {
                break;
            }
            self.pursuer_contact(*name);
        }
    }

    /// Agent touched `name`. A frightened pursuer is eaten; a normal one costs a life.
    pub fn pursuer_contact(&mut self, name: PursuerName) -> ContactOutcome {
        if self.state != SessionState::Active {
            return ContactOutcome::Ignored;
        }
        if !self.pursuers.is_present(name) {
            tracing::warn!(pursuer = ?name, "contact with a pursuer that is not in the level");
            return ContactOutcome::Ignored;
        }

        match self.pursuers.mode(name) {
            PursuerMode::Frightened => {
                let (streak, bonus) = self.pursuers.record_elimination();
                self.score += bonus;
                self.pursuers.calm_one(name);
                if let Some(spawn) = spawn_of(name) {
                    degrade(self.collaborators.place_pursuer(name, spawn), "return pursuer");
                }
                tracing::debug!(pursuer = ?name, streak, bonus, "pursuer eliminated");
                self.events.push(SessionEvent::PursuerEliminated {
                    pursuer: name,
                    streak,
                    bonus,
                });
                ContactOutcome::Eliminated { streak, bonus }
            }
            PursuerMode::Normal => ContactOutcome::Defeated(self.lose_life()),
        }
    }

    /// Strict order: decrement, remove one life icon, then persist the score if that was the
    /// last life. Only an `Active` session can lose a life, and the score is persisted at most
    /// once however often this is called.
    pub fn lose_life(&mut self) -> LifeLoss {
        if self.state != SessionState::Active {
            tracing::debug!(state = ?self.state, "ignoring life loss outside active play");
            return LifeLoss::Ignored;
        }

        self.lives -= 1;
        self.events.push(SessionEvent::LifeLost {
            remaining: self.lives,
        });

        match self.collaborators.remove_life_indicator() {
            Ok(true) => {}
            Ok(false) => tracing::warn!("no life indicator left to remove"),
            Err(missing) => tracing::warn!(%missing, "cannot remove life indicator"),
        }

        let outcome = if self.lives <= 0 {
            self.persist_final_score();
            LifeLoss::Final {
                score: self.persisted_score().unwrap_or(self.score),
            }
        } else {
            LifeLoss::Lost {
                remaining: self.lives,
            }
        };

        self.state = SessionState::AgentDefeated;
        self.play_cue(SoundCue::Death);
        self.deadline = Some(Deadline::Death {
            at_ms: self.now_ms + self.config.death_delay_ms,
        });
        tracing::info!(lives = self.lives, score = self.score, "agent defeated");
        outcome
    }

    pub fn frighten(&mut self) {
        if let ScareChange::Frightened { deadline_ms } = self.pursuers.frighten(self.now_ms) {
            self.events.push(SessionEvent::ScareStarted { deadline_ms });
        }
    }

    pub fn calm(&mut self) {
        self.pursuers.calm();
        self.events.push(SessionEvent::ScareEnded);
    }

    pub fn toggle_scare(&mut self) {
        match self.pursuers.toggle_scare(self.now_ms) {
            ScareChange::Frightened { deadline_ms } => {
                self.events.push(SessionEvent::ScareStarted { deadline_ms })
            }
            ScareChange::Calmed => self.events.push(SessionEvent::ScareEnded),
            ScareChange::Unchanged => {}
        }
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        tracing::info!(muted = self.muted, "sound toggled");
    }

    pub fn play_cue(&mut self, cue: SoundCue) {
        if self.muted {
            tracing::debug!(?cue, "muted; cue skipped");
            return;
        }
        tracing::debug!(?cue, "playing cue");
        degrade(self.collaborators.play(cue), "play cue");
    }

    /// Name-entry result for a qualifying score. Queues the submission on success.
    pub fn submit_entered_identity(&mut self, name: &str, email: &str) -> Result<(), InputRejection> {
        let identity = match validate_player_info(name, email) {
            Ok(identity) => identity,
            Err(rejection) => {
                tracing::debug!(%rejection, "player info rejected");
                return Err(rejection);
            }
        };
        self.prefs.store_identity(&identity.name, &identity.email);

        if !self.awaiting_identity {
            tracing::debug!("identity stored; no qualifying score waiting");
            return Ok(());
        }
        self.awaiting_identity = false;
        let score = self.persisted_score().unwrap_or(self.score);
        self.outbox.push(LeaderboardRequest::Submit(PendingSubmission {
            player_name: identity.name,
            email: identity.email,
            score,
        }));
        self.deadline = Some(Deadline::ShowScores {
            at_ms: self.now_ms + self.config.game_over_display_ms,
        });
        Ok(())
    }

    pub fn apply_leaderboard_update(&mut self, update: LeaderboardUpdate) {
        if let LeaderboardUpdate::Submitted { outcome, .. } = &update {
            match outcome {
                SubmitOutcome::Saved | SubmitOutcome::Duplicate => {
                    tracing::info!(?outcome, "score submission finished")
                }
                SubmitOutcome::Skipped { reason } => {
                    tracing::debug!(?reason, "score submission skipped")
                }
                SubmitOutcome::Rejected { .. } | SubmitOutcome::Failed { .. } => {
                    tracing::warn!(?outcome, "score submission did not go through")
                }
            }
        }
        self.thresholds = update.thresholds();
        self.leaderboard = Some(update.snapshot().clone());
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_leaderboard_requests(&mut self) -> Vec<LeaderboardRequest> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let pursuers = self
            .pursuers
            .modes()
            .map(|(name, mode, present)| PursuerView {
                name,
                mode,
                present,
                position: self
                    .collaborators
                    .locate_pursuer(name)
                    .ok()
                    .flatten()
                    .or_else(|| spawn_of(name))
                    .unwrap_or(AGENT_SPAWN),
            })
            .collect();

        SessionSnapshot {
            now_ms: self.now_ms,
            state: self.state,
            level: self.level,
            lives: self.lives,
            score: self.score,
            remaining_nodes: self.maze.remaining_nodes(),
            agent_position: self.motion.position(),
            agent_direction: self.motion.committed_direction(),
            kill_streak: self.pursuers.kill_streak(),
            pursuers,
            muted: self.muted,
            thresholds: self.thresholds,
        }
    }

    /// Ends the play-through and starts over on a fresh board at the first playable level.
    /// Mute is process-wide and survives.
    pub fn teardown(&mut self) {
        self.score = 0;
        self.lives = self.config.starting_lives;
        self.persistence = ScorePersistence::Unsaved;
        self.deadline = None;
        self.awaiting_identity = false;
        self.maze = self.template.clone();
        self.motion = AgentMotionController::new(AGENT_SPAWN, self.config.agent_speed);
        self.outbox.clear();
        self.outbox.push(LeaderboardRequest::BeginSession);
        tracing::debug!("session torn down");
        self.enter_level(self.config.first_playable_level);
    }

    fn enter_level(&mut self, level: u32) {
        self.level = level;
        self.state = SessionState::Init;
        if level == 0 {
            self.lives = self.config.starting_lives;
        }

        self.motion.reset_to(AGENT_SPAWN);
        self.motion
            .add_speed(level_speed_bonus(level, self.config.speed_per_level));
        self.assign_pursuers();
        self.pursuers.reset();

        self.thresholds = ScoreThresholds::unknown();
        self.outbox.push(LeaderboardRequest::Refresh);

        if level == self.config.first_playable_level {
            self.play_cue(SoundCue::Intro);
        }
        degrade(self.collaborators.show_ready_screen(), "show ready screen");
        self.deadline = Some(Deadline::Ready {
            at_ms: self.now_ms + self.config.ready_delay_ms,
        });

        tracing::info!(
            level,
            lives = self.lives,
            speed = self.motion.speed(),
            nodes = self.maze.remaining_nodes(),
            "level loaded"
        );
        self.events.push(SessionEvent::LevelLoaded { level });
    }

    fn assign_pursuers(&mut self) {
        for (name, spawn) in PURSUER_SPAWNS {
            let present = match self.collaborators.locate_pursuer(name) {
                Ok(Some(_)) => {
                    degrade(self.collaborators.place_pursuer(name, spawn), "place pursuer");
                    true
                }
                Ok(None) => {
                    tracing::warn!(pursuer = ?name, "pursuer missing from level");
                    false
                }
                Err(missing) => {
                    tracing::warn!(%missing, pursuer = ?name, "cannot resolve pursuer");
                    false
                }
            };
            self.pursuers.set_present(name, present);
        }
    }

    fn consume(&mut self, cell: (i32, i32), kind: Collectible) {
        self.score += NODE_SCORE;
        self.play_cue(SoundCue::Chomp);
        if kind == Collectible::Energizer {
            self.frighten();
        }
        let remaining = self.maze.remaining_nodes();
        self.events.push(SessionEvent::NodeConsumed {
            x: cell.0,
            y: cell.1,
            remaining,
        });
        if remaining == 0 {
            self.level_cleared();
        }
    }

    fn level_cleared(&mut self) {
        let cleared = self.level;
        tracing::info!(level = cleared, score = self.score, "level cleared");
        self.events.push(SessionEvent::LevelCleared { level: cleared });
        self.request_scene(Scene::Game);
        self.maze = self.template.clone();
        self.enter_level(cleared + 1);
    }

    fn fire_due_deadline(&mut self) {
        let Some(deadline) = self.deadline else {
            return;
        };
        if self.now_ms < deadline.at_ms() {
            return;
        }
        self.deadline = None;
        match deadline {
            Deadline::Ready { .. } => {
                self.start();
            }
            Deadline::Death { .. } => self.finish_death(),
            Deadline::ShowScores { .. } => {
                self.request_scene(Scene::Scores);
                self.outbox.push(LeaderboardRequest::Refresh);
            }
        }
    }

    fn finish_death(&mut self) {
        if self.lives > 0 {
            self.motion.reset_to(AGENT_SPAWN);
            for (name, spawn) in PURSUER_SPAWNS {
                if self.pursuers.is_present(name) {
                    degrade(self.collaborators.place_pursuer(name, spawn), "reset pursuer");
                }
            }
            self.pursuers.reset();
            degrade(self.collaborators.show_ready_screen(), "show ready screen");
            self.state = SessionState::Active;
            tracing::debug!(lives = self.lives, "scene reset after death");
            return;
        }
        self.game_over();
    }

    fn game_over(&mut self) {
        self.state = SessionState::Summary;
        let score = self.persisted_score().unwrap_or(self.score);
        let branch = if self.thresholds.qualifies(score) {
            GameOverBranch::Qualifying
        } else {
            GameOverBranch::Standard
        };
        tracing::info!(
            score,
            ?branch,
            lowest_of_top = self.thresholds.lowest_of_top,
            "game over"
        );

        match branch {
            GameOverBranch::Qualifying => {
                degrade(
                    self.collaborators.show_qualifying_score_screen(),
                    "show qualifying score screen",
                );
                self.awaiting_identity = true;
            }
            GameOverBranch::Standard => {
                degrade(
                    self.collaborators.show_game_over_screen(),
                    "show game over screen",
                );
                match self.prefs.player_record().pending_submission() {
                    Some(pending) => self.outbox.push(LeaderboardRequest::Submit(pending)),
                    None => tracing::info!("no stored player info; score not submitted"),
                }
                self.deadline = Some(Deadline::ShowScores {
                    at_ms: self.now_ms + self.config.game_over_display_ms,
                });
            }
        }
        self.events.push(SessionEvent::GameOver { score, branch });
    }

    fn persist_final_score(&mut self) {
        if let ScorePersistence::Saved { score } = self.persistence {
            tracing::debug!(score, "final score already persisted");
            return;
        }
        self.prefs.store_score(self.score);
        self.persistence = ScorePersistence::Saved { score: self.score };
        tracing::info!(score = self.score, "final score persisted");
        self.events.push(SessionEvent::ScorePersisted { score: self.score });
    }

    fn request_scene(&mut self, scene: Scene) {
        degrade(self.collaborators.load_scene(scene), "load scene");
        self.events.push(SessionEvent::SceneRequested { scene });
    }
}

fn spawn_of(name: PursuerName) -> Option<crate::types::Position> {
    PURSUER_SPAWNS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, spawn)| *spawn)
}

fn degrade(result: Result<(), MissingCollaborator>, action: &'static str) {
    if let Err(missing) = result {
        tracing::warn!(%missing, action, "skipping collaborator call");
    }
}
