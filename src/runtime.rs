use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;

use crate::config::LeaderboardConfig;
use crate::constants::TICK_MS;
use crate::error::LeaderboardError;
use crate::leaderboard::{
    spawn_leaderboard, HttpTransport, LeaderboardClient, LeaderboardHandle, LeaderboardRequest,
};
use crate::prefs::SharedPreferences;
use crate::session::GameSession;
use crate::types::{SessionEvent, SessionInput};

pub fn connect_leaderboard(
    config: &LeaderboardConfig,
    prefs: SharedPreferences,
) -> Result<LeaderboardHandle, LeaderboardError> {
    let transport = HttpTransport::new(config.endpoint.clone())?;
    let client = LeaderboardClient::new(transport, prefs, config.timeout());
    Ok(spawn_leaderboard(client))
}

/// Sole owner of a `GameSession`. Ticks it and shuttles leaderboard traffic in and out.
///
/// Without a leaderboard handle the runner is offline: requests are dropped and thresholds
/// stay at their unknown defaults. Requests that find the queue full wait in `backlog`, in
/// order, until the next tick.
pub struct SessionRunner {
    session: GameSession,
    leaderboard: Option<LeaderboardHandle>,
    backlog: VecDeque<LeaderboardRequest>,
    tick_ms: u64,
}

impl SessionRunner {
    pub fn new(session: GameSession, leaderboard: Option<LeaderboardHandle>) -> Self {
        let mut runner = Self {
            session,
            leaderboard,
            backlog: VecDeque::new(),
            tick_ms: TICK_MS,
        };
        runner.forward_requests();
        runner
    }

    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms.max(1);
        self
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GameSession {
        &mut self.session
    }

    pub fn is_online(&self) -> bool {
        self.leaderboard.is_some()
    }

    pub fn step(&mut self, input: &SessionInput) -> Vec<SessionEvent> {
        self.apply_updates();
        self.session.tick(self.tick_ms, input);
        self.forward_requests();
        self.session.take_events()
    }

    pub async fn run_realtime<I, E>(&mut self, ticks: u64, mut next_input: I, mut on_events: E)
    where
        I: FnMut(&GameSession) -> SessionInput,
        E: FnMut(&GameSession, Vec<SessionEvent>),
    {
        let mut interval = tokio::time::interval(Duration::from_millis(self.tick_ms));
        for _ in 0..ticks {
            interval.tick().await;
            let input = next_input(&self.session);
            let events = self.step(&input);
            on_events(&self.session, events);
        }
    }

    /// Waits until every forwarded leaderboard request has reported back.
    pub async fn settle(&mut self) {
        loop {
            self.forward_requests();
            let Some(handle) = self.leaderboard.as_mut() else {
                break;
            };
            if handle.is_idle() {
                if self.backlog.is_empty() {
                    break;
                }
                tokio::task::yield_now().await;
                continue;
            }
            match handle.recv().await {
                Some(update) => self.session.apply_leaderboard_update(update),
                None => {
                    tracing::warn!("leaderboard task ended with work outstanding");
                    break;
                }
            }
        }
    }

    fn forward_requests(&mut self) {
        let drained = self.session.drain_leaderboard_requests();
        let Some(handle) = self.leaderboard.as_mut() else {
            for request in drained {
                tracing::debug!(?request, "offline; leaderboard request dropped");
            }
            return;
        };
        self.backlog.extend(drained);
        while let Some(request) = self.backlog.pop_front() {
            match handle.request(request) {
                Ok(()) => {}
                Err(TrySendError::Full(request)) => {
                    self.backlog.push_front(request);
                    tracing::debug!(waiting = self.backlog.len(), "leaderboard queue full");
                    break;
                }
                Err(TrySendError::Closed(request)) => {
                    tracing::warn!(
                        ?request,
                        dropped = self.backlog.len() + 1,
                        "leaderboard task stopped; dropping requests"
                    );
                    self.backlog.clear();
                    break;
                }
            }
        }
    }

    fn apply_updates(&mut self) {
        let Some(handle) = self.leaderboard.as_mut() else {
            return;
        };
        while let Some(update) = handle.try_recv() {
            self.session.apply_leaderboard_update(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::config::GameplayConfig;
    use crate::constants::SCORE_SAVED_BODY;
    use crate::leaderboard::{LeaderboardTransport, ScoreForm};
    use crate::maze::Maze;
    use crate::prefs::{MemoryPreferences, PlayerRecord};
    use crate::session::Collaborators;
    use crate::types::{PendingSubmission, ScoreThresholds, SessionState};

    #[derive(Clone, Default)]
    struct FixedTransport {
        posts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LeaderboardTransport for FixedTransport {
        async fn fetch_table(&self) -> Result<String, LeaderboardError> {
            Ok("name\tscore\nAlice\t500\nBob\t300\n".to_string())
        }

        async fn post_score(&self, _form: &ScoreForm) -> Result<String, LeaderboardError> {
            self.posts.fetch_add(1, Ordering::SeqCst);
            Ok(SCORE_SAVED_BODY.to_string())
        }
    }

    fn session(prefs: SharedPreferences) -> GameSession {
        let (collaborators, _) = Collaborators::recording(3);
        let maze = Maze::builtin().expect("builtin maze");
        GameSession::new(GameplayConfig::default(), collaborators, prefs, maze)
    }

    fn online_runner(prefs: SharedPreferences) -> (SessionRunner, FixedTransport) {
        let transport = FixedTransport::default();
        let client =
            LeaderboardClient::new(transport.clone(), prefs.clone(), Duration::from_secs(10));
        let runner = SessionRunner::new(session(prefs), Some(spawn_leaderboard(client)));
        (runner, transport)
    }

    fn lose_every_life(runner: &mut SessionRunner) {
        for _ in 0..10_000 {
            match runner.session().state() {
                SessionState::Summary => return,
                SessionState::Active => {
                    runner.session_mut().lose_life();
                }
                _ => {}
            }
            runner.step(&SessionInput::default());
        }
        panic!("session never reached summary");
    }

    #[tokio::test]
    async fn settle_applies_fetched_thresholds() {
        let (mut runner, _) = online_runner(MemoryPreferences::new().shared());
        runner.settle().await;
        let thresholds = runner.session().thresholds();
        assert_eq!(thresholds.high_score, 500);
        assert_eq!(thresholds.lowest_of_top, 300);
        assert_eq!(
            runner.session().leaderboard().map(|snapshot| snapshot.records.len()),
            Some(2)
        );
    }

    #[tokio::test]
    async fn zero_score_is_never_posted() {
        let prefs = MemoryPreferences::new().shared();
        let (mut runner, transport) = online_runner(prefs.clone());
        runner.settle().await;
        runner.session_mut().start();

        lose_every_life(&mut runner);
        // A zero score does not reach the lowest entry (300).
        assert!(!runner.session().is_awaiting_identity());
        runner.settle().await;
        assert_eq!(transport.posts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn standard_flow_posts_stored_identity() {
        let prefs = MemoryPreferences::with_record(PlayerRecord {
            player_name: Some("Carol".to_string()),
            player_email: Some("carol@example.com".to_string()),
            player_score: None,
        })
        .shared();
        let (mut runner, transport) = online_runner(prefs.clone());
        runner.settle().await;
        runner.session_mut().start();
        runner.session_mut().frighten();
        runner
            .session_mut()
            .pursuer_contact(crate::types::PursuerName::Blinky);

        lose_every_life(&mut runner);
        runner.settle().await;
        assert_eq!(transport.posts.load(Ordering::SeqCst), 1);
        assert_eq!(prefs.player_record(), PlayerRecord::default());
    }

    #[tokio::test]
    async fn full_queue_keeps_requests_for_the_next_tick() {
        let (mut runner, transport) = online_runner(MemoryPreferences::new().shared());
        runner.settle().await;

        runner
            .backlog
            .extend(std::iter::repeat(LeaderboardRequest::Refresh).take(40));
        runner
            .backlog
            .push_back(LeaderboardRequest::Submit(PendingSubmission {
                player_name: "Dana".to_string(),
                email: "dana@example.com".to_string(),
                score: 120,
            }));
        runner.forward_requests();
        assert!(matches!(
            runner.backlog.back(),
            Some(LeaderboardRequest::Submit(_))
        ));
        assert_eq!(transport.posts.load(Ordering::SeqCst), 0);

        runner.settle().await;
        assert!(runner.backlog.is_empty());
        assert_eq!(transport.posts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn offline_runner_keeps_unknown_thresholds() {
        let mut runner = SessionRunner::new(session(MemoryPreferences::new().shared()), None);
        assert!(!runner.is_online());
        runner.step(&SessionInput::default());
        runner.settle().await;
        assert_eq!(runner.session().thresholds(), ScoreThresholds::unknown());
    }

    #[tokio::test(start_paused = true)]
    async fn realtime_loop_advances_session_clock() {
        let mut runner = SessionRunner::new(session(MemoryPreferences::new().shared()), None)
            .with_tick_ms(20);
        let mut loaded = 0;
        runner
            .run_realtime(
                150,
                |_| SessionInput::default(),
                |_, events| {
                    loaded += events
                        .iter()
                        .filter(|event| matches!(event, SessionEvent::LevelLoaded { .. }))
                        .count()
                },
            )
            .await;
        assert_eq!(loaded, 1);
        assert_eq!(runner.session().now_ms(), 3_000);
        assert_eq!(runner.session().state(), SessionState::Active);
    }
}
