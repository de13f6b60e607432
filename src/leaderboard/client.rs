use std::time::Duration;

use serde::Serialize;

use super::parse::{derive_thresholds, parse_scores_table};
use super::transport::{LeaderboardTransport, ScoreForm};
use crate::constants::{
    EMPTY_RECORD_NAME, EMPTY_RESPONSE_SCORE, SCORE_EXISTS_BODY, SCORE_SAVED_BODY,
    TIMEOUT_RECORD_NAME, TRANSPORT_ERROR_SCORE,
};
use crate::error::LeaderboardError;
use crate::prefs::SharedPreferences;
use crate::types::{LeaderboardSnapshot, ScoreThresholds, SnapshotStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AlreadySubmitted,
    MissingIdentity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Saved,
    Duplicate,
    Rejected { body: String },
    Failed { reason: String },
    Skipped { reason: SkipReason },
}

impl SubmitOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, SubmitOutcome::Skipped { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SubmissionGate {
    Open,
    Claimed,
}

/// Fetch/submit protocol against the scores endpoint.
///
/// Every call is bounded by `timeout` and every failure degrades to a synthetic snapshot, so
/// callers always have at least one row to show.
pub struct LeaderboardClient<T> {
    transport: T,
    prefs: SharedPreferences,
    timeout: Duration,
    gate: SubmissionGate,
    snapshot: LeaderboardSnapshot,
    thresholds: ScoreThresholds,
}

impl<T: LeaderboardTransport> LeaderboardClient<T> {
    pub fn new(transport: T, prefs: SharedPreferences, timeout: Duration) -> Self {
        Self {
            transport,
            prefs,
            timeout,
            gate: SubmissionGate::Open,
            snapshot: LeaderboardSnapshot::synthetic(
                SnapshotStatus::Empty,
                EMPTY_RECORD_NAME,
                EMPTY_RESPONSE_SCORE,
            ),
            thresholds: ScoreThresholds::unknown(),
        }
    }

    pub fn begin_session(&mut self) {
        self.gate = SubmissionGate::Open;
    }

    pub fn has_submitted(&self) -> bool {
        self.gate == SubmissionGate::Claimed
    }

    pub fn snapshot(&self) -> &LeaderboardSnapshot {
        &self.snapshot
    }

    pub fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    pub fn reset_thresholds(&mut self) {
        self.thresholds = ScoreThresholds::unknown();
    }

    pub async fn read_scores(&mut self) -> &LeaderboardSnapshot {
        let snapshot = match tokio::time::timeout(self.timeout, self.transport.fetch_table()).await
        {
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "leaderboard fetch timed out");
                timeout_snapshot()
            }
            Ok(Err(LeaderboardError::Timeout(elapsed))) => {
                tracing::warn!(timeout = ?elapsed, "leaderboard fetch timed out");
                timeout_snapshot()
            }
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "leaderboard fetch failed");
                LeaderboardSnapshot::synthetic(
                    SnapshotStatus::TransportError,
                    error.to_string(),
                    TRANSPORT_ERROR_SCORE,
                )
            }
            Ok(Ok(body)) => parse_scores_table(&body),
        };

        self.thresholds = derive_thresholds(&snapshot, self.thresholds);
        tracing::debug!(
            status = ?snapshot.status,
            rows = snapshot.records.len(),
            high_score = self.thresholds.high_score,
            lowest_of_top = self.thresholds.lowest_of_top,
            "leaderboard refreshed"
        );
        self.snapshot = snapshot;
        &self.snapshot
    }

    /// Submits at most once per session, then refetches unless the call was skipped.
    pub async fn submit_score(&mut self, name: &str, email: &str, score: i32) -> SubmitOutcome {
        if self.gate == SubmissionGate::Claimed {
            tracing::info!("score already submitted this session; skipping");
            return SubmitOutcome::Skipped {
                reason: SkipReason::AlreadySubmitted,
            };
        }
        if name.trim().is_empty() || email.trim().is_empty() {
            tracing::info!("no player name or email on record; skipping submission");
            return SubmitOutcome::Skipped {
                reason: SkipReason::MissingIdentity,
            };
        }

        // Claimed before the first await so a failed attempt is never retried.
        self.gate = SubmissionGate::Claimed;
        tracing::info!(player = name, score, "submitting score");

        let form = ScoreForm::new(name, email, score);
        let outcome = match tokio::time::timeout(self.timeout, self.transport.post_score(&form))
            .await
        {
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "score submission timed out");
                SubmitOutcome::Failed {
                    reason: LeaderboardError::Timeout(self.timeout).to_string(),
                }
            }
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "score submission failed");
                SubmitOutcome::Failed {
                    reason: error.to_string(),
                }
            }
            Ok(Ok(body)) => self.classify_response(body.trim()),
        };

        self.read_scores().await;
        outcome
    }

    fn classify_response(&self, body: &str) -> SubmitOutcome {
        if body == SCORE_SAVED_BODY {
            tracing::info!("score saved");
            self.prefs.clear_submission();
            SubmitOutcome::Saved
        } else if body == SCORE_EXISTS_BODY {
            tracing::info!("server already holds this score");
            SubmitOutcome::Duplicate
        } else {
            tracing::warn!(body, "server rejected score");
            SubmitOutcome::Rejected {
                body: body.to_string(),
            }
        }
    }
}

fn timeout_snapshot() -> LeaderboardSnapshot {
    LeaderboardSnapshot::synthetic(
        SnapshotStatus::TransportError,
        TIMEOUT_RECORD_NAME,
        TRANSPORT_ERROR_SCORE,
    )
}
