use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::client::{LeaderboardClient, SubmitOutcome};
use super::transport::LeaderboardTransport;
use crate::types::{LeaderboardSnapshot, PendingSubmission, ScoreThresholds};

const REQUEST_QUEUE: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardRequest {
    Refresh,
    Submit(PendingSubmission),
    BeginSession,
}

impl LeaderboardRequest {
    fn expects_update(&self) -> bool {
        !matches!(self, LeaderboardRequest::BeginSession)
    }
}

/// Results flowing back to the tick owner. Each `Refresh` or `Submit` yields exactly one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardUpdate {
    Refreshed {
        snapshot: LeaderboardSnapshot,
        thresholds: ScoreThresholds,
    },
    Submitted {
        outcome: SubmitOutcome,
        snapshot: LeaderboardSnapshot,
        thresholds: ScoreThresholds,
    },
}

impl LeaderboardUpdate {
    pub fn thresholds(&self) -> ScoreThresholds {
        match self {
            LeaderboardUpdate::Refreshed { thresholds, .. }
            | LeaderboardUpdate::Submitted { thresholds, .. } => *thresholds,
        }
    }

    pub fn snapshot(&self) -> &LeaderboardSnapshot {
        match self {
            LeaderboardUpdate::Refreshed { snapshot, .. }
            | LeaderboardUpdate::Submitted { snapshot, .. } => snapshot,
        }
    }
}

pub struct LeaderboardHandle {
    requests: mpsc::Sender<LeaderboardRequest>,
    updates: mpsc::Receiver<LeaderboardUpdate>,
    in_flight: usize,
}

pub fn spawn_leaderboard<T>(client: LeaderboardClient<T>) -> LeaderboardHandle
where
    T: LeaderboardTransport + 'static,
{
    let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE);
    let (update_tx, update_rx) = mpsc::channel(REQUEST_QUEUE);
    tokio::spawn(serve(client, request_rx, update_tx));
    LeaderboardHandle {
        requests: request_tx,
        updates: update_rx,
        in_flight: 0,
    }
}

impl LeaderboardHandle {
    /// Queues a request without blocking the tick. A request that does not fit is handed back.
    pub fn request(
        &mut self,
        request: LeaderboardRequest,
    ) -> Result<(), TrySendError<LeaderboardRequest>> {
        let expects_update = request.expects_update();
        self.requests.try_send(request)?;
        if expects_update {
            self.in_flight += 1;
        }
        Ok(())
    }

    pub fn try_recv(&mut self) -> Option<LeaderboardUpdate> {
        let update = self.updates.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(update)
    }

    pub async fn recv(&mut self) -> Option<LeaderboardUpdate> {
        let update = self.updates.recv().await?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(update)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }
}

async fn serve<T: LeaderboardTransport>(
    mut client: LeaderboardClient<T>,
    mut requests: mpsc::Receiver<LeaderboardRequest>,
    updates: mpsc::Sender<LeaderboardUpdate>,
) {
    while let Some(request) = requests.recv().await {
        let update = match request {
            LeaderboardRequest::BeginSession => {
                client.begin_session();
                client.reset_thresholds();
                continue;
            }
            LeaderboardRequest::Refresh => {
                let snapshot = client.read_scores().await.clone();
                LeaderboardUpdate::Refreshed {
                    snapshot,
                    thresholds: client.thresholds(),
                }
            }
            LeaderboardRequest::Submit(pending) => {
                let outcome = client
                    .submit_score(&pending.player_name, &pending.email, pending.score)
                    .await;
                LeaderboardUpdate::Submitted {
                    outcome,
                    snapshot: client.snapshot().clone(),
                    thresholds: client.thresholds(),
                }
            }
        };
        if updates.send(update).await.is_err() {
            tracing::debug!("leaderboard handle dropped; stopping task");
            break;
        }
    }
}
