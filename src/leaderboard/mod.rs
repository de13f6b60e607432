//! Client side of the remote high-score table.

pub mod client;
pub mod parse;
pub mod task;
pub mod transport;

pub use client::{LeaderboardClient, SkipReason, SubmitOutcome};
pub use parse::{derive_thresholds, escape_name, parse_scores_table, unescape_name};
pub use task::{spawn_leaderboard, LeaderboardHandle, LeaderboardRequest, LeaderboardUpdate};
pub use transport::{HttpTransport, LeaderboardTransport, ScoreForm};
