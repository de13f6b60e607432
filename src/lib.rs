pub mod config;
pub mod constants;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod maze;
pub mod motion;
pub mod movement;
pub mod player_info;
pub mod prefs;
pub mod pursuers;
pub mod runtime;
pub mod score_server;
pub mod score_store;
pub mod session;
pub mod types;
