use crate::types::{Position, PursuerName};

pub const TICK_RATE: u32 = 50;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const STARTING_LIVES: i32 = 3;
pub const NODE_SCORE: i32 = 10;
pub const MAX_KILL_STREAK: u32 = 4;

pub const SCARE_LENGTH_MS: u64 = 8_000;
pub const READY_DELAY_MS: u64 = 2_000;
pub const DEATH_DELAY_MS: u64 = 1_000;
pub const GAME_OVER_DISPLAY_MS: u64 = 2_000;

pub const AGENT_BASE_SPEED: f32 = 8.0;
pub const SPEED_PER_LEVEL: f32 = 0.5;
pub const FIRST_PLAYABLE_LEVEL: u32 = 0;

pub const STEP_PROBE_FACTOR: f32 = 1.45;
pub const STEP_PROBE_RESOLUTION: f32 = 0.25;
pub const ARRIVAL_EPSILON: f32 = 0.000_01;

pub const AGENT_SPAWN: Position = Position::new(15.0, 11.0);
pub const PURSUER_SPAWNS: [(PursuerName, Position); 4] = [
    (PursuerName::Blinky, Position::new(15.0, 20.0)),
    (PursuerName::Pinky, Position::new(14.5, 17.0)),
    (PursuerName::Inky, Position::new(16.5, 17.0)),
    (PursuerName::Clyde, Position::new(12.5, 17.0)),
];

pub const LEADERBOARD_CAPACITY: usize = 10;
pub const LEADERBOARD_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LEADERBOARD_URL: &str = "http://127.0.0.1:8080/topscores";
pub const SCORE_SAVED_BODY: &str = "Score saved successfully";
pub const SCORE_EXISTS_BODY: &str = "Score already exists";
pub const TABLE_HEADER: &str = "name\tscore";

/// Thresholds before any leaderboard has been read. No real score qualifies against it.
pub const UNKNOWN_THRESHOLD: i32 = 99_999;

pub const TRANSPORT_ERROR_SCORE: i32 = 1234;
pub const MALFORMED_RESPONSE_SCORE: i32 = -123;
pub const EMPTY_RESPONSE_SCORE: i32 = 0;
pub const TIMEOUT_RECORD_NAME: &str = "TIMEOUT ERROR";
pub const EMPTY_RECORD_NAME: &str = "NO DATA";

pub fn kill_bonus(streak: u32) -> i32 {
    let capped = streak.min(MAX_KILL_STREAK);
    2_i32.pow(capped) * 100
}

pub fn level_speed_bonus(level: u32, speed_per_level: f32) -> f32 {
    level as f32 * speed_per_level
}
