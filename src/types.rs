use std::ops::{Add, Sub};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Unit vector on the grid. Rows grow downward, so `Up` is negative y.
    pub fn unit(self) -> Position {
        match self {
            Direction::Up => Position::new(0.0, -1.0),
            Direction::Down => Position::new(0.0, 1.0),
            Direction::Left => Position::new(-1.0, 0.0),
            Direction::Right => Position::new(1.0, 0.0),
            Direction::None => Position::new(0.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn distance(self, other: Position) -> f32 {
        let d = other - self;
        (d.x * d.x + d.y * d.y).sqrt()
    }

    pub fn move_towards(self, target: Position, max_delta: f32) -> Self {
        let dist = self.distance(target);
        if dist <= max_delta || dist == 0.0 {
            return target;
        }
        let d = target - self;
        self + d.scale(max_delta / dist)
    }

    /// Grid cell containing this position; half-way points round away from zero.
    pub fn cell(self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Raw axis values from the input device. Positive vertical means up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisInput {
    pub horizontal: f32,
    pub vertical: f32,
}

impl AxisInput {
    pub fn from_direction(dir: Direction) -> Self {
        match dir {
            Direction::Up => Self { horizontal: 0.0, vertical: 1.0 },
            Direction::Down => Self { horizontal: 0.0, vertical: -1.0 },
            Direction::Left => Self { horizontal: -1.0, vertical: 0.0 },
            Direction::Right => Self { horizontal: 1.0, vertical: 0.0 },
            Direction::None => Self::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionInput {
    pub axes: AxisInput,
    pub toggle_mute: bool,
    pub pursuer_contacts: Vec<PursuerName>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Init,
    Active,
    AgentDefeated,
    Summary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerName {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl PursuerName {
    pub const ALL: [PursuerName; 4] = [
        PursuerName::Blinky,
        PursuerName::Pinky,
        PursuerName::Inky,
        PursuerName::Clyde,
    ];

    pub fn index(self) -> usize {
        match self {
            PursuerName::Blinky => 0,
            PursuerName::Pinky => 1,
            PursuerName::Inky => 2,
            PursuerName::Clyde => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PursuerMode {
    Normal,
    Frightened,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scene {
    Game,
    Scores,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundCue {
    Intro,
    Chomp,
    Death,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: i32,
}

impl ScoreRecord {
    pub fn new(name: impl Into<String>, score: i32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    Live,
    TransportError,
    Malformed,
    Empty,
}

/// Most recently fetched leaderboard. Non-live snapshots hold exactly one synthetic row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LeaderboardSnapshot {
    pub status: SnapshotStatus,
    pub records: Vec<ScoreRecord>,
}

impl LeaderboardSnapshot {
    pub fn live(records: Vec<ScoreRecord>) -> Self {
        Self {
            status: SnapshotStatus::Live,
            records,
        }
    }

    pub fn synthetic(status: SnapshotStatus, name: impl Into<String>, score: i32) -> Self {
        Self {
            status,
            records: vec![ScoreRecord::new(name, score)],
        }
    }

    pub fn is_live(&self) -> bool {
        self.status == SnapshotStatus::Live
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreThresholds {
    #[serde(rename = "highScore")]
    pub high_score: i32,
    #[serde(rename = "lowestOfTop")]
    pub lowest_of_top: i32,
}

impl ScoreThresholds {
    pub fn unknown() -> Self {
        Self {
            high_score: crate::constants::UNKNOWN_THRESHOLD,
            lowest_of_top: crate::constants::UNKNOWN_THRESHOLD,
        }
    }

    /// Only a positive score can claim a leaderboard slot.
    pub fn qualifies(&self, score: i32) -> bool {
        score > 0 && score >= self.lowest_of_top
    }
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self::unknown()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingSubmission {
    #[serde(rename = "playerName")]
    pub player_name: String,
    pub email: String,
    pub score: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverBranch {
    Qualifying,
    Standard,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LevelLoaded {
        level: u32,
    },
    NodeConsumed {
        x: i32,
        y: i32,
        remaining: usize,
    },
    ScareStarted {
        #[serde(rename = "deadlineMs")]
        deadline_ms: u64,
    },
    ScareEnded,
    PursuerEliminated {
        pursuer: PursuerName,
        streak: u32,
        bonus: i32,
    },
    LifeLost {
        remaining: i32,
    },
    ScorePersisted {
        score: i32,
    },
    LevelCleared {
        level: u32,
    },
    GameOver {
        score: i32,
        branch: GameOverBranch,
    },
    SceneRequested {
        scene: Scene,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PursuerView {
    pub name: PursuerName,
    pub mode: PursuerMode,
    pub present: bool,
    pub position: Position,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub state: SessionState,
    pub level: u32,
    pub lives: i32,
    pub score: i32,
    #[serde(rename = "remainingNodes")]
    pub remaining_nodes: usize,
    #[serde(rename = "agentPosition")]
    pub agent_position: Position,
    #[serde(rename = "agentDirection")]
    pub agent_direction: Direction,
    #[serde(rename = "killStreak")]
    pub kill_streak: u32,
    pub pursuers: Vec<PursuerView>,
    pub muted: bool,
    pub thresholds: ScoreThresholds,
}
