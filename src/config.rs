use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    AGENT_BASE_SPEED, DEATH_DELAY_MS, DEFAULT_LEADERBOARD_URL, FIRST_PLAYABLE_LEVEL,
    GAME_OVER_DISPLAY_MS, LEADERBOARD_TIMEOUT_SECS, READY_DELAY_MS, SCARE_LENGTH_MS,
    SPEED_PER_LEVEL, STARTING_LIVES,
};
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub prefs_path: PathBuf,
    pub leaderboard: LeaderboardConfig,
    pub gameplay: GameplayConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            prefs_path: PathBuf::from(".data/prefs.json"),
            leaderboard: LeaderboardConfig::default(),
            gameplay: GameplayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl LeaderboardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LEADERBOARD_URL.to_string(),
            timeout_secs: LEADERBOARD_TIMEOUT_SECS,
        }
    }
}

/// Tunables for one play session. Durations are in milliseconds, speeds in cells per second.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    pub starting_lives: i32,
    pub scare_length_ms: u64,
    pub ready_delay_ms: u64,
    pub death_delay_ms: u64,
    pub game_over_display_ms: u64,
    pub agent_speed: f32,
    pub speed_per_level: f32,
    pub first_playable_level: u32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            starting_lives: STARTING_LIVES,
            scare_length_ms: SCARE_LENGTH_MS,
            ready_delay_ms: READY_DELAY_MS,
            death_delay_ms: DEATH_DELAY_MS,
            game_over_display_ms: GAME_OVER_DISPLAY_MS,
            agent_speed: AGENT_BASE_SPEED,
            speed_per_level: SPEED_PER_LEVEL,
            first_playable_level: FIRST_PLAYABLE_LEVEL,
        }
    }
}

impl RunnerConfig {
    /// Reads the optional TOML file, then applies `DOSE_LEADERBOARD_URL` / `DOSE_PREFS_PATH`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(
            std::env::var("DOSE_LEADERBOARD_URL").ok(),
            std::env::var("DOSE_PREFS_PATH").ok(),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leaderboard.endpoint.trim().is_empty() {
            return invalid("leaderboard.endpoint", "must not be empty");
        }
        if self.leaderboard.timeout_secs == 0 {
            return invalid("leaderboard.timeout_secs", "must be > 0");
        }
        let gameplay = &self.gameplay;
        if gameplay.starting_lives <= 0 {
            return invalid("gameplay.starting_lives", "must be > 0");
        }
        if !gameplay.agent_speed.is_finite() || gameplay.agent_speed <= 0.0 {
            return invalid("gameplay.agent_speed", "must be a positive number");
        }
        if !gameplay.speed_per_level.is_finite() || gameplay.speed_per_level < 0.0 {
            return invalid("gameplay.speed_per_level", "must be a non-negative number");
        }
        if gameplay.scare_length_ms == 0 {
            return invalid("gameplay.scare_length_ms", "must be > 0");
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self, endpoint: Option<String>, prefs_path: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|value| !value.trim().is_empty()) {
            self.leaderboard.endpoint = endpoint.trim().to_string();
        }
        if let Some(prefs_path) = prefs_path.filter(|value| !value.trim().is_empty()) {
            self.prefs_path = PathBuf::from(prefs_path);
        }
    }
}

fn invalid(field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid { field, reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let config = RunnerConfig::from_toml(
            r#"
[leaderboard]
endpoint = "https://scores.example/topscores"

[gameplay]
starting_lives = 5
"#,
        )
        .expect("config parses");
        assert_eq!(config.leaderboard.endpoint, "https://scores.example/topscores");
        assert_eq!(config.leaderboard.timeout_secs, LEADERBOARD_TIMEOUT_SECS);
        assert_eq!(config.gameplay.starting_lives, 5);
        assert_eq!(config.gameplay.scare_length_ms, SCARE_LENGTH_MS);
        assert_eq!(config.prefs_path, PathBuf::from(".data/prefs.json"));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let error = RunnerConfig::from_toml("gameplay = 3").expect_err("wrong type");
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let error = RunnerConfig::from_toml("[leaderboard]\ntimeout_secs = 0").expect_err("zero");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "leaderboard.timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn gameplay_needs_lives_and_speed() {
        let error = RunnerConfig::from_toml("[gameplay]\nstarting_lives = 0").expect_err("no lives");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "gameplay.starting_lives",
                ..
            }
        ));

        let mut config = RunnerConfig::default();
        config.gameplay.agent_speed = f32::NAN;
        assert!(config.validate().is_err());
        config.gameplay.agent_speed = -1.0;
        assert!(config.validate().is_err());
        config.gameplay.agent_speed = AGENT_BASE_SPEED;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_ignore_blank_values() {
        let mut config = RunnerConfig::default();
        config.apply_env_overrides(Some("  ".to_string()), Some("/tmp/prefs.json".to_string()));
        assert_eq!(config.leaderboard.endpoint, DEFAULT_LEADERBOARD_URL);
        assert_eq!(config.prefs_path, PathBuf::from("/tmp/prefs.json"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = RunnerConfig::load(Some(&dir.path().join("absent.toml"))).expect_err("missing");
        assert!(matches!(error, ConfigError::Read { .. }));
    }
}
