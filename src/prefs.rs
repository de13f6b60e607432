use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::types::PendingSubmission;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(rename = "PlayerName", default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(rename = "PlayerEmail", default, skip_serializing_if = "Option::is_none")]
    pub player_email: Option<String>,
    #[serde(rename = "PlayerScore", default, skip_serializing_if = "Option::is_none")]
    pub player_score: Option<i32>,
}

impl PlayerRecord {
    pub fn name(&self) -> &str {
        self.player_name.as_deref().unwrap_or("")
    }

    pub fn email(&self) -> &str {
        self.player_email.as_deref().unwrap_or("")
    }

    pub fn score(&self) -> i32 {
        self.player_score.unwrap_or(0)
    }

    /// Builds a submission when a name, an email and a positive score are all on record.
    pub fn pending_submission(&self) -> Option<PendingSubmission> {
        if self.name().is_empty() || self.email().is_empty() || self.score() <= 0 {
            return None;
        }
        Some(PendingSubmission {
            player_name: self.name().to_string(),
            email: self.email().to_string(),
            score: self.score(),
        })
    }
}

pub trait PreferenceStore: Send + Sync {
    fn player_record(&self) -> PlayerRecord;
    fn store_identity(&self, name: &str, email: &str);
    fn store_score(&self, score: i32);
    fn clear_submission(&self);
}

pub type SharedPreferences = Arc<dyn PreferenceStore>;

#[derive(Debug, Default)]
pub struct MemoryPreferences {
    record: Mutex<PlayerRecord>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PlayerRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    pub fn shared(self) -> SharedPreferences {
        Arc::new(self)
    }
}

impl PreferenceStore for MemoryPreferences {
    fn player_record(&self) -> PlayerRecord {
        lock(&self.record).clone()
    }

    fn store_identity(&self, name: &str, email: &str) {
        let mut record = lock(&self.record);
        record.player_name = Some(name.to_string());
        record.player_email = Some(email.to_string());
    }

    fn store_score(&self, score: i32) {
        lock(&self.record).player_score = Some(score);
    }

    fn clear_submission(&self) {
        *lock(&self.record) = PlayerRecord::default();
    }
}

#[derive(Debug)]
pub struct FilePreferences {
    file_path: PathBuf,
    record: Mutex<PlayerRecord>,
}

impl FilePreferences {
    pub fn new(file_path: PathBuf) -> Self {
        let record = load_record(&file_path);
        Self {
            file_path,
            record: Mutex::new(record),
        }
    }

    pub fn shared(self) -> SharedPreferences {
        Arc::new(self)
    }

    fn update(&self, apply: impl FnOnce(&mut PlayerRecord)) {
        let mut record = lock(&self.record);
        apply(&mut record);
        save_record(&self.file_path, &record);
    }
}

impl PreferenceStore for FilePreferences {
    fn player_record(&self) -> PlayerRecord {
        lock(&self.record).clone()
    }

    fn store_identity(&self, name: &str, email: &str) {
        self.update(|record| {
            record.player_name = Some(name.to_string());
            record.player_email = Some(email.to_string());
        });
    }

    fn store_score(&self, score: i32) {
        self.update(|record| record.player_score = Some(score));
    }

    fn clear_submission(&self) {
        self.update(|record| *record = PlayerRecord::default());
    }
}

fn lock(record: &Mutex<PlayerRecord>) -> MutexGuard<'_, PlayerRecord> {
    record.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn load_record(path: &Path) -> PlayerRecord {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %error, "failed to read prefs");
            }
            return PlayerRecord::default();
        }
    };
    match serde_json::from_str::<PlayerRecord>(&text) {
        Ok(record) => record,
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "failed to parse prefs");
            PlayerRecord::default()
        }
    }
}

fn save_record(path: &Path, record: &PlayerRecord) {
    if let Some(parent) = path.parent() {
        if let Err(error) = fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %error, "failed to create prefs dir");
            return;
        }
    }
    match serde_json::to_string_pretty(record) {
        Ok(text) => {
            if let Err(error) = fs::write(path, text) {
                tracing::warn!(path = %path.display(), error = %error, "failed to write prefs");
            }
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "failed to serialize prefs");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_submission_requires_identity_and_positive_score() {
        let mut record = PlayerRecord {
            player_name: Some("Alice".to_string()),
            player_email: Some("alice@example.com".to_string()),
            player_score: Some(0),
        };
        assert_eq!(record.pending_submission(), None);

        record.player_score = Some(420);
        assert_eq!(
            record.pending_submission(),
            Some(PendingSubmission {
                player_name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                score: 420,
            })
        );

        record.player_email = Some(String::new());
        assert_eq!(record.pending_submission(), None);
    }

    #[test]
    fn file_preferences_survive_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("prefs.json");
        let prefs = FilePreferences::new(path.clone());
        prefs.store_identity("Alice", "alice@example.com");
        prefs.store_score(900);

        let reloaded = FilePreferences::new(path.clone());
        let record = reloaded.player_record();
        assert_eq!(record.name(), "Alice");
        assert_eq!(record.email(), "alice@example.com");
        assert_eq!(record.score(), 900);

        let raw = fs::read_to_string(&path).expect("prefs written");
        assert!(raw.contains("\"PlayerScore\": 900"));
    }

    #[test]
    fn clear_submission_removes_all_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        let prefs = FilePreferences::new(path.clone());
        prefs.store_identity("Alice", "alice@example.com");
        prefs.store_score(900);
        prefs.clear_submission();

        assert_eq!(FilePreferences::new(path).player_record(), PlayerRecord::default());
    }

    #[test]
    fn corrupt_file_degrades_to_empty_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").expect("write file");
        assert_eq!(FilePreferences::new(path).player_record(), PlayerRecord::default());
    }
}
