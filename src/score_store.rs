use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{LEADERBOARD_CAPACITY, TABLE_HEADER};
use crate::leaderboard::escape_name;
use crate::types::ScoreRecord;

const FILE_VERSION: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub player_name: String,
    pub email: String,
    pub score: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Saved,
    Duplicate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredSubmission {
    #[serde(rename = "playerName", alias = "player_name")]
    player_name: String,
    email: String,
    score: i32,
    #[serde(rename = "submittedAtMs", alias = "submitted_at_ms")]
    submitted_at_ms: i64,
}

impl StoredSubmission {
    fn submitted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.submitted_at_ms)
    }
}

#[derive(Clone, Debug, Serialize)]
struct ScoreStoreFile<'a> {
    version: u8,
    submissions: &'a [StoredSubmission],
}

#[derive(Clone, Debug, Deserialize)]
struct ScoreStoreFileRaw {
    version: u8,
    submissions: Vec<serde_json::Value>,
}

pub struct ScoreStore {
    file_path: Option<PathBuf>,
    submissions: Vec<StoredSubmission>,
}

impl ScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let submissions = load_submissions(&file_path);
        Self {
            file_path: Some(file_path),
            submissions,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            file_path: None,
            submissions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn insert(&mut self, submission: ScoreSubmission) -> InsertOutcome {
        self.insert_at(submission, Utc::now())
    }

    pub fn insert_at(&mut self, submission: ScoreSubmission, now: DateTime<Utc>) -> InsertOutcome {
        let today = now.date_naive();
        let duplicate = self.submissions.iter().any(|stored| {
            stored.player_name == submission.player_name
                && stored.email == submission.email
                && stored.score == submission.score
                && stored
                    .submitted_at()
                    .is_some_and(|at| at.date_naive() == today)
        });
        if duplicate {
            tracing::debug!(player = %submission.player_name, score = submission.score, "duplicate submission");
            return InsertOutcome::Duplicate;
        }

        self.submissions.push(StoredSubmission {
            player_name: submission.player_name,
            email: submission.email,
            score: submission.score,
            submitted_at_ms: now.timestamp_millis(),
        });
        self.save();
        InsertOutcome::Saved
    }

    /// Highest scores first; equal scores keep submission order.
    pub fn top(&self, limit: usize) -> Vec<ScoreRecord> {
        let mut ranked: Vec<&StoredSubmission> = self.submissions.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.submitted_at_ms.cmp(&b.submitted_at_ms))
        });
        ranked
            .into_iter()
            .take(limit)
            .map(|stored| ScoreRecord::new(stored.player_name.clone(), stored.score))
            .collect()
    }

    pub fn render_table(&self) -> String {
        let mut table = format!("{TABLE_HEADER}\n");
        for record in self.top(LEADERBOARD_CAPACITY) {
            table.push_str(&escape_name(&record.name));
            table.push('\t');
            table.push_str(&record.score.to_string());
            table.push('\n');
        }
        table
    }

    fn save(&self) {
        let Some(file_path) = self.file_path.as_ref() else {
            return;
        };
        if let Some(parent) = file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %error, "failed to create score store dir");
                return;
            }
        }

        let payload = ScoreStoreFile {
            version: FILE_VERSION,
            submissions: &self.submissions,
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(file_path, text) {
                    tracing::warn!(path = %file_path.display(), error = %error, "failed to write score store");
                }
            }
            Err(error) => {
                tracing::warn!(path = %file_path.display(), error = %error, "failed to serialize score store");
            }
        }
    }
}

fn load_submissions(path: &Path) -> Vec<StoredSubmission> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %error, "failed to read score store");
            }
            return Vec::new();
        }
    };
    let parsed = match serde_json::from_str::<ScoreStoreFileRaw>(&text) {
        Ok(value) if value.version == FILE_VERSION => value,
        Ok(value) => {
            tracing::warn!(path = %path.display(), version = value.version, "unsupported score store version");
            return Vec::new();
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "failed to parse score store");
            return Vec::new();
        }
    };

    let mut submissions = Vec::with_capacity(parsed.submissions.len());
    for (index, raw) in parsed.submissions.into_iter().enumerate() {
        match serde_json::from_value::<StoredSubmission>(raw) {
            Ok(stored) if !stored.player_name.trim().is_empty() => submissions.push(stored),
            Ok(_) => tracing::warn!(index, "skipping stored submission without a name"),
            Err(error) => {
                tracing::warn!(index, error = %error, "skipping unparsable stored submission")
            }
        }
    }
    submissions
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn submission(name: &str, score: i32) -> ScoreSubmission {
        ScoreSubmission {
            player_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            score,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn same_day_duplicate_is_rejected() {
        let mut store = ScoreStore::in_memory();
        assert_eq!(store.insert_at(submission("Alice", 500), noon()), InsertOutcome::Saved);
        assert_eq!(
            store.insert_at(submission("Alice", 500), noon() + Duration::hours(3)),
            InsertOutcome::Duplicate
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn next_day_or_different_score_is_accepted() {
        let mut store = ScoreStore::in_memory();
        store.insert_at(submission("Alice", 500), noon());
        assert_eq!(
            store.insert_at(submission("Alice", 500), noon() + Duration::days(1)),
            InsertOutcome::Saved
        );
        assert_eq!(store.insert_at(submission("Alice", 510), noon()), InsertOutcome::Saved);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn top_orders_by_score_then_age_and_caps() {
        let mut store = ScoreStore::in_memory();
        for idx in 0..12 {
            store.insert_at(submission(&format!("P{idx}"), idx * 10), noon());
        }
        store.insert_at(submission("Late", 110), noon() + Duration::minutes(1));

        let top = store.top(LEADERBOARD_CAPACITY);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], ScoreRecord::new("P11", 110));
        assert_eq!(top[1], ScoreRecord::new("Late", 110));
        assert_eq!(top[9].score, 30);
    }

    #[test]
    fn render_table_escapes_tabs() {
        let mut store = ScoreStore::in_memory();
        store.insert_at(submission("Bob", 300), noon());
        store.insert_at(submission("Tab\tName", 500), noon());
        assert_eq!(
            store.render_table(),
            "name\tscore\nTab\\\tName\t500\nBob\t300\n"
        );
    }

    #[test]
    fn empty_store_renders_header_only() {
        assert_eq!(ScoreStore::in_memory().render_table(), "name\tscore\n");
    }

    #[test]
    fn submissions_survive_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scores").join("scores.json");
        let mut store = ScoreStore::new(path.clone());
        store.insert_at(submission("Alice", 500), noon());

        let mut reloaded = ScoreStore::new(path);
        assert_eq!(reloaded.top(10), vec![ScoreRecord::new("Alice", 500)]);
        assert_eq!(
            reloaded.insert_at(submission("Alice", 500), noon()),
            InsertOutcome::Duplicate
        );
    }

    #[test]
    fn load_keeps_valid_entries_when_invalid_entries_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scores.json");
        let raw = r#"{
  "version": 1,
  "submissions": [
    { "playerName": "Alice", "email": "a@example.com", "score": 500, "submittedAtMs": 10 },
    { "playerName": "Broken", "score": "lots" },
    { "player_name": "Legacy", "email": "l@example.com", "score": 20, "submitted_at_ms": 5 },
    { "playerName": "  ", "email": "x@example.com", "score": 1, "submittedAtMs": 1 }
  ]
}"#;
        fs::write(&path, raw).expect("write file");

        let store = ScoreStore::new(path);
        assert_eq!(
            store.top(10),
            vec![ScoreRecord::new("Alice", 500), ScoreRecord::new("Legacy", 20)]
        );
    }

    #[test]
    fn unsupported_version_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scores.json");
        fs::write(&path, r#"{ "version": 9, "submissions": [] }"#).expect("write file");
        assert!(ScoreStore::new(path).is_empty());
    }
}
