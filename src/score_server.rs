use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::constants::{SCORE_EXISTS_BODY, SCORE_SAVED_BODY};
use crate::score_store::{InsertOutcome, ScoreStore, ScoreSubmission};

pub const MISSING_FIELDS_BODY: &str = "Error: Missing required fields";
pub const SCORES_PATH: &str = "/topscores";

pub type SharedScoreStore = Arc<Mutex<ScoreStore>>;

pub fn router(store: SharedScoreStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(healthz))
        .route(SCORES_PATH, get(scores_handler).post(submit_handler))
        .layer(cors)
        .with_state(store)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn scores_handler(State(store): State<SharedScoreStore>) -> impl IntoResponse {
    let table = store.lock().await.render_table();
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], table)
}

async fn submit_handler(
    State(store): State<SharedScoreStore>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> impl IntoResponse {
    let fields = match form {
        Ok(Form(fields)) => fields,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable score form");
            return (StatusCode::BAD_REQUEST, MISSING_FIELDS_BODY);
        }
    };
    let Some(submission) = submission_from_fields(&fields) else {
        tracing::debug!(fields = ?fields.keys().collect::<Vec<_>>(), "score form incomplete");
        return (StatusCode::BAD_REQUEST, MISSING_FIELDS_BODY);
    };

    let player = submission.player_name.clone();
    let score = submission.score;
    match store.lock().await.insert(submission) {
        InsertOutcome::Saved => {
            tracing::info!(player = %player, score, "score saved");
            (StatusCode::OK, SCORE_SAVED_BODY)
        }
        InsertOutcome::Duplicate => {
            tracing::info!(player = %player, score, "duplicate score ignored");
            (StatusCode::OK, SCORE_EXISTS_BODY)
        }
    }
}

fn submission_from_fields(fields: &HashMap<String, String>) -> Option<ScoreSubmission> {
    let player_name = fields.get("player_name")?.trim();
    let email = fields.get("email")?.trim();
    let score = fields.get("score")?;
    if player_name.is_empty() || email.is_empty() {
        return None;
    }
    Some(ScoreSubmission {
        player_name: player_name.to_string(),
        email: email.to_string(),
        score: leading_int(score),
    })
}

/// Integer prefix of `raw` (`"42abc"` is 42); no digits at all is 0.
fn leading_int(raw: &str) -> i32 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end]
        .parse::<i64>()
        .unwrap_or(if end == 0 { 0 } else { i64::from(i32::MAX) });
    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn complete_form_becomes_submission() {
        let submission = submission_from_fields(&fields(&[
            ("player_name", " Alice "),
            ("email", "alice@example.com"),
            ("score", "500"),
        ]))
        .expect("complete form");
        assert_eq!(submission.player_name, "Alice");
        assert_eq!(submission.score, 500);
    }

    #[test]
    fn missing_field_is_rejected() {
        assert!(submission_from_fields(&fields(&[
            ("player_name", "Alice"),
            ("score", "500"),
        ]))
        .is_none());
        assert!(submission_from_fields(&fields(&[
            ("player_name", ""),
            ("email", "alice@example.com"),
            ("score", "500"),
        ]))
        .is_none());
    }

    #[test]
    fn score_is_cast_like_an_integer_prefix() {
        assert_eq!(leading_int("42"), 42);
        assert_eq!(leading_int(" 42abc"), 42);
        assert_eq!(leading_int("-7"), -7);
        assert_eq!(leading_int("lots"), 0);
        assert_eq!(leading_int(""), 0);
        assert_eq!(leading_int("99999999999"), i32::MAX);
    }
}
