use async_trait::async_trait;
use serde::Serialize;

use crate::error::LeaderboardError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreForm {
    pub player_name: String,
    pub email: String,
    pub score: String,
}

impl ScoreForm {
    pub fn new(player_name: &str, email: &str, score: i32) -> Self {
        Self {
            player_name: player_name.to_string(),
            email: email.to_string(),
            score: score.to_string(),
        }
    }
}

#[async_trait]
pub trait LeaderboardTransport: Send + Sync {
    async fn fetch_table(&self) -> Result<String, LeaderboardError>;
    async fn post_score(&self, form: &ScoreForm) -> Result<String, LeaderboardError>;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, LeaderboardError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dose-runner/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, LeaderboardError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LeaderboardError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl LeaderboardTransport for HttpTransport {
    async fn fetch_table(&self) -> Result<String, LeaderboardError> {
        let response = self.client.get(&self.endpoint).send().await?;
        Self::read_body(response).await
    }

    async fn post_score(&self, form: &ScoreForm) -> Result<String, LeaderboardError> {
        let response = self.client.post(&self.endpoint).form(form).send().await?;
        Self::read_body(response).await
    }
}
