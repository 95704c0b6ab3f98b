// Chat and stats records for the game's REST backend.
use crate::error::BackendError;
use crate::game::Outcome;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ChatRecord<'a> {
    email: &'a str,
    speaker: &'a str,
    message: &'a str,
}

// Counters are incremental on the server side; absent fields are left untouched.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatsUpdate {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_guesses: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorrect_guesses: Option<u32>,
}

impl StatsUpdate {
    pub fn for_outcome(email: impl Into<String>, outcome: Outcome) -> Self {
        let email = email.into();
        match outcome {
            Outcome::Survived => Self {
                email,
                correct_guesses: Some(1),
                ..Default::default()
            },
            Outcome::Lost => Self {
                email,
                incorrect_guesses: Some(1),
                ..Default::default()
            },
        }
    }
}

/// Fire-and-forget client. Every call spawns its own request on the tokio
/// runtime; failures are logged and never reach the game.
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
}

impl StatsClient {
    pub fn new(base_url: &str, email: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
        }
    }

    // Only enabled when both the backend and the player are configured.
    pub fn from_settings(settings: &crate::settings::Settings) -> Option<Self> {
        match (&settings.backend_url, &settings.player_email) {
            (Some(url), Some(email)) if !url.is_empty() && !email.is_empty() => {
                Some(Self::new(url, email))
            }
            _ => None,
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    pub fn stats_url(&self) -> String {
        format!("{}/api/stats", self.base_url)
    }

    pub fn record_message(&self, speaker: &str, message: &str) {
        let body = serde_json::to_value(ChatRecord {
            email: &self.email,
            speaker,
            message,
        });
        match body {
            Ok(body) => self.post(self.chat_url(), body),
            Err(e) => log::warn!("Failed to encode chat record: {}", e),
        }
    }

    pub fn record_landing(&self, outcome: Outcome) {
        match serde_json::to_value(StatsUpdate::for_outcome(&self.email, outcome)) {
            Ok(body) => self.post(self.stats_url(), body),
            Err(e) => log::warn!("Failed to encode stats update: {}", e),
        }
    }

    fn post(&self, url: String, body: serde_json::Value) {
        let http = self.http.clone();
        tokio::spawn(async move {
            if let Err(e) = send(&http, &url, &body).await {
                log::warn!("Backend call to {} failed: {:#}", url, e);
            }
        });
    }
}

async fn send(
    http: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
) -> Result<(), BackendError> {
    let response = http
        .post(url)
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(BackendError::Status(response.status()));
    }
    Ok(())
}
