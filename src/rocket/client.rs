use crate::rocket::message::{LoginRequest, LoginResponse, PostMessageRequest, PostMessageResponse};
use crate::sweep::Notifier;
use anyhow::{Context, Result};
use tracing::{debug, info};

mod endpoints {
    pub const LOGIN: &str = "/api/v1/login";
    pub const POST_MESSAGE: &str = "/api/v1/chat.postMessage";
}

#[derive(Debug, Clone)]
struct Session {
    auth_token: String,
    user_id: String,
}

/// Rocket.Chat REST client posting to a single channel.
pub struct RocketClient {
    http: reqwest::Client,
    base_url: String,
    channel: String,
    session: Option<Session>,
}

impl RocketClient {
    pub fn new(http: reqwest::Client, base_url: &str, channel: &str) -> Self {
        RocketClient {
            http,
            base_url: base_url.to_string(),
            channel: channel.to_string(),
            session: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Logs in and keeps the session for later posts.
    ///
    /// The returned login response is kept even for rejected credentials so
    /// the caller can report what the server said.
    pub async fn login(&mut self, user: &str, password: &str) -> Result<LoginResponse> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoints::LOGIN))
            .json(&LoginRequest { user, password })
            .send()
            .await
            .context("Rocket.Chat login request failed")?;

        let http_status = response.status();
        let login = response
            .json::<LoginResponse>()
            .await
            .with_context(|| format!("Unreadable Rocket.Chat login response: HTTP {http_status}"))?;

        info!(status = %login.status, "Rocket login status");
        if let Some(message) = login.message.as_deref().filter(|m| !m.is_empty()) {
            info!(message, "Rocket login response message");
        }

        match &login.data {
            Some(data) if http_status.is_success() => {
                self.session = Some(Session {
                    auth_token: data.auth_token.clone(),
                    user_id: data.user_id.clone(),
                });
                Ok(login)
            }
            _ => Err(anyhow::anyhow!(
                "Rocket.Chat login rejected: HTTP {}, status {:?}",
                http_status,
                login.status
            )),
        }
    }
}

impl Notifier for RocketClient {
    async fn notify(&self, text: &str) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .context("Not logged in to Rocket.Chat")?;
        debug!(channel = %self.channel, text, "posting message");

        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoints::POST_MESSAGE))
            .header("X-Auth-Token", &session.auth_token)
            .header("X-User-Id", &session.user_id)
            .json(&PostMessageRequest {
                channel: &self.channel,
                text,
            })
            .send()
            .await
            .context("Rocket.Chat postMessage request failed")?;

        let status = response.status();
        let posted = response
            .json::<PostMessageResponse>()
            .await
            .with_context(|| format!("Unreadable Rocket.Chat postMessage response: HTTP {status}"))?;

        if !status.is_success() || !posted.success {
            return Err(anyhow::anyhow!(
                "Rocket.Chat refused the message: HTTP {}, error {}",
                status,
                posted.error.as_deref().unwrap_or("none")
            ));
        }
        Ok(())
    }
}
