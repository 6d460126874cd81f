//! HTTP API client for the pairing server.

use anyhow::{Context, Result};
use club_pairing::{
    messages::ClientCommand,
    room::{CreateTournament, RoomInfo},
    tournament::{Tournament, TournamentId},
};
use reqwest::{RequestBuilder, Response};

/// API client for communicating with the pairing server
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    access_token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            access_token: None,
        }
    }

    /// Attach an access token issued by the account service
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Create a tournament owned by the token's user
    pub async fn create_tournament(&self, request: &CreateTournament) -> Result<Tournament> {
        let response = self
            .authorized(self.client.post(format!("{}/api/v1/tournaments", self.base_url)))?
            .json(request)
            .send()
            .await
            .context("Failed to send create tournament request")?;

        let response = check(response, "Tournament creation failed").await?;
        response
            .json()
            .await
            .context("Failed to parse created tournament")
    }

    /// Fetch the full state of a tournament
    pub async fn snapshot(&self, tournament_id: TournamentId) -> Result<Tournament> {
        let response = self
            .client
            .get(format!("{}/api/v1/tournaments/{}", self.base_url, tournament_id))
            .send()
            .await
            .context("Failed to fetch tournament")?;

        let response = check(response, "Snapshot request failed").await?;
        response
            .json()
            .await
            .context("Failed to parse tournament snapshot")
    }

    /// Live room statistics
    pub async fn room_info(&self, tournament_id: TournamentId) -> Result<RoomInfo> {
        let response = self
            .client
            .get(format!(
                "{}/api/v1/tournaments/{}/room",
                self.base_url, tournament_id
            ))
            .send()
            .await
            .context("Failed to fetch room info")?;

        let response = check(response, "Room request failed").await?;
        response.json().await.context("Failed to parse room info")
    }

    /// Send a command over HTTP instead of a live connection
    pub async fn send_command(
        &self,
        tournament_id: TournamentId,
        command: &ClientCommand,
    ) -> Result<()> {
        let url = format!(
            "{}/api/v1/tournaments/{}/commands",
            self.base_url, tournament_id
        );
        let response = self
            .authorized(self.client.post(url))?
            .json(command)
            .send()
            .await
            .context("Failed to send command")?;

        check(response, "Command rejected").await?;
        Ok(())
    }

    /// WebSocket URL of a tournament room, with the token when one is set
    pub fn websocket_url(&self, tournament_id: TournamentId) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.base_url.clone()
        };

        match &self.access_token {
            Some(token) => format!("{}/ws/{}?token={}", ws_base, tournament_id, token),
            None => format!("{}/ws/{}", ws_base, tournament_id),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .access_token
            .as_ref()
            .context("An access token is required for this request")?;
        Ok(request.bearer_auth(token))
    }
}

async fn check(response: Response, what: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
    anyhow::bail!("{} ({}): {}", what, status, error_text)
}
