//! Mattermost REST client for tally-bot.
//!
//! This module implements `GenericPlatformClient` over the Mattermost v4 REST API:
//! - Probing the server and resolving the bot, team, and channel
//! - Posting messages into the monitored channel
//! - Listing and executing slash commands

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::{debug, instrument};

use crate::base::{
    config::Config,
    types::{Bot, Channel, Command, CommandResponse, NewChannel, OutboundReply, Post, Res, Team},
};

use super::{GenericPlatformClient, PlatformClient};

// Extra methods on `PlatformClient` applied by the mattermost implementation.

impl PlatformClient {
    /// Creates a new Mattermost platform client.
    pub fn mattermost(config: &Config) -> Res<Self> {
        let client = MattermostPlatformClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Errors.

/// Error body the Mattermost API returns on failure.
#[derive(Debug, Clone, Default, Deserialize, thiserror::Error)]
#[error("{message} (id: {id}, status: {status_code}) {detailed_error}")]
pub struct AppError {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub detailed_error: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub status_code: u16,
}

impl AppError {
    /// Builds an error from a failed response that may or may not carry a JSON error body.
    fn from_response(status: StatusCode, body: &str) -> Self {
        let mut error = serde_json::from_str::<AppError>(body).unwrap_or_else(|_| AppError {
            detailed_error: body.to_string(),
            ..Default::default()
        });

        if error.status_code == 0 {
            error.status_code = status.as_u16();
        }

        if error.message.is_empty() {
            error.message = status.canonical_reason().unwrap_or("Request failed").to_string();
        }

        error
    }
}

// Specific implementations.

/// Mattermost client implementation.
#[derive(Clone)]
pub struct MattermostPlatformClient {
    api_url: String,
    client: reqwest::Client,
}

impl MattermostPlatformClient {
    /// Create a new Mattermost client that authenticates every call with the bot's token.
    #[instrument(name = "MattermostPlatformClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let mut token = HeaderValue::from_str(&format!("Bearer {}", config.mattermost_secret))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let api_url = format!("{}/api/v4", config.server_url.trim_end_matches('/'));

        Ok(Self { api_url, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Decodes a successful response body, or turns a failed one into an `AppError`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Res<T> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "Mattermost request failed");

    Err(AppError::from_response(status, &body).into())
}

#[async_trait]
impl GenericPlatformClient for MattermostPlatformClient {
    #[instrument(skip(self))]
    async fn get_server_version(&self) -> Res<String> {
        let response = self.client.get(self.url("/config/client")).query(&[("format", "old")]).send().await?;
        let props: HashMap<String, String> = decode(response).await?;

        props.get("Version").cloned().ok_or_else(|| anyhow::anyhow!("The server did not report a version."))
    }

    #[instrument(skip(self))]
    async fn get_bots(&self, page: u32, per_page: u32) -> Res<Vec<Bot>> {
        let response = self.client.get(self.url("/bots")).query(&[("page", page), ("per_page", per_page)]).send().await?;

        decode(response).await
    }

    #[instrument(skip(self))]
    async fn get_team_by_name(&self, name: &str) -> Res<Team> {
        let response = self.client.get(self.url(&format!("/teams/name/{name}"))).send().await?;

        decode(response).await
    }

    #[instrument(skip(self))]
    async fn get_channel_by_name(&self, team_id: &str, name: &str) -> Res<Channel> {
        let response = self.client.get(self.url(&format!("/teams/{team_id}/channels/name/{name}"))).send().await?;

        decode(response).await
    }

    #[instrument(skip(self))]
    async fn create_channel(&self, channel: &NewChannel) -> Res<Channel> {
        let response = self.client.post(self.url("/channels")).json(channel).send().await?;

        decode(response).await
    }

    #[instrument(skip(self))]
    async fn create_post(&self, reply: &OutboundReply) -> Res<Post> {
        let response = self.client.post(self.url("/posts")).json(reply).send().await?;

        decode(response).await
    }

    #[instrument(skip(self))]
    async fn list_autocomplete_commands(&self, team_id: &str) -> Res<Vec<Command>> {
        let response = self.client.get(self.url(&format!("/teams/{team_id}/commands/autocomplete"))).send().await?;

        decode(response).await
    }

    #[instrument(skip(self))]
    async fn execute_command(&self, channel_id: &str, command: &str) -> Res<CommandResponse> {
        let body = json!({ "channel_id": channel_id, "command": command });
        let response = self.client.post(self.url("/commands/execute")).json(&body).send().await?;

        decode(response).await
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::base::config::ConfigInner;

    fn client_for(server: &mockito::ServerGuard) -> MattermostPlatformClient {
        let config = Config::from(ConfigInner {
            mattermost_secret: "s3cret".to_string(),
            server_url: server.url(),
            ..Default::default()
        });

        MattermostPlatformClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn reads_server_version_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/config/client")
            .match_query(Matcher::UrlEncoded("format".into(), "old".into()))
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_body(r#"{ "Version": "5.30.0", "SiteName": "Mattermost" }"#)
            .create_async()
            .await;

        let version = client_for(&server).get_server_version().await.unwrap();

        assert_eq!(version, "5.30.0");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_call_surfaces_app_error_details() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/teams/name/botteam")
            .with_status(404)
            .with_body(r#"{ "id": "app.team.get_by_name.missing.app_error", "message": "Unable to find the existing team.", "detailed_error": "name=botteam", "status_code": 404 }"#)
            .create_async()
            .await;

        let err = client_for(&server).get_team_by_name("botteam").await.unwrap_err();
        let app_error = err.downcast_ref::<AppError>().unwrap();

        assert_eq!(app_error.id, "app.team.get_by_name.missing.app_error");
        assert_eq!(app_error.status_code, 404);

        let rendered = err.to_string();
        assert!(rendered.contains("Unable to find the existing team."));
        assert!(rendered.contains("app.team.get_by_name.missing.app_error"));
        assert!(rendered.contains("name=botteam"));
    }

    #[tokio::test]
    async fn failed_call_without_json_body_still_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/api/v4/bots").match_query(Matcher::Any).with_status(502).with_body("bad gateway").create_async().await;

        let err = client_for(&server).get_bots(0, 100).await.unwrap_err();
        let app_error = err.downcast_ref::<AppError>().unwrap();

        assert_eq!(app_error.status_code, 502);
        assert_eq!(app_error.detailed_error, "bad gateway");
    }

    #[tokio::test]
    async fn lists_bots_with_paging() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/bots")
            .match_query(Matcher::AllOf(vec![Matcher::UrlEncoded("page".into(), "0".into()), Matcher::UrlEncoded("per_page".into(), "100".into())]))
            .with_status(200)
            .with_body(r#"[{ "user_id": "u1", "username": "tallybot", "display_name": "Tally" }, { "user_id": "u2", "username": "other" }]"#)
            .create_async()
            .await;

        let bots = client_for(&server).get_bots(0, 100).await.unwrap();

        assert_eq!(bots.len(), 2);
        assert_eq!(bots[0].user_id, "u1");
        assert_eq!(bots[1].display_name, "");
    }

    #[tokio::test]
    async fn threaded_post_sends_root_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v4/posts")
            .match_body(Matcher::Json(json!({ "channel_id": "c1", "message": "Yes I'm running", "root_id": "p1" })))
            .with_status(201)
            .with_body(r#"{ "id": "p2", "channel_id": "c1", "message": "Yes I'm running", "root_id": "p1" }"#)
            .create_async()
            .await;

        let post = client_for(&server).create_post(&OutboundReply::threaded("c1", "Yes I'm running", "p1")).await.unwrap();

        assert_eq!(post.id, "p2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn top_level_post_omits_root_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v4/posts")
            .match_body(Matcher::Json(json!({ "channel_id": "c1", "message": "hi" })))
            .with_status(201)
            .with_body(r#"{ "id": "p3" }"#)
            .create_async()
            .await;

        client_for(&server).create_post(&OutboundReply::new("c1", "hi")).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn executes_commands_in_channel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v4/commands/execute")
            .match_body(Matcher::Json(json!({ "channel_id": "c1", "command": "/github me" })))
            .with_status(200)
            .with_body(r#"{ "response_type": "ephemeral", "text": "octocat" }"#)
            .create_async()
            .await;

        let response = client_for(&server).execute_command("c1", "/github me").await.unwrap();

        assert_eq!(response.text, "octocat");
    }
}
