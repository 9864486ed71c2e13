//! GitHub GraphQL client.
//!
//! Construction never talks to GitHub; a bad token only shows up on the first query.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::base::{config::Config, types::Res};

use super::{CodeHostClient, GenericCodeHostClient};

const VIEWER_LOGIN_QUERY: &str = "query { viewer { login } }";

// Extra methods on `CodeHostClient` applied by the github implementation.

impl CodeHostClient {
    pub fn github(config: &Config) -> Res<Self> {
        let client = GithubCodeHostClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

// Wire types.

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    login: String,
}

// Specific implementations.

/// GitHub client implementation.
#[derive(Clone)]
pub struct GithubCodeHostClient {
    api_url: String,
    client: reqwest::Client,
}

impl GithubCodeHostClient {
    #[instrument(name = "GithubCodeHostClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let mut token = HeaderValue::from_str(&format!("Bearer {}", config.github_token))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);

        // GitHub rejects requests without a user agent.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_url: config.github_api_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl GenericCodeHostClient for GithubCodeHostClient {
    #[instrument(skip(self))]
    async fn viewer_login(&self) -> Res<String> {
        let response = self.client.post(&self.api_url).json(&json!({ "query": VIEWER_LOGIN_QUERY })).send().await?.error_for_status()?;
        let body: GraphQlResponse<ViewerData> = response.json().await?;

        if let Some(error) = body.errors.first() {
            return Err(anyhow::anyhow!("GitHub query failed: {}", error.message));
        }

        let data = body.data.ok_or_else(|| anyhow::anyhow!("GitHub returned no data."))?;

        Ok(data.viewer.login)
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::base::config::ConfigInner;

    fn client_for(server: &mockito::ServerGuard) -> GithubCodeHostClient {
        let config = Config::from(ConfigInner {
            github_token: "ghp_test".to_string(),
            github_api_url: format!("{}/graphql", server.url()),
            ..Default::default()
        });

        GithubCodeHostClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn returns_viewer_login() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer ghp_test")
            .match_body(Matcher::Json(json!({ "query": VIEWER_LOGIN_QUERY })))
            .with_status(200)
            .with_body(r#"{ "data": { "viewer": { "login": "octocat" } } }"#)
            .create_async()
            .await;

        let login = client_for(&server).viewer_login().await.unwrap();

        assert_eq!(login, "octocat");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn graphql_errors_are_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{ "data": null, "errors": [{ "message": "Bad credentials" }] }"#)
            .create_async()
            .await;

        let err = client_for(&server).viewer_login().await.unwrap_err();

        assert!(err.to_string().contains("Bad credentials"));
    }

    #[tokio::test]
    async fn unauthorized_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/graphql").with_status(401).with_body(r#"{ "message": "Bad credentials" }"#).create_async().await;

        assert!(client_for(&server).viewer_login().await.is_err());
    }
}
