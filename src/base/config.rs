//! Load configuration via `config` crate with env-override support.

use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use reqwest::Url;
use serde::Deserialize;

use super::types::Res;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Default platform REST endpoint.
fn default_server_url() -> String {
    "http://localhost:8065".to_string()
}

/// Default platform websocket endpoint.
fn default_websocket_url() -> String {
    "ws://localhost:8065".to_string()
}

/// Default GitHub GraphQL endpoint.
fn default_github_api_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_bot_name() -> String {
    "tallybot".to_string()
}

fn default_display_name() -> String {
    "Tally Bot".to_string()
}

fn default_team_name() -> String {
    "botteam".to_string()
}

fn default_channel_name() -> String {
    "debugging-for-sample-bot".to_string()
}

fn default_channel_display_name() -> String {
    "Debugging For Sample Bot".to_string()
}

fn default_channel_purpose() -> String {
    "This is used as a test channel for logging bot debug messages".to_string()
}

/// Where the `github` keyword gets its answer from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UsernameLookup {
    /// Run the platform's `github` slash command (requires the GitHub plugin).
    #[default]
    Plugin,
    /// Ask the code-host API for the login behind the configured token.
    CodeHost,
}

/// Configuration for the tally-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Platform bot account ID (`MATTERMOST_ID`); informational only.
    #[serde(default)]
    pub mattermost_id: String,
    /// Platform bot access token (`MATTERMOST_SECRET`).
    pub mattermost_secret: String,
    /// GitHub personal access token (`GITHUB_TOKEN`).
    pub github_token: String,
    /// Platform REST base URL (`SERVER_URL`).
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Platform websocket base URL (`WEBSOCKET_URL`).
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
    /// GitHub GraphQL endpoint (`GITHUB_API_URL`).
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,
    /// Username of the bot account to operate as (`BOT_NAME`).
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    /// Human-readable name used in announcements (`DISPLAY_NAME`).
    #[serde(default = "default_display_name")]
    pub display_name: String,
    /// Team that scopes the monitored channel (`TEAM_NAME`).
    #[serde(default = "default_team_name")]
    pub team_name: String,
    /// Name of the monitored channel (`CHANNEL_NAME`).
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    /// Display name given to the monitored channel if it has to be created (`CHANNEL_DISPLAY_NAME`).
    #[serde(default = "default_channel_display_name")]
    pub channel_display_name: String,
    /// Purpose given to the monitored channel if it has to be created (`CHANNEL_PURPOSE`).
    #[serde(default = "default_channel_purpose")]
    pub channel_purpose: String,
    /// Source for `github` keyword answers (`USERNAME_LOOKUP`).
    #[serde(default)]
    pub username_lookup: UsernameLookup,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            mattermost_id: String::new(),
            mattermost_secret: String::new(),
            github_token: String::new(),
            server_url: default_server_url(),
            websocket_url: default_websocket_url(),
            github_api_url: default_github_api_url(),
            bot_name: default_bot_name(),
            display_name: default_display_name(),
            team_name: default_team_name(),
            channel_name: default_channel_name(),
            channel_display_name: default_channel_display_name(),
            channel_purpose: default_channel_purpose(),
            username_lookup: UsernameLookup::default(),
        }
    }
}

impl Config {
    /// Loads the JSON config file, then applies `TALLY_BOT_*` environment overrides.
    ///
    /// The file is required: a missing or malformed file is an error.
    pub fn load(explicit_path: Option<&Path>) -> Res<Self> {
        let path = explicit_path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let cfg = config::Config::builder()
            .add_source(config::File::from(path.clone()).format(config::FileFormat::Json).required(true))
            .add_source(config::Environment::with_prefix("TALLY_BOT"));

        let inner: ConfigInner = cfg
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("There was a problem reading the config file `{}`.", path.display()))?;

        let result = Config::from(inner);
        result.validate()?;

        Ok(result)
    }

    fn validate(&self) -> Res<()> {
        if self.mattermost_secret.trim().is_empty() {
            return Err(anyhow::anyhow!("The Mattermost secret must not be empty."));
        }

        let server_url = Url::parse(&self.server_url).with_context(|| format!("Invalid server URL `{}`.", self.server_url))?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("The server URL must use http or https."));
        }

        let websocket_url = Url::parse(&self.websocket_url).with_context(|| format!("Invalid websocket URL `{}`.", self.websocket_url))?;
        if !matches!(websocket_url.scheme(), "ws" | "wss") {
            return Err(anyhow::anyhow!("The websocket URL must use ws or wss."));
        }

        Ok(())
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_credentials_and_defaults() {
        let file = write_config(r#"{ "mattermost_id": "abc", "mattermost_secret": "s3cret", "github_token": "ghp_x" }"#);

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.mattermost_id, "abc");
        assert_eq!(config.mattermost_secret, "s3cret");
        assert_eq!(config.github_token, "ghp_x");
        assert_eq!(config.server_url, "http://localhost:8065");
        assert_eq!(config.websocket_url, "ws://localhost:8065");
        assert_eq!(config.bot_name, "tallybot");
        assert_eq!(config.team_name, "botteam");
        assert_eq!(config.channel_name, "debugging-for-sample-bot");
        assert_eq!(config.username_lookup, UsernameLookup::Plugin);
    }

    #[test]
    fn loads_overrides_from_file() {
        let file = write_config(
            r#"{
                "mattermost_secret": "s3cret",
                "github_token": "ghp_x",
                "server_url": "https://chat.example.com",
                "websocket_url": "wss://chat.example.com",
                "username_lookup": "code_host"
            }"#,
        );

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.server_url, "https://chat.example.com");
        assert_eq!(config.websocket_url, "wss://chat.example.com");
        assert_eq!(config.username_lookup, UsernameLookup::CodeHost);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config(r#"{ "mattermost_secret": "#);

        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn missing_token_is_an_error() {
        let file = write_config(r#"{ "mattermost_secret": "s3cret" }"#);

        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let file = write_config(r#"{ "mattermost_secret": "  ", "github_token": "ghp_x" }"#);

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn websocket_url_must_be_a_websocket() {
        let file = write_config(r#"{ "mattermost_secret": "s3cret", "github_token": "ghp_x", "websocket_url": "http://localhost:8065" }"#);

        assert!(Config::load(Some(file.path())).is_err());
    }
}
