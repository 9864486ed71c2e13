//! Resolves the answer to the `github` keyword.
//!
//! The plugin path only works when the platform has the GitHub plugin installed
//! and the command is visible to the bot's team. Every failure collapses to a
//! fixed string so the caller always has something to post.

use tracing::{debug, instrument, warn};

use crate::{
    base::{config::UsernameLookup, replies, types::Res},
    service::{code_host::CodeHostClient, platform::PlatformClient},
};

/// Looks up the GitHub username, falling back to the fixed failure text.
#[instrument(skip(platform, code_host))]
pub async fn lookup_username(source: UsernameLookup, platform: &PlatformClient, code_host: &CodeHostClient, team_id: &str, channel_id: &str) -> String {
    let result = match source {
        UsernameLookup::Plugin => lookup_via_plugin(platform, team_id, channel_id).await,
        UsernameLookup::CodeHost => code_host.viewer_login().await.map(Some),
    };

    match result {
        Ok(Some(username)) if !username.trim().is_empty() => username,
        Ok(_) => {
            warn!("Username lookup produced no username.");
            replies::USERNAME_LOOKUP_FAILED.to_string()
        }
        Err(err) => {
            warn!("Username lookup failed: {err}");
            replies::USERNAME_LOOKUP_FAILED.to_string()
        }
    }
}

/// Runs the GitHub plugin's `me` command, if the plugin's command is registered for the team.
async fn lookup_via_plugin(platform: &PlatformClient, team_id: &str, channel_id: &str) -> Res<Option<String>> {
    let commands = platform.list_autocomplete_commands(team_id).await?;

    if !commands.iter().any(|c| c.display_name == replies::GITHUB_COMMAND_NAME) {
        debug!(available = commands.len(), "GitHub command is not registered.");
        return Ok(None);
    }

    let response = platform.execute_command(channel_id, replies::GITHUB_ME_COMMAND).await?;

    Ok(Some(response.text))
}
