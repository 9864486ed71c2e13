//! Startup sequence: every step must succeed before any event is read.

use anyhow::Context;
use tracing::{info, instrument, warn};

use crate::{
    base::{
        config::Config,
        replies,
        types::{BotIdentity, ChannelVisibility, MonitoredChannel, NewChannel, Res, Team},
    },
    service::{code_host::CodeHostClient, platform::PlatformClient},
};

use super::Runtime;

/// Page size for bot listing.
const BOT_PAGE_SIZE: u32 = 100;

impl Runtime {
    /// Create a new runtime instance against the configured Mattermost and GitHub endpoints.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        let platform = PlatformClient::mattermost(&config)?;
        let code_host = CodeHostClient::github(&config)?;

        Self::bootstrap(config, platform, code_host).await
    }

    /// Resolves the bot, team, and monitored channel, then announces startup.
    ///
    /// Any failure here is fatal. The code-host client is not exercised; a bad
    /// token surfaces on first use.
    #[instrument(skip_all)]
    pub async fn bootstrap(config: Config, platform: PlatformClient, code_host: CodeHostClient) -> Res<Self> {
        let version = platform
            .get_server_version()
            .await
            .context("There was a problem pinging the Mattermost server. Are you sure it's running?")?;
        info!("Server detected and is running version {version}");

        let bot = find_bot(&platform, &config.bot_name).await?;
        info!(bot_id = %bot.id, "Running as bot `{}`.", bot.username);

        let team = platform
            .get_team_by_name(&config.team_name)
            .await
            .with_context(|| format!("We failed to get the team `{}`, or we do not appear to be a member of it.", config.team_name))?;

        let channel = ensure_channel(&platform, &config, &team).await?;

        let runtime = Self {
            config,
            platform,
            code_host,
            bot,
            team,
            channel,
        };

        runtime.announce(&replies::started(&runtime.config.display_name)).await;

        Ok(runtime)
    }
}

/// Finds the bot account whose username is `name`.
async fn find_bot(platform: &PlatformClient, name: &str) -> Res<BotIdentity> {
    let mut page = 0;

    loop {
        let bots = platform
            .get_bots(page, BOT_PAGE_SIZE)
            .await
            .context("There was a problem retrieving the list of bots.")?;

        let exhausted = bots.len() < BOT_PAGE_SIZE as usize;

        if let Some(bot) = bots.into_iter().find(|b| b.username == name) {
            return Ok(bot.into());
        }

        if exhausted {
            return Err(anyhow::anyhow!("Could not find the bot `{name}`. Has the bot account been created?"));
        }

        page += 1;
    }
}

/// Looks up the monitored channel in `team`, creating it on first run.
async fn ensure_channel(platform: &PlatformClient, config: &Config, team: &Team) -> Res<MonitoredChannel> {
    match platform.get_channel_by_name(&team.id, &config.channel_name).await {
        Ok(channel) => {
            info!(channel_id = %channel.id, "Found channel `{}`.", config.channel_name);
            return Ok(channel);
        }
        Err(err) => warn!("We failed to get the channel `{}`: {err}", config.channel_name),
    }

    let new_channel = NewChannel {
        team_id: team.id.clone(),
        name: config.channel_name.clone(),
        display_name: config.channel_display_name.clone(),
        purpose: config.channel_purpose.clone(),
        visibility: ChannelVisibility::Open,
    };

    let channel = platform
        .create_channel(&new_channel)
        .await
        .with_context(|| format!("We failed to create the channel `{}`.", config.channel_name))?;

    info!(channel_id = %channel.id, "Looks like this might be the first run so we've created the channel `{}`.", config.channel_name);

    Ok(channel)
}
