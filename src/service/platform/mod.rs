pub mod mattermost;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{Bot, Channel, Command, CommandResponse, NewChannel, OutboundReply, Post, Res, Team};

// Traits.

/// Generic "platform" trait that chat platform clients must implement.
///
/// This trait covers the REST calls the bot makes against the chat platform.
/// Implementing it allows the session and dispatcher to run against a fake
/// platform in tests.
#[async_trait]
pub trait GenericPlatformClient: Send + Sync + 'static {
    /// Probe the server and return the version it reports.
    async fn get_server_version(&self) -> Res<String>;

    /// List one page of bot accounts.
    async fn get_bots(&self, page: u32, per_page: u32) -> Res<Vec<Bot>>;

    /// Look up a team by its name.
    async fn get_team_by_name(&self, name: &str) -> Res<Team>;

    /// Look up a channel by its name within a team.
    async fn get_channel_by_name(&self, team_id: &str, name: &str) -> Res<Channel>;

    /// Create a channel.
    async fn create_channel(&self, channel: &NewChannel) -> Res<Channel>;

    /// Post a message, optionally threaded under another post.
    async fn create_post(&self, reply: &OutboundReply) -> Res<Post>;

    /// List the slash commands available to a team.
    async fn list_autocomplete_commands(&self, team_id: &str) -> Res<Vec<Command>>;

    /// Execute a slash command line in a channel and return its response.
    async fn execute_command(&self, channel_id: &str, command: &str) -> Res<CommandResponse>;
}

// Structs.

/// Platform client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<dyn GenericPlatformClient>,
}

impl Deref for PlatformClient {
    type Target = dyn GenericPlatformClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl PlatformClient {
    pub fn new(inner: Arc<dyn GenericPlatformClient>) -> Self {
        Self { inner }
    }
}
