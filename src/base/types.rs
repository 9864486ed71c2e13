//! Shared types for the bot: result aliases, platform entities, and stream events.

use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

// Platform entities.

/// A bot account as returned by the platform's bot listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bot {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

/// The identity the bot operates as.
///
/// Posts authored by this identity are never treated as input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub username: String,
}

impl From<Bot> for BotIdentity {
    fn from(bot: Bot) -> Self {
        Self { id: bot.user_id, username: bot.username }
    }
}

/// A team the bot is a member of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
}

/// Channel visibility, serialized the way the platform encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChannelVisibility {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

/// A channel as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub team_id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(rename = "type", default)]
    pub visibility: ChannelVisibility,
}

/// The single channel the bot listens to and replies in.
pub type MonitoredChannel = Channel;

/// Request body for creating a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChannel {
    pub team_id: String,
    pub name: String,
    pub display_name: String,
    pub purpose: String,
    #[serde(rename = "type")]
    pub visibility: ChannelVisibility,
}

/// A post, either delivered over the event stream or returned by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub root_id: String,
}

/// A reply the dispatcher (or the session) sends into the monitored channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundReply {
    pub channel_id: String,
    pub message: String,
    /// Threads the reply under this post when set.
    #[serde(rename = "root_id", skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

impl OutboundReply {
    /// A top-level message in the channel.
    pub fn new(channel_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            message: message.into(),
            in_reply_to: None,
        }
    }

    /// A reply threaded under `post_id`.
    pub fn threaded(channel_id: impl Into<String>, message: impl Into<String>, post_id: impl Into<String>) -> Self {
        Self {
            in_reply_to: Some(post_id.into()),
            ..Self::new(channel_id, message)
        }
    }
}

/// An autocomplete (slash) command registered for a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    pub display_name: String,
}

/// The result of executing a slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CommandResponse {
    #[serde(default)]
    pub text: String,
}

// Stream events.

/// One event delivered over the platform's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Channel the platform broadcast the event to (empty when not channel-scoped).
    pub channel_id: String,
    pub kind: EventKind,
}

/// The kinds of events the bot distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A message was posted.
    Posted(Post),
    /// The server greeted the connection.
    Hello { server_version: String },
    /// Anything else, tagged with the platform's kind name.
    Other(String),
}

impl EventKind {
    pub fn name(&self) -> &str {
        match self {
            EventKind::Posted(_) => "posted",
            EventKind::Hello { .. } => "hello",
            EventKind::Other(kind) => kind,
        }
    }
}
