//! Per-event dispatch: filter, classify, reply.

use tracing::{error, info, instrument, trace};

use crate::{
    base::{
        config::UsernameLookup,
        types::{EventKind, InboundEvent, OutboundReply},
    },
    runtime::Runtime,
    service::{code_host::CodeHostClient, platform::PlatformClient},
};

use super::{
    classify::{Classification, KeywordPolicy, ReplyAction},
    username::lookup_username,
};

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event was broadcast to some other channel.
    ForeignChannel,
    /// The event was not a posted message.
    IgnoredKind,
    /// The bot wrote the message itself.
    OwnMessage,
    /// A reply was posted.
    Replied(OutboundReply),
    /// A reply was built but posting it failed.
    ReplyFailed(OutboundReply),
}

/// Turns posted messages in the monitored channel into threaded replies.
///
/// Events are handled one at a time by whoever owns the dispatcher; nothing here
/// is shared or mutated between events.
#[derive(Clone)]
pub struct Dispatcher {
    platform: PlatformClient,
    code_host: CodeHostClient,
    policy: KeywordPolicy,
    username_lookup: UsernameLookup,
    bot_id: String,
    team_id: String,
    channel_id: String,
}

impl Dispatcher {
    pub fn new(runtime: &Runtime, policy: KeywordPolicy) -> Self {
        Self {
            platform: runtime.platform.clone(),
            code_host: runtime.code_host.clone(),
            policy,
            username_lookup: runtime.config.username_lookup,
            bot_id: runtime.bot.id.clone(),
            team_id: runtime.team.id.clone(),
            channel_id: runtime.channel.id.clone(),
        }
    }

    /// Handles one event to completion. Never fails; reply errors are logged.
    #[instrument(name = "Dispatcher::dispatch", skip_all, fields(kind = event.kind.name(), channel_id = %event.channel_id))]
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        if event.channel_id != self.channel_id {
            trace!("Ignoring event from another channel.");
            return DispatchOutcome::ForeignChannel;
        }

        let EventKind::Posted(post) = event.kind else {
            trace!("Ignoring non-post event.");
            return DispatchOutcome::IgnoredKind;
        };

        if post.user_id == self.bot_id {
            trace!(post_id = %post.id, "Ignoring our own post.");
            return DispatchOutcome::OwnMessage;
        }

        info!(post_id = %post.id, "Responding to message in the monitored channel.");

        let message = self.reply_text(&post.message).await;
        let reply = OutboundReply::threaded(&self.channel_id, message, &post.id);

        match self.platform.create_post(&reply).await {
            Ok(_) => DispatchOutcome::Replied(reply),
            Err(err) => {
                error!(post_id = %post.id, "Failed to send reply: {err}");
                DispatchOutcome::ReplyFailed(reply)
            }
        }
    }

    async fn reply_text(&self, text: &str) -> String {
        match self.policy.classify(text) {
            Classification::Matched { action: ReplyAction::Canned(reply), .. } => reply.clone(),
            Classification::Matched { action: ReplyAction::UsernameLookup, .. } => {
                lookup_username(self.username_lookup, &self.platform, &self.code_host, &self.team_id, &self.channel_id).await
            }
            Classification::Unrecognized { fallback } => fallback.to_string(),
        }
    }
}
