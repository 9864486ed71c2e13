//! Real-time event feed from the chat platform.
//!
//! The feed is a single long-lived subscription. Frames are decoded into typed
//! `InboundEvent`s here so the dispatcher never sees the platform's loose JSON.

pub mod mattermost;

use std::ops::{Deref, DerefMut};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::base::types::{EventKind, InboundEvent, Post, Res, Void};

// Traits.

/// Generic event stream trait that platform feeds must implement.
#[async_trait]
pub trait GenericEventStream: Send + 'static {
    /// Waits for the next event.
    ///
    /// `None` means the feed has ended and will not produce more events. A
    /// `Some(Err(_))` is a single bad frame or a transport failure; callers log it
    /// and keep reading.
    async fn next_event(&mut self) -> Option<Res<InboundEvent>>;

    /// Closes the connection. Safe to call more than once.
    async fn close(&mut self) -> Void;
}

// Structs.

/// Event stream for the application.
///
/// Unlike the REST clients this is owned by exactly one task, so it is boxed rather than shared.
pub struct EventStream {
    inner: Box<dyn GenericEventStream>,
}

impl Deref for EventStream {
    type Target = dyn GenericEventStream;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DerefMut for EventStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.inner
    }
}

impl EventStream {
    pub fn new(inner: Box<dyn GenericEventStream>) -> Self {
        Self { inner }
    }
}

// Decoding.

#[derive(Debug, Deserialize)]
struct RawEvent {
    /// Absent on replies to actions the client sent (e.g. the auth challenge).
    event: Option<String>,
    data: Option<Map<String, Value>>,
    broadcast: Option<RawBroadcast>,
}

#[derive(Debug, Deserialize)]
struct RawBroadcast {
    #[serde(default)]
    channel_id: String,
}

/// Decodes one websocket text frame.
///
/// Returns `Ok(None)` for frames that are not events.
pub fn decode_event(text: &str) -> Res<Option<InboundEvent>> {
    let raw: RawEvent = serde_json::from_str(text).context("Failed to parse event frame")?;

    let Some(kind) = raw.event else {
        return Ok(None);
    };

    let data = raw.data.unwrap_or_default();
    let channel_id = raw.broadcast.map(|b| b.channel_id).unwrap_or_default();

    let kind = match kind.as_str() {
        "posted" => {
            // The post is embedded as a JSON string, not an object.
            let post = data.get("post").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("Posted event is missing its post"))?;
            let post: Post = serde_json::from_str(post).context("Failed to parse posted event's post")?;

            EventKind::Posted(post)
        }
        "hello" => EventKind::Hello {
            server_version: data.get("server_version").and_then(Value::as_str).unwrap_or_default().to_string(),
        },
        _ => EventKind::Other(kind),
    };

    Ok(Some(InboundEvent { channel_id, kind }))
}

// Tests.
