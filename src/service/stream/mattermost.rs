//! Mattermost websocket event feed.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, Message},
};
use tracing::{debug, info, instrument, trace};

use crate::base::{
    config::Config,
    types::{InboundEvent, Res, Void},
};

use super::{EventStream, GenericEventStream, decode_event};

// Type aliases.

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Extra methods on `EventStream` applied by the mattermost implementation.

impl EventStream {
    /// Connects to the Mattermost event feed.
    pub async fn mattermost(config: &Config) -> Res<Self> {
        let stream = MattermostEventStream::connect(config).await?;
        Ok(Self::new(Box::new(stream)))
    }
}

// Specific implementations.

/// Mattermost websocket stream.
pub struct MattermostEventStream {
    socket: Socket,
    closed: bool,
}

impl MattermostEventStream {
    /// Opens the socket and authenticates it with the same token the REST client uses.
    #[instrument(name = "MattermostEventStream::connect", skip_all)]
    pub async fn connect(config: &Config) -> Res<Self> {
        let url = format!("{}/api/v4/websocket", config.websocket_url.trim_end_matches('/'));

        let (mut socket, _) = connect_async(url.as_str()).await?;

        let challenge = json!({
            "seq": 1,
            "action": "authentication_challenge",
            "data": { "token": config.mattermost_secret },
        });
        socket.send(Message::Text(challenge.to_string().into())).await?;

        info!("Connected to event stream at {url}");

        Ok(Self { socket, closed: false })
    }
}

#[async_trait]
impl GenericEventStream for MattermostEventStream {
    async fn next_event(&mut self) -> Option<Res<InboundEvent>> {
        if self.closed {
            return None;
        }

        while let Some(message) = self.socket.next().await {
            match message {
                Ok(Message::Text(text)) => match decode_event(text.as_str()) {
                    Ok(Some(event)) => return Some(Ok(event)),
                    Ok(None) => trace!("Skipping action reply: {}", text.as_str()),
                    Err(err) => return Some(Err(err)),
                },
                Ok(Message::Close(frame)) => {
                    info!(?frame, "Event stream closed by the server.");
                    self.closed = true;
                    return None;
                }
                // Pings are answered by tungstenite; nothing else is expected.
                Ok(_) => {}
                Err(err) => {
                    self.closed = true;
                    return Some(Err(err.into()));
                }
            }
        }

        self.closed = true;
        None
    }

    async fn close(&mut self) -> Void {
        if self.closed {
            return Ok(());
        }

        self.closed = true;

        match self.socket.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                debug!("Event stream closed.");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
