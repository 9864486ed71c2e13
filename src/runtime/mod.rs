//! Runtime services and shared state for the tally-bot.

pub mod bootstrap;
pub mod shutdown;

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{BotIdentity, MonitoredChannel, OutboundReply, Team, Void},
    },
    interaction::{classify::KeywordPolicy, dispatch::Dispatcher},
    service::{code_host::CodeHostClient, platform::PlatformClient, stream::EventStream},
};

use shutdown::ShutdownController;

/// Runtime service context that can be shared across the application.
///
/// This struct holds the clients and the identities resolved during bootstrap.
/// Everything in it is written once, before any event is read, and only read afterwards.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat platform client instance.
    pub platform: PlatformClient,
    /// The code-host client instance.
    pub code_host: CodeHostClient,
    /// The account the bot posts as.
    pub bot: BotIdentity,
    /// The team the monitored channel belongs to.
    pub team: Team,
    /// The only channel the bot listens to and replies in.
    pub channel: MonitoredChannel,
}

impl Runtime {
    /// Connects the event stream and serves until the process is interrupted.
    ///
    /// A failed connection is logged and the bot keeps running without events.
    pub async fn start(&self) -> Void {
        let stream = match EventStream::mattermost(&self.config).await {
            Ok(stream) => Some(stream),
            Err(err) => {
                error!("We failed to connect to the event stream: {err}");
                None
            }
        };

        self.serve(stream, KeywordPolicy::standard()?, shutdown::wait_for_interrupt()).await
    }

    /// Dispatches events from `stream` until `shutdown` resolves, then runs the shutdown sequence.
    #[instrument(skip_all)]
    pub async fn serve<S>(&self, stream: Option<EventStream>, policy: KeywordPolicy, shutdown: S) -> Void
    where
        S: Future<Output = ()>,
    {
        let cancel = CancellationToken::new();

        let listener = stream.map(|stream| {
            let dispatcher = Dispatcher::new(self, policy);
            tokio::spawn(listen(stream, dispatcher, cancel.clone()))
        });

        let controller = ShutdownController::new(cancel, listener);

        shutdown.await;
        controller.shutdown(self).await;

        Ok(())
    }

    /// Posts a top-level message into the monitored channel, logging any failure.
    pub async fn announce(&self, text: &str) -> bool {
        match self.platform.create_post(&OutboundReply::new(&self.channel.id, text)).await {
            Ok(_) => true,
            Err(err) => {
                error!("We failed to send a message to the logging channel: {err}");
                false
            }
        }
    }
}

/// Reads events one at a time and dispatches each to completion before reading the next.
///
/// Cancellation is only observed between events, so an in-flight reply is never cut short
/// and the stream is closed after the last read has returned.
#[instrument(skip_all)]
pub async fn listen(mut stream: EventStream, dispatcher: Dispatcher, cancel: CancellationToken) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Listener cancelled.");
                break;
            }
            next = stream.next_event() => next,
        };

        match next {
            Some(Ok(event)) => {
                let outcome = dispatcher.dispatch(event).await;
                debug!(?outcome, "Event handled.");
            }
            Some(Err(err)) => warn!("Dropping unreadable event: {err}"),
            None => {
                warn!("The event stream ended; no further events will be received.");
                break;
            }
        }
    }

    if let Err(err) = stream.close().await {
        warn!("Failed to close the event stream: {err}");
    }

    info!("Listener stopped.");
}
