//! Graceful shutdown: stop the listener, say goodbye, return.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::base::replies;

use super::Runtime;

/// How long the listener gets to finish its current event and close the stream.
const LISTENER_GRACE: Duration = Duration::from_secs(5);

/// Owns the listener's cancellation and join handle.
///
/// `shutdown` consumes the controller, so the sequence can only run once.
pub struct ShutdownController {
    cancel: CancellationToken,
    listener: Option<JoinHandle<()>>,
}

impl ShutdownController {
    /// `listener` is `None` when the event stream never connected.
    pub fn new(cancel: CancellationToken, listener: Option<JoinHandle<()>>) -> Self {
        Self { cancel, listener }
    }

    /// Cancels and joins the listener, then posts the farewell message.
    ///
    /// A failed farewell is logged; shutdown still completes.
    #[instrument(name = "ShutdownController::shutdown", skip_all)]
    pub async fn shutdown(self, runtime: &Runtime) {
        info!("Shutting down ...");

        self.cancel.cancel();

        if let Some(mut listener) = self.listener {
            match tokio::time::timeout(LISTENER_GRACE, &mut listener).await {
                Ok(Ok(())) => debug!("Listener joined."),
                Ok(Err(err)) => error!("Listener task failed: {err}"),
                Err(_) => {
                    warn!("Listener did not stop within {LISTENER_GRACE:?}; aborting it.");
                    listener.abort();
                }
            }
        }

        runtime.announce(&replies::stopped(&runtime.config.display_name)).await;

        info!("Shutdown complete.");
    }
}

/// Resolves on the first interrupt signal.
pub async fn wait_for_interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received interrupt."),
        Err(err) => {
            // Without a signal handler there is nothing to wait for; keep serving.
            error!("Failed to listen for interrupts: {err}");
            std::future::pending::<()>().await
        }
    }
}
