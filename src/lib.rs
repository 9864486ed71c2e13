//! Library root for `tally-bot`.
//!
//! Tally-bot is a small Mattermost bot designed to:
//! - Watch a single channel over the platform's websocket event stream
//! - Answer liveness pings ("alive", "up", "running", "hello") with a canned reply
//! - Answer "github" with the caller's linked GitHub username
//! - Announce itself when it starts and stops
//!
//! The bot integrates with Mattermost for chat and GitHub as its code host.
//! Each integration sits behind a trait so the dispatch loop can be tested
//! against fakes.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the tally-bot runtime:
/// - Initializes the crypto provider
/// - Bootstraps the session against the platform (fatal on failure)
/// - Serves events until interrupted, then shuts down gracefully
pub async fn start(config: Config) -> Void {
    info!("Starting tally-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
