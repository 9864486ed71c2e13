//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the tally-bot:
//! - The chat platform's REST API (e.g., Mattermost)
//! - The chat platform's real-time event stream
//! - The code-host API (e.g., GitHub)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod code_host;
pub mod platform;
pub mod stream;
