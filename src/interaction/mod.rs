//! Event handling and user interactions for tally-bot.
//!
//! This module provides functionality for handling inbound events:
//! - Classifying message text against ordered keyword rules
//! - Resolving the GitHub username for the `github` keyword
//! - Dispatching each event to a threaded reply in the monitored channel

pub mod classify;
pub mod dispatch;
pub mod username;
