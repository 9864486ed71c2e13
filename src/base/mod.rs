//! Core components, types, and utilities for the tally-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Canned replies and announcements.
//! - Common types and result handling.

pub mod config;
pub mod replies;
pub mod types;
