//! Canned text the bot posts.

/// Reply to any of the liveness keywords.
pub const RUNNING: &str = "Yes I'm running";

/// Reply when no keyword matched.
pub const NOT_UNDERSTOOD: &str = "I did not understand you!";

/// Reply when the username lookup could not produce a name.
pub const USERNAME_LOOKUP_FAILED: &str = "Failed to get GitHub username";

/// Display name of the slash command the platform's GitHub plugin registers.
pub const GITHUB_COMMAND_NAME: &str = "github";

/// Command line executed to ask the GitHub plugin for the caller's linked account.
pub const GITHUB_ME_COMMAND: &str = "/github me";

/// Announcement posted once the session is ready.
pub fn started(display_name: &str) -> String {
    format!("_{display_name} has **started** running_")
}

/// Announcement posted on shutdown.
pub fn stopped(display_name: &str) -> String {
    format!("_{display_name} has **stopped** running_")
}
