//! Keyword classification of incoming messages.
//!
//! A policy is an ordered list of rules; the first rule whose keyword appears
//! in the message as a standalone word decides the reply.

use regex::Regex;

use crate::base::{
    replies,
    types::{Res, Void},
};

/// What to answer when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyAction {
    /// Post fixed text.
    Canned(String),
    /// Post the result of the username lookup.
    UsernameLookup,
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification<'a> {
    /// A rule matched.
    Matched { keyword: &'a str, action: &'a ReplyAction },
    /// Nothing matched; the fallback text applies.
    Unrecognized { fallback: &'a str },
}

#[derive(Debug, Clone)]
struct KeywordRule {
    keyword: String,
    pattern: Regex,
    action: ReplyAction,
}

/// Ordered, first-match-wins keyword rules plus a fallback reply.
#[derive(Debug, Clone)]
pub struct KeywordPolicy {
    rules: Vec<KeywordRule>,
    fallback: String,
}

impl KeywordPolicy {
    /// An empty policy that answers everything with `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self { rules: Vec::new(), fallback: fallback.into() }
    }

    /// The bot's stock rules.
    pub fn standard() -> Res<Self> {
        Self::new(replies::NOT_UNDERSTOOD)
            .with_rule("alive", ReplyAction::Canned(replies::RUNNING.to_string()))?
            .with_rule("up", ReplyAction::Canned(replies::RUNNING.to_string()))?
            .with_rule("running", ReplyAction::Canned(replies::RUNNING.to_string()))?
            .with_rule("hello", ReplyAction::Canned(replies::RUNNING.to_string()))?
            .with_rule("github", ReplyAction::UsernameLookup)
    }

    /// Appends a rule; it is tested after every rule added before it.
    pub fn with_rule(mut self, keyword: &str, action: ReplyAction) -> Res<Self> {
        self.push_rule(keyword, action)?;
        Ok(self)
    }

    /// Appends a rule in place.
    pub fn push_rule(&mut self, keyword: &str, action: ReplyAction) -> Void {
        if keyword.is_empty() {
            return Err(anyhow::anyhow!("Keywords must not be empty."));
        }

        self.rules.push(KeywordRule {
            keyword: keyword.to_string(),
            pattern: word_pattern(keyword)?,
            action,
        });

        Ok(())
    }

    /// Keywords in the order they are tested.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.keyword.as_str())
    }

    pub fn classify(&self, text: &str) -> Classification<'_> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(text))
            .map(|rule| Classification::Matched {
                keyword: &rule.keyword,
                action: &rule.action,
            })
            .unwrap_or(Classification::Unrecognized { fallback: &self.fallback })
    }
}

/// Case-sensitive match of `keyword` bounded by the text edges or non-word ASCII characters.
///
/// Word characters are `[0-9A-Za-z_]` only, so a keyword next to an accented letter still counts as standalone.
fn word_pattern(keyword: &str) -> Res<Regex> {
    Ok(Regex::new(&format!(r"(?:^|[^0-9A-Za-z_]){}(?:$|[^0-9A-Za-z_])", regex::escape(keyword)))?)
}

// Tests.
