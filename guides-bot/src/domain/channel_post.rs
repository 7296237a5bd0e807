use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelName(String);

impl ChannelName {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().trim_start_matches('@').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, username: &str) -> bool {
        self.0
            .eq_ignore_ascii_case(username.trim().trim_start_matches('@'))
    }

    pub fn post_link(&self, message_id: i64) -> String {
        format!("https://t.me/{}/{}", self.0, message_id)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostContent {
    Text(String),
    Poll,
    /// Forwarded from another chat, with whatever text came along.
    Forward { text: Option<String> },
    /// Stickers, captionless media and anything else without text.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPost {
    pub message_id: i64,
    pub chat_username: Option<String>,
    pub date: DateTime<Utc>,
    pub content: PostContent,
}

impl ChannelPost {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            PostContent::Text(text) => Some(text),
            PostContent::Forward { text } => text.as_deref(),
            PostContent::Poll | PostContent::Other => None,
        }
    }

    pub fn is_from(&self, channel: &ChannelName) -> bool {
        self.chat_username
            .as_deref()
            .is_some_and(|username| channel.matches(username))
    }
}
