//! Domain types shared by the tracker, the channel gateway, and the reconciler.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The two kinds of tracked items. Each kind has its own destination channel,
/// its own remote endpoint, and its own number namespace in the state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// A repository issue (pull requests excluded).
    Issue,
    /// A repository pull request.
    PullRequest,
}

impl ItemType {
    /// Both item types in reconciliation order.
    pub const ALL: [Self; 2] = [Self::Issue, Self::PullRequest];

    /// Singular noun used in log lines and messages.
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull request",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Issue => "issues",
            Self::PullRequest => "pull requests",
        })
    }
}

/// An open item as reported by the remote tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Repository-scoped item number (`#42`).
    pub number: u64,
    /// Item title.
    pub title: String,
    /// Browser URL of the item.
    pub url: String,
    /// Markdown body, absent when the author left it empty.
    pub body: Option<String>,
    /// Login of the author.
    pub author: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Label names in the order the tracker returned them.
    pub labels: Vec<String>,
}

/// Opaque handle to a message posted in a channel.
///
/// Discord message ids are decimal snowflakes; the state file has always
/// stored them as JSON numbers, so decimal ids serialize as numbers and
/// anything else as a string. Both forms deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(String);

impl MessageId {
    /// Wraps a raw message id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_number(&self) -> Option<u64> {
        self.0.parse::<u64>().ok().filter(|n| n.to_string() == self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// A resolved destination channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Platform channel id.
    pub id: String,
    /// Display name, when the platform reports one.
    pub name: Option<String>,
}

/// Result of asking the channel to delete a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The message existed and was removed.
    Deleted,
    /// The message was already gone.
    NotFound,
}

/// A message read back from a channel (operator command polling).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message id, usable as a polling cursor.
    pub id: MessageId,
    /// Author display name.
    pub author: String,
    /// Whether the author is a bot account.
    pub author_is_bot: bool,
    /// Raw text content.
    pub content: String,
}
