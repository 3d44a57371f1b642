//! Turns a remote item into the summary posted to a channel.

use serde::{Deserialize, Serialize};

use crate::model::{ItemType, RemoteItem};

/// Bodies longer than this many characters are truncated.
pub const BODY_LIMIT: usize = 200;

/// Appended to a truncated body.
pub const ELLIPSIS: &str = "...";

/// At most this many labels are shown.
pub const LABEL_LIMIT: usize = 3;

/// Accent color for issue summaries.
pub const ISSUE_COLOR: u32 = 0x0028_a745;

/// Accent color for pull request summaries.
pub const PULL_REQUEST_COLOR: u32 = 0x0003_66d6;

/// Display-ready summary of one remote item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// `#<number>: <title>`.
    pub title: String,
    /// Link back to the item.
    pub url: String,
    /// Accent color (RGB).
    pub color: u32,
    /// Body cut to [`BODY_LIMIT`] characters, empty when absent.
    pub short_body: String,
    /// Author login.
    pub author: String,
    /// Creation date as `YYYY-MM-DD`.
    pub created_date: String,
    /// First [`LABEL_LIMIT`] labels.
    pub labels: Vec<String>,
}

impl Summary {
    /// Labels joined for display, or `None` when the item has no labels.
    #[must_use]
    pub fn labels_display(&self) -> Option<String> {
        if self.labels.is_empty() {
            None
        } else {
            Some(self.labels.join(", "))
        }
    }
}

/// Builds the summary posted for `item`.
#[must_use]
pub fn present(item: &RemoteItem, item_type: ItemType) -> Summary {
    Summary {
        title: format!("#{}: {}", item.number, item.title),
        url: item.url.clone(),
        color: color_for(item_type),
        short_body: item.body.as_deref().map(truncate_body).unwrap_or_default(),
        author: item.author.clone(),
        created_date: item.created_at.format("%Y-%m-%d").to_string(),
        labels: item.labels.iter().take(LABEL_LIMIT).cloned().collect(),
    }
}

/// Accent color used for an item type.
#[must_use]
pub fn color_for(item_type: ItemType) -> u32 {
    match item_type {
        ItemType::Issue => ISSUE_COLOR,
        ItemType::PullRequest => PULL_REQUEST_COLOR,
    }
}

/// Cuts `body` to [`BODY_LIMIT`] characters, appending [`ELLIPSIS`] when
/// anything was dropped. Counts characters, not bytes.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(BODY_LIMIT) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &body[..cut]),
        None => body.to_string(),
    }
}
