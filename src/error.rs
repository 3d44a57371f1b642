//! Error type for the mirror core.

use thiserror::Error;

use crate::model::ItemType;

/// Everything that can go wrong above the port layer.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tracker could not list open items.
    #[error("failed to fetch open {item_type}: {message}")]
    Fetch {
        /// Item type being fetched.
        item_type: ItemType,
        /// Underlying error.
        message: String,
    },

    /// The chat platform failed while resolving a channel.
    #[error("failed to look up channel {channel_id}: {message}")]
    ChannelLookup {
        /// Configured channel id.
        channel_id: String,
        /// Underlying error.
        message: String,
    },

    /// A configured channel does not exist or is not visible.
    #[error("could not find channel {channel_id}")]
    ChannelMissing {
        /// Configured channel id.
        channel_id: String,
    },

    /// Reading or writing the tracking state failed.
    #[error("tracking state: {0}")]
    Store(String),

    /// An operator reply could not be delivered.
    #[error("failed to reply in channel {channel_id}: {message}")]
    Reply {
        /// Command channel id.
        channel_id: String,
        /// Underlying error.
        message: String,
    },
}
