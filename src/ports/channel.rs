//! Channel gateway port: the chat platform's message surface.

use super::PortFuture;
use crate::model::{ChannelRef, ChatMessage, DeleteOutcome, MessageId};
use crate::present::Summary;

/// Posts, deletes, and reads messages in chat channels.
pub trait ChannelGateway: Send + Sync {
    /// Resolves a configured channel id. `Ok(None)` means the platform does
    /// not know the channel (or the bot cannot see it).
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn lookup_channel(&self, channel_id: &str) -> PortFuture<'_, Option<ChannelRef>>;

    /// Posts an item summary and returns the new message id.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be posted.
    fn post(&self, channel: &ChannelRef, summary: &Summary) -> PortFuture<'_, MessageId>;

    /// Deletes a message. A message that is already gone is
    /// [`DeleteOutcome::NotFound`], not an error.
    ///
    /// # Errors
    ///
    /// Returns an error for any other failure.
    fn delete(&self, channel: &ChannelRef, message_id: &MessageId) -> PortFuture<'_, DeleteOutcome>;

    /// Posts plain text, used for operator command replies.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be posted.
    fn send_text(&self, channel: &ChannelRef, text: &str) -> PortFuture<'_, MessageId>;

    /// Returns messages posted after `after` (or the most recent ones when
    /// `None`), oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel history cannot be read.
    fn fetch_since(
        &self,
        channel: &ChannelRef,
        after: Option<&MessageId>,
    ) -> PortFuture<'_, Vec<ChatMessage>>;
}
