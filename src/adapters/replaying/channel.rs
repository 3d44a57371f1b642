//! Replaying adapter for the `ChannelGateway` port.

use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::model::{ChannelRef, ChatMessage, DeleteOutcome, MessageId};
use crate::ports::channel::ChannelGateway;
use crate::ports::PortFuture;
use crate::present::Summary;

/// Serves recorded chat platform responses from a cassette.
pub struct ReplayingChannelGateway {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingChannelGateway {
    /// Creates a replaying gateway backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn replay<T>(&self, method: &'static str) -> PortFuture<'_, T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let output = next_output(&self.replayer, "channel", method);
        Box::pin(async move { extract_result(&output, &format!("channel::{method}")) })
    }
}

impl ChannelGateway for ReplayingChannelGateway {
    fn lookup_channel(&self, _channel_id: &str) -> PortFuture<'_, Option<ChannelRef>> {
        self.replay("lookup_channel")
    }

    fn post(&self, _channel: &ChannelRef, _summary: &Summary) -> PortFuture<'_, MessageId> {
        self.replay("post")
    }

    fn delete(
        &self,
        _channel: &ChannelRef,
        _message_id: &MessageId,
    ) -> PortFuture<'_, DeleteOutcome> {
        self.replay("delete")
    }

    fn send_text(&self, _channel: &ChannelRef, _text: &str) -> PortFuture<'_, MessageId> {
        self.replay("send_text")
    }

    fn fetch_since(
        &self,
        _channel: &ChannelRef,
        _after: Option<&MessageId>,
    ) -> PortFuture<'_, Vec<ChatMessage>> {
        self.replay("fetch_since")
    }
}
