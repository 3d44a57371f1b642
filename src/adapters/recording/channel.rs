//! Recording adapter for the `ChannelGateway` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::model::{ChannelRef, ChatMessage, DeleteOutcome, MessageId};
use crate::ports::{ChannelGateway, PortFuture};
use crate::present::Summary;

/// Records chat platform interactions while delegating to an inner implementation.
pub struct RecordingChannelGateway {
    inner: Box<dyn ChannelGateway>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingChannelGateway {
    /// Creates a new recording gateway wrapping the given implementation.
    pub fn new(inner: Box<dyn ChannelGateway>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct LookupInput {
    channel_id: String,
}

#[derive(Serialize)]
struct PostInput {
    channel_id: String,
    summary: Summary,
}

#[derive(Serialize)]
struct DeleteInput {
    channel_id: String,
    message_id: MessageId,
}

#[derive(Serialize)]
struct TextInput {
    channel_id: String,
    text: String,
}

#[derive(Serialize)]
struct FetchInput {
    channel_id: String,
    after: Option<MessageId>,
}

impl ChannelGateway for RecordingChannelGateway {
    fn lookup_channel(&self, channel_id: &str) -> PortFuture<'_, Option<ChannelRef>> {
        let input = LookupInput { channel_id: channel_id.to_string() };
        let call = self.inner.lookup_channel(channel_id);
        Box::pin(async move {
            let result = call.await;
            record_result(&self.recorder, "channel", "lookup_channel", &input, &result);
            result
        })
    }

    fn post(&self, channel: &ChannelRef, summary: &Summary) -> PortFuture<'_, MessageId> {
        let input = PostInput { channel_id: channel.id.clone(), summary: summary.clone() };
        let call = self.inner.post(channel, summary);
        Box::pin(async move {
            let result = call.await;
            record_result(&self.recorder, "channel", "post", &input, &result);
            result
        })
    }

    fn delete(
        &self,
        channel: &ChannelRef,
        message_id: &MessageId,
    ) -> PortFuture<'_, DeleteOutcome> {
        let input = DeleteInput { channel_id: channel.id.clone(), message_id: message_id.clone() };
        let call = self.inner.delete(channel, message_id);
        Box::pin(async move {
            let result = call.await;
            record_result(&self.recorder, "channel", "delete", &input, &result);
            result
        })
    }

    fn send_text(&self, channel: &ChannelRef, text: &str) -> PortFuture<'_, MessageId> {
        let input = TextInput { channel_id: channel.id.clone(), text: text.to_string() };
        let call = self.inner.send_text(channel, text);
        Box::pin(async move {
            let result = call.await;
            record_result(&self.recorder, "channel", "send_text", &input, &result);
            result
        })
    }

    fn fetch_since(
        &self,
        channel: &ChannelRef,
        after: Option<&MessageId>,
    ) -> PortFuture<'_, Vec<ChatMessage>> {
        let input = FetchInput { channel_id: channel.id.clone(), after: after.cloned() };
        let call = self.inner.fetch_since(channel, after);
        Box::pin(async move {
            let result = call.await;
            record_result(&self.recorder, "channel", "fetch_since", &input, &result);
            result
        })
    }
}
