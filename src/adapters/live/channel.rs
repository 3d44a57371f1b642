//! Live adapter for the `ChannelGateway` port using the Discord REST API.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::model::{ChannelRef, ChatMessage, DeleteOutcome, MessageId};
use crate::ports::channel::ChannelGateway;
use crate::ports::{PortError, PortFuture};
use crate::present::Summary;

const USER_AGENT: &str =
    concat!("DiscordBot (https://example.com/issue-mirror, ", env!("CARGO_PKG_VERSION"), ")");

/// Messages requested per history poll.
pub const HISTORY_LIMIT: u32 = 50;

/// Posts summaries as Discord embeds through a bot token.
pub struct DiscordGateway {
    client: Client,
    api_base: String,
    token: String,
}

impl DiscordGateway {
    /// Creates a gateway against the API at `api_base`.
    #[must_use]
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.api_base))
            .header("Authorization", format!("Bot {}", self.token))
            .header("User-Agent", USER_AGENT)
    }

    async fn create_message(
        &self,
        channel_id: &str,
        body: &CreateMessage,
    ) -> Result<MessageId, PortError> {
        let path = format!("/channels/{channel_id}/messages");
        let response =
            send(self.request(reqwest::Method::POST, &path).json(body), "create message").await?;
        let response = ensure_success(response, "create message").await?;
        let message: DiscordMessage = response
            .json()
            .await
            .map_err(|e| -> PortError { format!("Failed to parse Discord message: {e}").into() })?;
        Ok(MessageId::new(message.id))
    }
}

#[derive(Serialize)]
struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<Embed>,
}

#[derive(Serialize)]
struct Embed {
    title: String,
    url: String,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    fields: Vec<EmbedField>,
}

#[derive(Serialize)]
struct EmbedField {
    name: &'static str,
    value: String,
    inline: bool,
}

impl From<&Summary> for Embed {
    fn from(summary: &Summary) -> Self {
        let mut fields = vec![
            EmbedField { name: "Author", value: summary.author.clone(), inline: true },
            EmbedField { name: "Created", value: summary.created_date.clone(), inline: true },
        ];
        if let Some(labels) = summary.labels_display() {
            fields.push(EmbedField { name: "Labels", value: labels, inline: true });
        }
        Self {
            title: summary.title.clone(),
            url: summary.url.clone(),
            color: summary.color,
            description: Some(summary.short_body.clone()).filter(|b| !b.is_empty()),
            fields,
        }
    }
}

#[derive(Deserialize)]
struct DiscordChannel {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct DiscordMessage {
    id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: Option<DiscordUser>,
}

#[derive(Deserialize)]
struct DiscordUser {
    username: String,
    #[serde(default)]
    bot: bool,
}

#[derive(Deserialize)]
struct DiscordError {
    message: String,
}

async fn send(request: RequestBuilder, action: &str) -> Result<Response, PortError> {
    request.send().await.map_err(|e| format!("Discord {action} request failed: {e}").into())
}

async fn ensure_success(response: Response, action: &str) -> Result<Response, PortError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<DiscordError>(&body).map(|e| e.message).unwrap_or(body);
    Err(format!("Discord {action} failed ({}): {msg}", status.as_u16()).into())
}

impl ChannelGateway for DiscordGateway {
    fn lookup_channel(&self, channel_id: &str) -> PortFuture<'_, Option<ChannelRef>> {
        let channel_id = channel_id.to_string();
        Box::pin(async move {
            let response = send(
                self.request(reqwest::Method::GET, &format!("/channels/{channel_id}")),
                "channel lookup",
            )
            .await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let response = ensure_success(response, "channel lookup").await?;
            let channel: DiscordChannel = response.json().await.map_err(|e| -> PortError {
                format!("Failed to parse Discord channel: {e}").into()
            })?;
            Ok(Some(ChannelRef { id: channel.id, name: channel.name }))
        })
    }

    fn post(&self, channel: &ChannelRef, summary: &Summary) -> PortFuture<'_, MessageId> {
        let channel_id = channel.id.clone();
        let body = CreateMessage { content: None, embeds: vec![Embed::from(summary)] };
        Box::pin(async move { self.create_message(&channel_id, &body).await })
    }

    fn delete(
        &self,
        channel: &ChannelRef,
        message_id: &MessageId,
    ) -> PortFuture<'_, DeleteOutcome> {
        let path = format!("/channels/{}/messages/{message_id}", channel.id);
        Box::pin(async move {
            let response =
                send(self.request(reqwest::Method::DELETE, &path), "delete message").await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(DeleteOutcome::NotFound);
            }
            ensure_success(response, "delete message").await?;
            Ok(DeleteOutcome::Deleted)
        })
    }

    fn send_text(&self, channel: &ChannelRef, text: &str) -> PortFuture<'_, MessageId> {
        let channel_id = channel.id.clone();
        let body = CreateMessage { content: Some(text.to_string()), embeds: Vec::new() };
        Box::pin(async move { self.create_message(&channel_id, &body).await })
    }

    fn fetch_since(
        &self,
        channel: &ChannelRef,
        after: Option<&MessageId>,
    ) -> PortFuture<'_, Vec<ChatMessage>> {
        let mut path = format!("/channels/{}/messages?limit={HISTORY_LIMIT}", channel.id);
        if let Some(after) = after {
            path.push_str(&format!("&after={after}"));
        }
        Box::pin(async move {
            let response =
                send(self.request(reqwest::Method::GET, &path), "message history").await?;
            let response = ensure_success(response, "message history").await?;
            let messages: Vec<DiscordMessage> = response.json().await.map_err(|e| -> PortError {
                format!("Failed to parse Discord message history: {e}").into()
            })?;

            // Discord returns newest first.
            Ok(messages
                .into_iter()
                .rev()
                .map(|m| {
                    let (author, author_is_bot) =
                        m.author.map_or((String::new(), false), |a| (a.username, a.bot));
                    ChatMessage {
                        id: MessageId::new(m.id),
                        author,
                        author_is_bot,
                        content: m.content,
                    }
                })
                .collect())
        })
    }
}
