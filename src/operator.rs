//! Operator commands typed into the command channel.

use std::fmt;

use tracing::{info, warn};

use crate::error::MirrorError;
use crate::model::{ChannelRef, ChatMessage};
use crate::service::MirrorService;

/// Prefix marking a chat message as a command.
pub const COMMAND_PREFIX: char = '!';

/// First reply to `refresh`.
pub const REFRESH_STARTED: &str = "Refreshing channels...";

/// Second reply to `refresh`, sent whether or not the pass had errors.
pub const REFRESH_DONE: &str = "Channels refreshed!";

/// Reply to `clear`.
pub const CLEARED: &str = "Cleared all tracking data!";

/// A recognised operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Report tracked counts and the repository.
    Status,
    /// Run a reconciliation pass now.
    Refresh,
    /// Forget every tracked item.
    Clear,
}

impl OperatorCommand {
    /// Parses `!name [args...]`. Anything else, including unknown names, is `None`.
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        let name = content.trim_start().strip_prefix(COMMAND_PREFIX)?.split_whitespace().next()?;
        match name {
            "status" => Some(Self::Status),
            "refresh" => Some(Self::Refresh),
            "clear_tracking" | "clear" => Some(Self::Clear),
            _ => None,
        }
    }

    /// Parses a chat message, ignoring messages written by bots.
    #[must_use]
    pub fn from_message(message: &ChatMessage) -> Option<Self> {
        if message.author_is_bot {
            return None;
        }
        Self::parse(&message.content)
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Status => "status",
            Self::Refresh => "refresh",
            Self::Clear => "clear_tracking",
        })
    }
}

/// Runs `command` and posts the replies to `channel`.
///
/// A failed refresh pass is logged, not returned: the operator still gets
/// both replies.
///
/// # Errors
///
/// Returns an error if the state file cannot be read or written, or a reply
/// cannot be sent.
pub async fn execute(
    service: &MirrorService,
    command: OperatorCommand,
    channel: &ChannelRef,
) -> Result<(), MirrorError> {
    info!(%command, channel = %channel.id, "operator command");
    match command {
        OperatorCommand::Status => {
            let status = service.status()?;
            reply(service, channel, &status.render()).await
        }
        OperatorCommand::Refresh => {
            reply(service, channel, REFRESH_STARTED).await?;
            if let Err(e) = service.refresh().await {
                warn!(error = %e, "manual refresh failed");
            }
            reply(service, channel, REFRESH_DONE).await
        }
        OperatorCommand::Clear => {
            service.clear().await?;
            reply(service, channel, CLEARED).await
        }
    }
}

async fn reply(
    service: &MirrorService,
    channel: &ChannelRef,
    text: &str,
) -> Result<(), MirrorError> {
    service
        .context()
        .channels
        .send_text(channel, text)
        .await
        .map(|_| ())
        .map_err(|e| MirrorError::Reply { channel_id: channel.id.clone(), message: e.to_string() })
}
