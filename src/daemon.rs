//! Long-running mode: periodic reconciliation plus command channel polling.

use std::future::Future;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::model::{ChannelRef, MessageId};
use crate::operator::{self, OperatorCommand};
use crate::service::MirrorService;

/// Reads new messages from the command channel and runs the commands in them.
///
/// The first successful read only records the newest message, so commands
/// typed while the mirror was down are not replayed.
pub struct CommandPoller {
    channel_id: String,
    channel: Option<ChannelRef>,
    cursor: Option<MessageId>,
    primed: bool,
}

impl CommandPoller {
    /// Creates a poller for the channel with id `channel_id`.
    #[must_use]
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self { channel_id: channel_id.into(), channel: None, cursor: None, primed: false }
    }

    /// Newest message seen so far.
    #[must_use]
    pub fn cursor(&self) -> Option<&MessageId> {
        self.cursor.as_ref()
    }

    /// Polls once, returning the commands that were run.
    pub async fn poll(&mut self, service: &MirrorService) -> Vec<OperatorCommand> {
        let Some(channel) = self.resolve(service).await else {
            return Vec::new();
        };

        let fetched =
            service.context().channels.fetch_since(&channel, self.cursor.as_ref()).await;
        let messages = match fetched {
            Ok(messages) => messages,
            Err(e) => {
                warn!(error = %e, channel = %channel.id, "could not read command channel");
                return Vec::new();
            }
        };

        if let Some(last) = messages.last() {
            self.cursor = Some(last.id.clone());
        }
        if !self.primed {
            self.primed = true;
            debug!(cursor = ?self.cursor, "command channel primed");
            return Vec::new();
        }

        let mut executed = Vec::new();
        for message in &messages {
            let Some(command) = OperatorCommand::from_message(message) else { continue };
            if let Err(e) = operator::execute(service, command, &channel).await {
                error!(%command, error = %e, "operator command failed");
            }
            executed.push(command);
        }
        executed
    }

    async fn resolve(&mut self, service: &MirrorService) -> Option<ChannelRef> {
        if let Some(channel) = &self.channel {
            return Some(channel.clone());
        }
        match service.context().channels.lookup_channel(&self.channel_id).await {
            Ok(Some(channel)) => {
                self.channel = Some(channel.clone());
                Some(channel)
            }
            Ok(None) => {
                warn!(channel = %self.channel_id, "command channel not found");
                None
            }
            Err(e) => {
                warn!(channel = %self.channel_id, error = %e, "command channel lookup failed");
                None
            }
        }
    }
}

/// Runs passes every `config.interval` (the first one immediately) and polls
/// the command channel, until `shutdown` resolves.
///
/// Errors never stop the loop; an aborted pass is retried on the next tick.
/// Shutdown is only observed between passes.
pub async fn run_until<F>(service: &MirrorService, shutdown: F)
where
    F: Future<Output = ()>,
{
    let config = service.config();
    let mut passes = interval(config.interval);
    passes.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut commands = interval(config.command_poll);
    commands.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut poller = config.command_channel.as_deref().map(CommandPoller::new);

    info!(
        repository = %config.repository(),
        interval_secs = config.interval.as_secs(),
        commands = poller.is_some(),
        "mirror started"
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("shutdown requested");
                break;
            }

            _ = passes.tick() => {
                // Outcome already logged by the service.
                let _ = service.refresh().await;
            }

            _ = commands.tick(), if poller.is_some() => {
                if let Some(poller) = poller.as_mut() {
                    poller.poll(service).await;
                }
            }
        }
    }

    info!("mirror stopped");
}
