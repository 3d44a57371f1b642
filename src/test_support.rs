//! In-memory port implementations for unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use crate::context::ServiceContext;
use crate::model::{ChannelRef, ChatMessage, DeleteOutcome, ItemType, MessageId, RemoteItem};
use crate::ports::{ChannelGateway, FileLock, FileSystem, IssueSource, PortError, PortFuture};
use crate::present::Summary;

/// Builds an open item with predictable fields.
pub(crate) fn remote_item(number: u64) -> RemoteItem {
    RemoteItem {
        number,
        title: format!("Item {number}"),
        url: format!("https://github.com/acme/widgets/issues/{number}"),
        body: Some(format!("Body of item {number}")),
        author: "octocat".into(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        labels: vec!["bug".into()],
    }
}

/// Context with the given filesystem and empty tracker/channel fakes.
pub(crate) fn test_context(fs: MemFs) -> ServiceContext {
    ServiceContext::new(
        Box::new(fs),
        Box::new(FakeTracker::default()),
        Box::new(FakeChannel::default()),
    )
}

/// Context wired to the given fakes.
pub(crate) fn context_with(
    fs: &MemFs,
    tracker: &FakeTracker,
    channel: &FakeChannel,
) -> ServiceContext {
    ServiceContext::new(Box::new(fs.clone()), Box::new(tracker.clone()), Box::new(channel.clone()))
}

/// In-memory filesystem for testing without touching disk.
#[derive(Clone, Default)]
pub(crate) struct MemFs {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    locks: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Releases a [`MemFs`] lock on drop.
struct MemLock {
    locks: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl Drop for MemLock {
    fn drop(&mut self) {
        self.locks.lock().unwrap().remove(&self.path);
    }
}

impl MemFs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, path: impl AsRef<Path>, contents: &str) {
        self.files.lock().unwrap().insert(path.as_ref().to_path_buf(), contents.to_string());
    }

    pub(crate) fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub(crate) fn is_locked(&self, path: impl AsRef<Path>) -> bool {
        self.locks.lock().unwrap().contains(path.as_ref())
    }
}

impl FileSystem for MemFs {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        self.get(path).ok_or_else(|| format!("File not found: {}", path.display()).into())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        self.insert(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn try_lock(&self, path: &Path) -> Result<Option<FileLock>, PortError> {
        if !self.locks.lock().unwrap().insert(path.to_path_buf()) {
            return Ok(None);
        }
        Ok(Some(Box::new(MemLock { locks: Arc::clone(&self.locks), path: path.to_path_buf() })))
    }
}

#[derive(Default)]
struct TrackerState {
    listings: HashMap<ItemType, Result<Vec<RemoteItem>, String>>,
    calls: usize,
    in_flight: usize,
    max_in_flight: usize,
}

/// Scripted issue source. Unscripted item types have no open items.
#[derive(Clone, Default)]
pub(crate) struct FakeTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl FakeTracker {
    pub(crate) fn set_open(&self, item_type: ItemType, items: Vec<RemoteItem>) {
        self.state.lock().unwrap().listings.insert(item_type, Ok(items));
    }

    pub(crate) fn set_numbers(&self, item_type: ItemType, numbers: &[u64]) {
        self.set_open(item_type, numbers.iter().copied().map(remote_item).collect());
    }

    pub(crate) fn fail(&self, item_type: ItemType, message: &str) {
        self.state.lock().unwrap().listings.insert(item_type, Err(message.to_string()));
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

impl IssueSource for FakeTracker {
    fn fetch_open(&self, item_type: ItemType) -> PortFuture<'_, Vec<RemoteItem>> {
        Box::pin(async move {
            {
                let mut state = self.state.lock().unwrap();
                state.calls += 1;
                state.in_flight += 1;
                state.max_in_flight = state.max_in_flight.max(state.in_flight);
            }
            // Give a concurrent pass the chance to interleave.
            tokio::task::yield_now().await;
            let mut state = self.state.lock().unwrap();
            state.in_flight -= 1;
            match state.listings.get(&item_type) {
                Some(Ok(items)) => Ok(items.clone()),
                Some(Err(msg)) => Err(msg.clone().into()),
                None => Ok(Vec::new()),
            }
        })
    }
}

#[derive(Default)]
struct ChannelState {
    known: HashSet<String>,
    lookup_error: Option<String>,
    messages: BTreeMap<MessageId, String>,
    next_id: u64,
    posts: Vec<(String, Summary)>,
    delete_attempts: Vec<MessageId>,
    deleted: Vec<MessageId>,
    fail_posts: HashSet<u64>,
    fail_deletes: bool,
    texts: Vec<(String, String)>,
    inbox: Vec<ChatMessage>,
}

/// In-memory chat platform.
#[derive(Clone, Default)]
pub(crate) struct FakeChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl FakeChannel {
    pub(crate) fn with_channels(ids: &[&str]) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().known = ids.iter().map(|id| (*id).to_string()).collect();
        fake
    }

    /// A message that already exists in `channel_id`.
    pub(crate) fn seed_message(&self, channel_id: &str, id: &str) {
        self.state.lock().unwrap().messages.insert(MessageId::new(id), channel_id.to_string());
    }

    pub(crate) fn fail_lookup(&self, message: &str) {
        self.state.lock().unwrap().lookup_error = Some(message.to_string());
    }

    pub(crate) fn fail_post_for(&self, number: u64) {
        self.state.lock().unwrap().fail_posts.insert(number);
    }

    pub(crate) fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }

    pub(crate) fn push_inbox(&self, id: u64, author: &str, is_bot: bool, content: &str) {
        self.state.lock().unwrap().inbox.push(ChatMessage {
            id: MessageId::new(id.to_string()),
            author: author.to_string(),
            author_is_bot: is_bot,
            content: content.to_string(),
        });
    }

    /// Titles of successfully posted summaries, in order.
    pub(crate) fn posted_titles(&self) -> Vec<String> {
        self.state.lock().unwrap().posts.iter().map(|(_, s)| s.title.clone()).collect()
    }

    /// Posted summaries with the channel they went to.
    pub(crate) fn posts(&self) -> Vec<(String, Summary)> {
        self.state.lock().unwrap().posts.clone()
    }

    pub(crate) fn delete_attempts(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().delete_attempts.clone()
    }

    pub(crate) fn deleted(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.state.lock().unwrap().texts.iter().map(|(_, t)| t.clone()).collect()
    }
}

fn ready<T: Send + 'static>(result: Result<T, PortError>) -> PortFuture<'static, T> {
    Box::pin(async move { result })
}

impl ChannelGateway for FakeChannel {
    fn lookup_channel(&self, channel_id: &str) -> PortFuture<'_, Option<ChannelRef>> {
        let state = self.state.lock().unwrap();
        let result = match &state.lookup_error {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(state
                .known
                .contains(channel_id)
                .then(|| ChannelRef { id: channel_id.to_string(), name: None })),
        };
        ready(result)
    }

    fn post(&self, channel: &ChannelRef, summary: &Summary) -> PortFuture<'_, MessageId> {
        let mut state = self.state.lock().unwrap();
        let failing = state.fail_posts.iter().any(|n| summary.title.starts_with(&format!("#{n}:")));
        if failing {
            return ready(Err(format!("cannot post {}", summary.title).into()));
        }
        state.next_id += 1;
        let id = MessageId::new(format!("m-new-{}", state.next_id));
        state.messages.insert(id.clone(), channel.id.clone());
        state.posts.push((channel.id.clone(), summary.clone()));
        ready(Ok(id))
    }

    fn delete(
        &self,
        _channel: &ChannelRef,
        message_id: &MessageId,
    ) -> PortFuture<'_, DeleteOutcome> {
        let mut state = self.state.lock().unwrap();
        state.delete_attempts.push(message_id.clone());
        if state.fail_deletes {
            return ready(Err("Missing Permissions".into()));
        }
        let outcome = if state.messages.remove(message_id).is_some() {
            state.deleted.push(message_id.clone());
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        };
        ready(Ok(outcome))
    }

    fn send_text(&self, channel: &ChannelRef, text: &str) -> PortFuture<'_, MessageId> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = MessageId::new(format!("m-text-{}", state.next_id));
        state.texts.push((channel.id.clone(), text.to_string()));
        ready(Ok(id))
    }

    fn fetch_since(
        &self,
        _channel: &ChannelRef,
        after: Option<&MessageId>,
    ) -> PortFuture<'_, Vec<ChatMessage>> {
        let state = self.state.lock().unwrap();
        let after = after.and_then(|id| id.as_str().parse::<u64>().ok());
        let messages = state
            .inbox
            .iter()
            .filter(|m| {
                let id = m.id.as_str().parse::<u64>().unwrap_or(0);
                after.map_or(true, |after| id > after)
            })
            .cloned()
            .collect();
        ready(Ok(messages))
    }
}
