//! Replaying adapter for the `IssueSource` port.

use std::sync::Mutex;

use super::{extract_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::model::{ItemType, RemoteItem};
use crate::ports::tracker::IssueSource;
use crate::ports::PortFuture;

/// Serves recorded tracker listings from a cassette.
pub struct ReplayingIssueSource {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingIssueSource {
    /// Creates a replaying issue source backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl IssueSource for ReplayingIssueSource {
    fn fetch_open(&self, _item_type: ItemType) -> PortFuture<'_, Vec<RemoteItem>> {
        let output = next_output(&self.replayer, "tracker", "fetch_open");
        Box::pin(async move { extract_result(&output, "tracker::fetch_open") })
    }
}
