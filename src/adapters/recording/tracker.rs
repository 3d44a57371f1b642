//! Recording adapter for the `IssueSource` port.

use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::model::{ItemType, RemoteItem};
use crate::ports::{IssueSource, PortFuture};

/// Records tracker listings while delegating to an inner implementation.
pub struct RecordingIssueSource {
    inner: Box<dyn IssueSource>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingIssueSource {
    /// Creates a new recording issue source wrapping the given implementation.
    pub fn new(inner: Box<dyn IssueSource>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct FetchInput {
    item_type: ItemType,
}

impl IssueSource for RecordingIssueSource {
    fn fetch_open(&self, item_type: ItemType) -> PortFuture<'_, Vec<RemoteItem>> {
        Box::pin(async move {
            let result = self.inner.fetch_open(item_type).await;
            let input = FetchInput { item_type };
            record_result(&self.recorder, "tracker", "fetch_open", &input, &result);
            result
        })
    }
}
