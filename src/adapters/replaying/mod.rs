//! Replaying adapters that replay recorded interactions.
//!
//! Outputs follow the recording convention: `{"ok": <value>}` or
//! `{"err": "message"}`. Inputs are ignored; calls are served in order per
//! port/method pair.

pub mod channel;
pub mod filesystem;
pub mod tracker;

use std::sync::Mutex;

use serde::de::DeserializeOwned;

pub use channel::ReplayingChannelGateway;
pub use filesystem::ReplayingFileSystem;
pub use tracker::ReplayingIssueSource;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::PortError;

/// Takes the output of the next recorded `port::method` interaction.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut replayer = replayer.lock().expect("replayer lock poisoned");
    replayer.next_interaction(port, method).output.clone()
}

/// Extracts a Result from a cassette output JSON value.
pub(crate) fn extract_result<T: DeserializeOwned>(
    output: &serde_json::Value,
    context: &str,
) -> Result<T, PortError> {
    if let Some(err) = output.get("err") {
        let msg = err.as_str().unwrap_or("unknown error").to_string();
        return Err(msg.into());
    }
    let value = output.get("ok").unwrap_or(output);
    serde_json::from_value(value.clone())
        .map_err(|e| format!("{context}: failed to deserialize: {e}").into())
}

#[cfg(test)]
pub(crate) fn replayer_for(
    interactions: Vec<crate::cassette::format::Interaction>,
) -> CassetteReplayer {
    let cassette = crate::cassette::format::Cassette {
        name: "test".into(),
        recorded_at: chrono::Utc::now(),
        commit: "abc".into(),
        interactions,
    };
    CassetteReplayer::new(&cassette)
}
