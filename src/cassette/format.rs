//! Cassette data structures for recording and replaying port interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One call made through a port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Position in the recording, assigned by the recorder.
    pub seq: u64,
    /// Port name: `fs`, `tracker` or `channel`.
    pub port: String,
    /// Method invoked on the port.
    pub method: String,
    /// Arguments, for reading the cassette; ignored on replay.
    pub input: serde_json::Value,
    /// Result, as `{"ok": value}` / `{"err": message}` for fallible methods.
    pub output: serde_json::Value,
}

/// A recorded sequence of interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name.
    pub name: String,
    /// When the recording finished.
    pub recorded_at: DateTime<Utc>,
    /// Git commit at recording time.
    pub commit: String,
    /// Interactions in call order.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// A cassette with no interactions.
    #[must_use]
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            recorded_at: Utc::now(),
            commit: "unknown".into(),
            interactions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_hand_written_yaml() {
        let yaml = r#"
name: closed-issue
recorded_at: 2024-05-01T12:00:00Z
commit: abc123
interactions:
  - seq: 0
    port: tracker
    method: fetch_open
    input: { item_type: issue }
    output: { ok: [] }
  - seq: 1
    port: channel
    method: delete
    input: { channel_id: "1001", message_id: 1188000000000000001 }
    output: { err: "Missing Permissions" }
"#;
        let cassette: Cassette = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[1].port, "channel");
        assert_eq!(cassette.interactions[1].output["err"], "Missing Permissions");
    }

    #[test]
    fn interactions_default_to_empty() {
        let yaml = "name: blank\nrecorded_at: 2024-05-01T12:00:00Z\ncommit: unknown\n";
        let cassette: Cassette = serde_yaml::from_str(yaml).unwrap();
        assert!(cassette.interactions.is_empty());
    }
}
