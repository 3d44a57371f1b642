//! Tracking store: the only durable state.
//!
//! A single JSON file maps item numbers to the id of the message posted for
//! them, one object per item type:
//!
//! ```text
//! { "issues": { "12": 1188000000000000001 }, "prs": {} }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;
use crate::error::MirrorError;
use crate::model::{ItemType, MessageId};
use crate::ports::FileLock;

/// Item number → posted message, per item type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStore {
    /// Tracked issues.
    #[serde(default)]
    pub issues: BTreeMap<u64, MessageId>,
    /// Tracked pull requests.
    #[serde(default)]
    pub prs: BTreeMap<u64, MessageId>,
}

impl TrackingStore {
    /// The map for one item type.
    #[must_use]
    pub fn tracked(&self, item_type: ItemType) -> &BTreeMap<u64, MessageId> {
        match item_type {
            ItemType::Issue => &self.issues,
            ItemType::PullRequest => &self.prs,
        }
    }

    /// Mutable access to the map for one item type.
    pub fn tracked_mut(&mut self, item_type: ItemType) -> &mut BTreeMap<u64, MessageId> {
        match item_type {
            ItemType::Issue => &mut self.issues,
            ItemType::PullRequest => &mut self.prs,
        }
    }

    /// Number of tracked items of one type.
    #[must_use]
    pub fn count(&self, item_type: ItemType) -> usize {
        self.tracked(item_type).len()
    }
}

/// Loads and saves the [`TrackingStore`] through `ctx.fs`.
pub struct StateStore<'a> {
    ctx: &'a ServiceContext,
    path: PathBuf,
}

impl<'a> StateStore<'a> {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, path: &Path) -> Self {
        Self { ctx, path: path.to_path_buf() }
    }

    /// Path of the lock file guarding the state file, `<state>.lock`.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Tries to take the state lock. `Ok(None)` means another run, in this
    /// process or another one, is between its load and its save.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened.
    pub fn try_lock(&self) -> Result<Option<FileLock>, MirrorError> {
        let lock_path = self.lock_path();
        self.ctx.fs.try_lock(&lock_path).map_err(|e| {
            MirrorError::Store(format!("failed to lock {}: {e}", lock_path.display()))
        })
    }

    /// Loads the store. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<TrackingStore, MirrorError> {
        if !self.ctx.fs.exists(&self.path) {
            return Ok(TrackingStore::default());
        }
        let contents = self.ctx.fs.read_to_string(&self.path).map_err(|e| {
            MirrorError::Store(format!("failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            MirrorError::Store(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    /// Overwrites the state file with `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, store: &TrackingStore) -> Result<(), MirrorError> {
        let json = serde_json::to_string_pretty(store)
            .map_err(|e| MirrorError::Store(format!("failed to serialize tracking state: {e}")))?;
        self.ctx.fs.write(&self.path, &json).map_err(|e| {
            MirrorError::Store(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    /// Resets both item types to empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn clear(&self) -> Result<(), MirrorError> {
        self.save(&TrackingStore::default())
    }
}
