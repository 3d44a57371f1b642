//! Issue source port: the remote tracker's open items.

use super::PortFuture;
use crate::model::{ItemType, RemoteItem};

/// Lists the open items of one repository.
pub trait IssueSource: Send + Sync {
    /// Returns every open item of the given type, in tracker order.
    ///
    /// For [`ItemType::Issue`] the result never contains pull requests, even
    /// though the tracker lists both on the same endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    /// Callers decide how to degrade; an error is never an empty list.
    fn fetch_open(&self, item_type: ItemType) -> PortFuture<'_, Vec<RemoteItem>>;
}
