//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the mirror core and an external
//! system (disk, the issue tracker, the chat platform). Implementations live
//! in `src/adapters/`.

pub mod channel;
pub mod filesystem;
pub mod tracker;

use std::error::Error;
use std::future::Future;
use std::pin::Pin;

pub use channel::ChannelGateway;
pub use filesystem::{FileLock, FileSystem};
pub use tracker::IssueSource;

/// Error type returned across every port boundary.
pub type PortError = Box<dyn Error + Send + Sync>;

/// Boxed future returned by async port methods, keeping the traits dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;
