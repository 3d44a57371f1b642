//! Filesystem port for the state file.

use std::path::Path;

use super::PortError;

/// An exclusive lock, released when dropped.
pub type FileLock = Box<dyn Send + Sync>;

/// Provides filesystem access for reading and writing the state file.
///
/// Abstracting the filesystem allows deterministic replay and testing
/// without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, PortError>;

    /// Replaces the file with `contents`. Readers observe either the old or
    /// the new contents, never a partial write.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError>;

    /// Returns `true` if the path exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Tries to take an exclusive lock on `path`, creating the file if
    /// needed. `Ok(None)` means someone else holds it. Locks are advisory
    /// and shared with other processes.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened.
    fn try_lock(&self, path: &Path) -> Result<Option<FileLock>, PortError>;
}
