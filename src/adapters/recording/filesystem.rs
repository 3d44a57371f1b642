//! Recording adapter for the `FileSystem` port.

use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::{record_interaction, record_result};
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{FileLock, FileSystem, PortError};

/// Records filesystem interactions while delegating to an inner implementation.
pub struct RecordingFileSystem {
    inner: Box<dyn FileSystem>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingFileSystem {
    /// Creates a new recording filesystem wrapping the given implementation.
    pub fn new(inner: Box<dyn FileSystem>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

#[derive(Serialize)]
struct PathInput<'a> {
    path: &'a str,
}

#[derive(Serialize)]
struct WriteInput<'a> {
    path: &'a str,
    contents: &'a str,
}

impl FileSystem for RecordingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        let result = self.inner.read_to_string(path);
        let input = PathInput { path: &path.display().to_string() };
        record_result(&self.recorder, "fs", "read_to_string", &input, &result);
        result
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        let result = self.inner.write(path, contents);
        let input = WriteInput { path: &path.display().to_string(), contents };
        record_result(&self.recorder, "fs", "write", &input, &result);
        result
    }

    fn exists(&self, path: &Path) -> bool {
        let result = self.inner.exists(path);
        let input = PathInput { path: &path.display().to_string() };
        record_interaction(&self.recorder, "fs", "exists", &input, &result);
        result
    }

    fn try_lock(&self, path: &Path) -> Result<Option<FileLock>, PortError> {
        let result = self.inner.try_lock(path);
        let acquired = result.as_ref().map(Option::is_some);
        let input = PathInput { path: &path.display().to_string() };
        record_result(&self.recorder, "fs", "try_lock", &input, &acquired);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::recording::take_recorder;
    use crate::test_support::MemFs;

    #[test]
    fn records_exists_and_write() {
        let dir = std::env::temp_dir().join("issue_mirror_rec_fs_test");
        std::fs::create_dir_all(&dir).unwrap();
        let cassette_path = dir.join("fs.cassette.yaml");

        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "test", "abc")));
        {
            let fs = RecordingFileSystem::new(Box::new(MemFs::new()), Arc::clone(&recorder));
            let _lock = fs.try_lock(Path::new("/state.json.lock")).unwrap();
            assert!(!fs.exists(Path::new("/state.json")));
            fs.write(Path::new("/state.json"), "{\"issues\":{},\"prs\":{}}").unwrap();
        }

        take_recorder(recorder).finish().unwrap();

        let content = std::fs::read_to_string(&cassette_path).unwrap();
        assert!(content.contains("exists"));
        assert!(content.contains("write"));
        assert!(content.contains("try_lock"));
        assert!(content.contains("/state.json"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
