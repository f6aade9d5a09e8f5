//! Build counter storage.

use crate::error::{ErrorExt, Result};
use std::path::{Path, PathBuf};

/// Default counter file name, relative to the project root.
pub const COUNTER_FILE: &str = "build_number.txt";

/// Persistent storage for the last issued build number.
pub trait CounterStore {
    /// Last stored value. Missing or unreadable state reads as `None`.
    fn load(&self) -> Option<u64>;

    /// Persist `value`.
    fn store(&mut self, value: u64) -> Result<()>;
}

/// Counter kept in a plaintext file holding a single integer.
#[derive(Debug, Clone)]
pub struct FileCounter {
    path: PathBuf,
}

impl FileCounter {
    /// Counter stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Counter stored in [`COUNTER_FILE`] under `root`.
    pub fn in_project(root: &Path) -> Self {
        Self::new(root.join(COUNTER_FILE))
    }

    /// Location of the counter file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for FileCounter {
    fn load(&self) -> Option<u64> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match content.trim().parse() {
            Ok(n) => Some(n),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable build counter {} ({}); restarting at 1",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn store(&mut self, value: u64) -> Result<()> {
        std::fs::write(&self.path, value.to_string()).fs_context("writing build counter", &self.path)
    }
}

/// Counter held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounter {
    value: Option<u64>,
}

impl MemoryCounter {
    /// Counter starting from `value`.
    pub fn starting_at(value: u64) -> Self {
        Self { value: Some(value) }
    }
}

impl CounterStore for MemoryCounter {
    fn load(&self) -> Option<u64> {
        self.value
    }

    fn store(&mut self, value: u64) -> Result<()> {
        self.value = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_counter_round_trip_and_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let mut counter = FileCounter::in_project(tmp.path());
        assert_eq!(counter.load(), None);

        counter.store(41).unwrap();
        assert_eq!(std::fs::read_to_string(counter.path()).unwrap(), "41");
        assert_eq!(counter.load(), Some(41));

        std::fs::write(counter.path(), "forty-two").unwrap();
        assert_eq!(counter.load(), None);

        std::fs::write(counter.path(), " 7\n").unwrap();
        assert_eq!(counter.load(), Some(7));
    }
}
