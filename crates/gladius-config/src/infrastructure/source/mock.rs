//! In-memory config source for unit testing.
//!
//! The loader only needs two questions answered ("does this file exist?" and
//! "what is in it?"), so a `HashMap<PathBuf, …>` is enough to exercise every
//! search-order and error path without touching the disk.
//!
//! ```ignore
//! let source = MockConfigSource::new()
//!     .with_file("./node.toml", "port = 1")
//!     .with_unreadable_file("/base/node.json");
//!
//! let outcome = load_config(&source, "node", &search_paths, None)?;
//! assert_eq!(source.reads(), vec![PathBuf::from("./node.toml")]);
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::application::load_config::ConfigSource;

#[derive(Debug, Clone)]
enum MockEntry {
    Contents(String),
    Unreadable,
}

/// A config source backed by an in-memory map.
#[derive(Debug, Default)]
pub struct MockConfigSource {
    files: HashMap<PathBuf, MockEntry>,
    /// Every path passed to `read_to_string`, in call order.
    reads: Mutex<Vec<PathBuf>>,
}

impl MockConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a readable file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files
            .insert(path.into(), MockEntry::Contents(contents.into()));
        self
    }

    /// Adds a file that exists but fails with `PermissionDenied` when read.
    pub fn with_unreadable_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into(), MockEntry::Unreadable);
        self
    }

    /// Paths read so far.
    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ConfigSource for MockConfigSource {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        if let Ok(mut reads) = self.reads.lock() {
            reads.push(path.to_path_buf());
        }
        match self.files.get(path) {
            Some(MockEntry::Contents(text)) => Ok(text.clone()),
            Some(MockEntry::Unreadable) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "mock: unreadable",
            )),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "mock: no such file")),
        }
    }
}
