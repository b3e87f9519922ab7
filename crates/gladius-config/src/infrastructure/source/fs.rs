//! Filesystem-backed config source.

use std::path::Path;

use crate::application::load_config::ConfigSource;

/// Reads config files straight from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsConfigSource;

impl ConfigSource for FsConfigSource {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}
