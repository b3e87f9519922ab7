//! Config discovery and loading.
//!
//! Given a config name (`gladius-node`) and an ordered list of search paths,
//! the loader probes `<dir>/<name>.<ext>` for every directory and every
//! supported extension and reads the first file that exists.
//!
//! # Failure policy
//!
//! - No candidate exists: [`LoadOutcome::NotFound`].  The caller logs it and
//!   keeps running on defaults.
//! - A candidate exists but cannot be read or parsed: [`ConfigError`].  A
//!   broken config file is never silently ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::format::{ConfigFormat, FormatError, SUPPORTED_EXTENSIONS};

/// Error type for locating and loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config name is empty or contains a path separator.
    #[error("invalid config name '{0}': expected a bare file stem such as 'gladius-node'")]
    InvalidName(String),

    /// A file system I/O error occurred while reading an existing file.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but its contents are not valid.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Read access to wherever config files live.
///
/// The production implementation is `FsConfigSource`; tests use
/// `MockConfigSource`.
pub trait ConfigSource: Send + Sync {
    /// Returns `true` if `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Reads the whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// Result of a successful load attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A config file was found and parsed.
    Loaded {
        path: PathBuf,
        format: ConfigFormat,
        leaves: BTreeMap<String, Value>,
    },
    /// None of the candidates exist.
    NotFound { searched: Vec<PathBuf> },
}

/// Builds the ordered search-path list.
///
/// The working directory always comes first; the base directory is appended
/// when known and not already present.
pub fn build_search_paths(working_dir: &Path, base_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![working_dir.to_path_buf()];
    if let Some(base) = base_dir {
        if !paths.iter().any(|p| p == base) {
            paths.push(base.to_path_buf());
        }
    }
    paths
}

/// Checks that `name` is a bare file stem.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidName`] for an empty name or one containing
/// `/` or `\`.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Every candidate file for `name`, in probe order.
///
/// When `format` is given only that format's extensions are probed.
pub fn candidate_files(
    name: &str,
    search_paths: &[PathBuf],
    format: Option<ConfigFormat>,
) -> Vec<(PathBuf, ConfigFormat)> {
    search_paths
        .iter()
        .flat_map(|dir| {
            SUPPORTED_EXTENSIONS
                .iter()
                .filter(move |(_, f)| format.map_or(true, |wanted| wanted == *f))
                .map(move |(ext, f)| (dir.join(format!("{name}.{ext}")), *f))
        })
        .collect()
}

/// Returns the first candidate that exists in `source`.
pub fn locate_config(
    source: &dyn ConfigSource,
    name: &str,
    search_paths: &[PathBuf],
    format: Option<ConfigFormat>,
) -> Option<(PathBuf, ConfigFormat)> {
    candidate_files(name, search_paths, format)
        .into_iter()
        .find(|(path, _)| source.is_file(path))
}

/// Reads and parses a single config file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if its contents are malformed.
pub fn read_config_file(
    source: &dyn ConfigSource,
    path: &Path,
    format: ConfigFormat,
) -> Result<BTreeMap<String, Value>, ConfigError> {
    let contents = source
        .read_to_string(path)
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    format.parse(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Locates `name` along `search_paths` and loads it.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidName`] for a malformed name, and
/// [`ConfigError::Io`] / [`ConfigError::Parse`] when a file was found but
/// could not be loaded.  A missing file is not an error.
pub fn load_config(
    source: &dyn ConfigSource,
    name: &str,
    search_paths: &[PathBuf],
    format: Option<ConfigFormat>,
) -> Result<LoadOutcome, ConfigError> {
    validate_name(name)?;

    let Some((path, format)) = locate_config(source, name, search_paths, format) else {
        return Ok(LoadOutcome::NotFound {
            searched: search_paths.to_vec(),
        });
    };

    debug!("reading {format} config from {}", path.display());
    let leaves = read_config_file(source, &path, format)?;
    Ok(LoadOutcome::Loaded {
        path,
        format,
        leaves,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
