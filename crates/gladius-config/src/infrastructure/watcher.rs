//! Live reload of the loaded config file.
//!
//! The watch is placed on the file's *directory* (non-recursive) rather than
//! on the file itself.  Editors that save by writing a temporary file and
//! renaming it over the original replace the inode, which would silently end
//! a watch on the file.  Events for other files in the directory are ignored.
//!
//! Raw events are debounced: a save that truncates the file and then writes
//! it in several chunks arrives as one batch once the file has been quiet for
//! [`DEBOUNCE_INTERVAL`].  For every batch that touches the config file the
//! watcher:
//!
//! 1. re-reads the file; an empty read means the writer has not finished yet
//!    and is skipped;
//! 2. re-parses it and on success swaps the file layer of the shared
//!    [`Settings`] (defaults are untouched); on failure logs a warning and
//!    keeps the previous values;
//! 3. logs `config file changed: <path>`;
//! 4. broadcasts a [`ConfigChange`] to every subscriber.
//!
//! The debouncer runs on its own thread.  Dropping the [`ConfigWatcher`]
//! stops the watch.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEvent, Debouncer};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::application::load_config::ConfigSource;
use crate::domain::format::ConfigFormat;
use crate::domain::settings::Settings;
use crate::infrastructure::source::FsConfigSource;

/// How long the config file must be quiet before a batch of events is
/// handled.
pub const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(200);

/// The platform watcher could not be created or attached.
#[derive(Debug, Error)]
#[error("failed to watch config {path}: {source}")]
pub struct WatchError {
    pub path: PathBuf,
    #[source]
    pub source: notify::Error,
}

/// Notification sent to subscribers after the config file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    /// The config file that changed.
    pub path: PathBuf,
    /// `true` if the new contents were loaded, `false` if they failed to
    /// parse and the previous values were kept.
    pub reloaded: bool,
}

/// What to do about a batch of debounced events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchAction {
    Reload,
    Removed,
    Ignore,
}

/// Result of re-reading the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReloadOutcome {
    Applied,
    Failed,
    /// Zero-length or whitespace-only contents; previous values kept.
    Empty,
}

/// Keeps a debounced `notify` watch on a config file alive.
pub struct ConfigWatcher {
    path: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ConfigWatcher {
    /// Starts watching `path` and reloading it into `store`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if the platform watcher cannot be created or
    /// the file's directory cannot be watched.
    pub fn start(
        path: &Path,
        format: ConfigFormat,
        store: Arc<RwLock<Settings>>,
        changes: broadcast::Sender<ConfigChange>,
    ) -> Result<Self, WatchError> {
        let watch_error = |source| WatchError {
            path: path.to_path_buf(),
            source,
        };

        let file_name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let config_path = path.to_path_buf();
        let mut debouncer = new_debouncer(DEBOUNCE_INTERVAL, move |res: DebounceEventResult| {
            let events = match res {
                Ok(events) => events,
                Err(e) => {
                    warn!("config watcher error: {e:?}");
                    return;
                }
            };
            match classify_events(&events, &file_name, config_path.is_file()) {
                WatchAction::Reload => {
                    let reloaded = match reload(&FsConfigSource, &config_path, format, &store) {
                        ReloadOutcome::Applied => true,
                        ReloadOutcome::Failed => false,
                        ReloadOutcome::Empty => return,
                    };
                    info!("config file changed: {}", config_path.display());
                    // No subscribers is fine; the log line above still fires.
                    let _ = changes.send(ConfigChange {
                        path: config_path.clone(),
                        reloaded,
                    });
                }
                WatchAction::Removed => {
                    warn!(
                        "config file {} was removed; keeping last loaded values",
                        config_path.display()
                    );
                }
                WatchAction::Ignore => {}
            }
        })
        .map_err(watch_error)?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(watch_error)?;

        debug!("watching {} for changes", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            _debouncer: debouncer,
        })
    }

    /// The config file being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decides whether a debounced batch concerns the config file and how.
///
/// Debounced events carry no kind, so whether the file still exists tells a
/// write apart from a removal.
pub(crate) fn classify_events(
    events: &[DebouncedEvent],
    file_name: &OsStr,
    file_exists: bool,
) -> WatchAction {
    let concerns_file = events
        .iter()
        .any(|event| event.path.file_name() == Some(file_name));
    match (concerns_file, file_exists) {
        (false, _) => WatchAction::Ignore,
        (true, true) => WatchAction::Reload,
        (true, false) => WatchAction::Removed,
    }
}

/// Re-reads `path` into the file layer of `store`.
pub(crate) fn reload(
    source: &dyn ConfigSource,
    path: &Path,
    format: ConfigFormat,
    store: &RwLock<Settings>,
) -> ReloadOutcome {
    let contents = match source.read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(
                "config reload of {} failed: {e}; keeping previous values",
                path.display()
            );
            return ReloadOutcome::Failed;
        }
    };
    if contents.trim().is_empty() {
        debug!("{} is empty; waiting for the writer to finish", path.display());
        return ReloadOutcome::Empty;
    }

    match format.parse(&contents) {
        Ok(leaves) => {
            let count = leaves.len();
            store
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .replace_file_layer(leaves);
            debug!("reloaded {count} values from {}", path.display());
            ReloadOutcome::Applied
        }
        Err(e) => {
            warn!(
                "config reload of {} failed: {e}; keeping previous values",
                path.display()
            );
            ReloadOutcome::Failed
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
