//! The [`Config`] handle and the setup entry points.
//!
//! # Startup sequence
//!
//! ```text
//! setup_config(name, defaults, &BaseDirArgs)
//!  └─ gladius_base()            -- flag > GLADIUSBASE > OS default
//!  └─ Config::setup(options)
//!       ├─ build_search_paths   -- working dir, then base dir
//!       ├─ Settings::with_defaults
//!       ├─ load_config          -- first <dir>/<name>.<ext> that exists
//!       └─ ConfigWatcher::start -- live reload (only if a file was loaded)
//! ```
//!
//! A `Config` is an ordinary value: construct as many as you like (one per
//! test, for instance) and pass it by reference to whoever needs settings.
//! Wrap it in an `Arc` to share it across tasks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::application::load_config::{
    build_search_paths, load_config, ConfigError, ConfigSource, LoadOutcome,
};
use crate::domain::base_dir::{resolve_base_dir, BaseDirError, EnvSnapshot, HostOs};
use crate::domain::format::ConfigFormat;
use crate::domain::settings::Settings;
use crate::infrastructure::cli::BaseDirArgs;
use crate::infrastructure::source::FsConfigSource;
use crate::infrastructure::watcher::{ConfigChange, ConfigWatcher};

/// Buffered change notifications per subscriber before the oldest are dropped.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Inputs to [`Config::setup`].
#[derive(Debug, Clone)]
pub struct SetupOptions {
    name: String,
    defaults: BTreeMap<String, String>,
    base_dir: Option<PathBuf>,
    working_dir: PathBuf,
    format: Option<ConfigFormat>,
    watch: bool,
}

impl SetupOptions {
    /// Options for a config named `name` (file stem, no extension).
    ///
    /// The working directory defaults to `.`, no base directory is set and
    /// watching is enabled.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            defaults: BTreeMap::new(),
            base_dir: None,
            working_dir: PathBuf::from("."),
            format: None,
            watch: true,
        }
    }

    /// Adds default values.
    pub fn defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults
            .extend(defaults.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Directory searched after the working directory.
    pub fn base_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.base_dir = dir;
        self
    }

    /// Directory searched first (default `.`).
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Only probe extensions of `format`.
    pub fn format(mut self, format: ConfigFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Enables or disables live reload (default enabled).
    pub fn watch(mut self, enabled: bool) -> Self {
        self.watch = enabled;
        self
    }
}

/// A loaded configuration: defaults, file values and an optional live watch.
///
/// Dropping the handle stops the watch.
pub struct Config {
    name: String,
    store: Arc<RwLock<Settings>>,
    config_file: Option<(PathBuf, ConfigFormat)>,
    base_dir: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    changes: broadcast::Sender<ConfigChange>,
    watcher: Option<ConfigWatcher>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("name", &self.name)
            .field("config_file", &self.config_file)
            .field("base_dir", &self.base_dir)
            .field("search_paths", &self.search_paths)
            .field("watching", &self.watcher.is_some())
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads the config from disk and, if a file was found, starts watching it.
    ///
    /// A missing file is logged and the defaults are used.  Failure to start
    /// the watch is logged and does not fail setup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidName`] for a malformed name and
    /// [`ConfigError::Io`] / [`ConfigError::Parse`] when a config file exists
    /// but cannot be loaded.  Whether that is fatal is up to the caller.
    pub fn setup(options: SetupOptions) -> Result<Self, ConfigError> {
        let watch = options.watch;
        let mut config = Self::load(options, &FsConfigSource)?;

        if watch {
            if let Some((path, format)) = config.config_file.clone() {
                match ConfigWatcher::start(
                    &path,
                    format,
                    Arc::clone(&config.store),
                    config.changes.clone(),
                ) {
                    Ok(watcher) => config.watcher = Some(watcher),
                    Err(e) => warn!("live reload disabled: {e}"),
                }
            }
        }
        Ok(config)
    }

    /// Loads the config through `source` without watching it.
    ///
    /// Useful with `MockConfigSource` when the filesystem should stay out of
    /// the picture.
    ///
    /// # Errors
    ///
    /// Same as [`Config::setup`].
    pub fn setup_with_source(
        options: SetupOptions,
        source: &dyn ConfigSource,
    ) -> Result<Self, ConfigError> {
        Self::load(options, source)
    }

    fn load(options: SetupOptions, source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let SetupOptions {
            name,
            defaults,
            base_dir,
            working_dir,
            format,
            watch: _,
        } = options;

        let search_paths = build_search_paths(&working_dir, base_dir.as_deref());
        let mut settings = Settings::with_defaults(defaults);

        let config_file = match load_config(source, &name, &search_paths, format)? {
            LoadOutcome::Loaded {
                path,
                format,
                leaves,
            } => {
                info!(
                    "loaded {} values from {}",
                    leaves.len(),
                    path.display()
                );
                settings.replace_file_layer(leaves);
                Some((path, format))
            }
            LoadOutcome::NotFound { searched } => {
                warn!(
                    "cannot find config file '{name}' in [{}]; using defaults",
                    display_paths(&searched)
                );
                None
            }
        };

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            name,
            store: Arc::new(RwLock::new(settings)),
            config_file,
            base_dir,
            search_paths,
            changes,
            watcher: None,
        })
    }

    /// Value for `key` (file, then default), or `""` when absent.
    pub fn get_string(&self, key: &str) -> String {
        self.read().get_string(key)
    }

    /// Value for `key`, or `None` when neither the file nor the defaults set it.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read().get(key)
    }

    /// Whether `key` has a value from the file or the defaults.
    pub fn is_set(&self, key: &str) -> bool {
        self.read().is_set(key)
    }

    /// Every known key, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.read().keys()
    }

    /// Registers (or replaces) a default after setup.
    pub fn set_default(&self, key: &str, value: impl Into<String>) {
        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_default(key, value);
    }

    /// Subscribes to change notifications from the live watch.
    ///
    /// The receiver never yields anything if no file was loaded or watching
    /// is disabled.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.changes.subscribe()
    }

    /// The logical config name passed to setup.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the file the values were loaded from, if any.
    pub fn config_file_used(&self) -> Option<&Path> {
        self.config_file.as_ref().map(|(path, _)| path.as_path())
    }

    /// Format of the loaded file, if any.
    pub fn config_format(&self) -> Option<ConfigFormat> {
        self.config_file.as_ref().map(|(_, format)| *format)
    }

    /// The base directory that was searched, if one was resolved.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Directories searched, in order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Whether a live watch is active.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Settings> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves the base directory for this process.
///
/// Uses the already-parsed `-b/--base-dir` flag, the current environment
/// and the OS this binary was built for.
///
/// # Errors
///
/// See [`resolve_base_dir`].
pub fn gladius_base(args: &BaseDirArgs) -> Result<PathBuf, BaseDirError> {
    resolve_base_dir(
        args.base_dir.as_deref(),
        &EnvSnapshot::from_process(),
        &HostOs::current(),
    )
}

/// Sets up the process configuration: resolve the base directory, search
/// `.` and the base directory for `name`, apply `defaults`, load, and watch.
///
/// If the base directory cannot be resolved only `.` is searched.
///
/// # Errors
///
/// See [`Config::setup`].
pub fn setup_config<I, K, V>(
    name: &str,
    defaults: I,
    args: &BaseDirArgs,
) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let base_dir = match gladius_base(args) {
        Ok(dir) => Some(dir),
        Err(e) => {
            warn!("{e}; searching only the working directory");
            None
        }
    };

    Config::setup(SetupOptions::new(name).defaults(defaults).base_dir(base_dir))
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::source::MockConfigSource;

    fn options() -> SetupOptions {
        SetupOptions::new("node")
            .working_dir("/work")
            .base_dir(Some(PathBuf::from("/base")))
            .defaults([("port", "8080")])
    }

    #[test]
    fn test_defaults_apply_when_no_file_exists() {
        // Arrange
        let source = MockConfigSource::new();

        // Act
        let config = Config::setup_with_source(options(), &source).unwrap();

        // Assert
        assert_eq!(config.get_string("port"), "8080");
        assert_eq!(config.config_file_used(), None);
        assert!(!config.is_watching());
    }

    #[test]
    fn test_file_value_overrides_default() {
        let source = MockConfigSource::new().with_file("/work/node.toml", "port = 9090");
        let config = Config::setup_with_source(options(), &source).unwrap();
        assert_eq!(config.get_string("port"), "9090");
        assert_eq!(config.config_file_used(), Some(Path::new("/work/node.toml")));
        assert_eq!(config.config_format(), Some(ConfigFormat::Toml));
    }

    #[test]
    fn test_toml_datetime_is_readable_as_string() {
        // Arrange
        let source = MockConfigSource::new()
            .with_file("/work/node.toml", "started = 1979-05-27T07:32:00Z\n");

        // Act
        let config = Config::setup_with_source(options(), &source).unwrap();

        // Assert
        assert_eq!(config.get_string("started"), "1979-05-27T07:32:00Z");
        assert!(config.is_set("started"));
        assert_eq!(config.keys(), vec!["port".to_string(), "started".to_string()]);
    }

    #[test]
    fn test_base_dir_searched_after_working_dir() {
        let source = MockConfigSource::new().with_file("/base/node.json", r#"{"port": 7}"#);
        let config = Config::setup_with_source(options(), &source).unwrap();
        assert_eq!(config.get_string("port"), "7");
        assert_eq!(
            config.search_paths(),
            &[PathBuf::from("/work"), PathBuf::from("/base")]
        );
        assert_eq!(config.base_dir(), Some(Path::new("/base")));
    }

    #[test]
    fn test_without_base_dir_only_working_dir_is_searched() {
        // Arrange: the file only exists in the base dir, which is unknown
        let source = MockConfigSource::new().with_file("/base/node.toml", "port = 1");
        let options = SetupOptions::new("node").working_dir("/work");

        // Act
        let config = Config::setup_with_source(options, &source).unwrap();

        // Assert
        assert_eq!(config.search_paths(), &[PathBuf::from("/work")]);
        assert!(!config.is_set("port"));
    }

    #[test]
    fn test_forced_format_skips_other_extensions() {
        let source = MockConfigSource::new()
            .with_file("/work/node.json", r#"{"port": 1}"#)
            .with_file("/work/node.yaml", "port: 2");
        let config =
            Config::setup_with_source(options().format(ConfigFormat::Yaml), &source).unwrap();
        assert_eq!(config.get_string("port"), "2");
    }

    #[test]
    fn test_malformed_file_is_returned_as_error() {
        let source = MockConfigSource::new().with_file("/work/node.toml", "port = = 1");
        let result = Config::setup_with_source(options(), &source);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_set_default_after_setup() {
        let config = Config::setup_with_source(options(), &MockConfigSource::new()).unwrap();
        config.set_default("region", "eu");
        assert_eq!(config.get_string("region"), "eu");
        assert_eq!(config.keys(), vec!["port", "region"]);
    }

    #[test]
    fn test_missing_key_is_empty_and_unset() {
        let config = Config::setup_with_source(options(), &MockConfigSource::new()).unwrap();
        assert_eq!(config.get_string("missing"), "");
        assert_eq!(config.get("missing"), None);
        assert!(!config.is_set("missing"));
    }

    #[test]
    fn test_gladius_base_prefers_flag() {
        let dir = gladius_base(&BaseDirArgs::with_base_dir("/flag/dir")).unwrap();
        assert_eq!(dir, PathBuf::from("/flag/dir"));
    }

    #[test]
    fn test_name_is_kept() {
        let config = Config::setup_with_source(options(), &MockConfigSource::new()).unwrap();
        assert_eq!(config.name(), "node");
    }
}
