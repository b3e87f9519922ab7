//! # gladius-config
//!
//! Configuration bootstrap for Gladius nodes.
//!
//! At startup a node calls [`setup_config`] with a logical config name and a
//! map of default values.  The crate then:
//!
//! 1. Resolves the Gladius base directory (`-b/--base-dir` flag, then the
//!    `GLADIUSBASE` environment variable, then an OS-specific default).
//! 2. Searches the working directory and the base directory for
//!    `<name>.json`, `<name>.toml`, `<name>.yaml` or `<name>.yml`.
//! 3. Layers the file values over the defaults.
//! 4. Watches the loaded file and reloads it when it changes on disk.
//!
//! The result is a [`Config`] handle.  Values are read with
//! [`Config::get_string`]; a missing key yields an empty string.
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//!
//! use gladius_config::{setup_config, BaseDirArgs};
//!
//! # fn main() -> Result<(), gladius_config::ConfigError> {
//! let defaults = BTreeMap::from([("port".to_string(), "8080".to_string())]);
//! let config = setup_config("gladius-node", defaults, &BaseDirArgs::default())?;
//! println!("listening on {}", config.get_string("port"));
//! # Ok(())
//! # }
//! ```
//!
//! # Layout
//!
//! ```text
//! domain/          Pure types: base-dir resolution, file formats, layered settings
//! application/     Locating and loading the config file through a ConfigSource
//! infrastructure/
//!   cli            clap arguments for the base-dir override
//!   source         Filesystem and in-memory ConfigSource implementations
//!   watcher        notify-based live reload
//!   bootstrap      The Config handle and setup entry points
//! ```

/// Domain layer: pure types with no I/O.
pub mod domain;

/// Application layer: config discovery and loading.
pub mod application;

/// Infrastructure layer: CLI arguments, filesystem access, file watching.
pub mod infrastructure;

pub use application::load_config::{ConfigError, ConfigSource, LoadOutcome};
pub use domain::base_dir::{resolve_base_dir, BaseDirError, EnvSnapshot, HostOs};
pub use domain::format::{ConfigFormat, FormatError};
pub use domain::settings::Settings;
pub use infrastructure::bootstrap::{gladius_base, setup_config, Config, SetupOptions};
pub use infrastructure::cli::BaseDirArgs;
pub use infrastructure::watcher::{ConfigChange, WatchError};
