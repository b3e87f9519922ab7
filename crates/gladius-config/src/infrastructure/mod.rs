//! Infrastructure layer for gladius-config.
//!
//! Everything that touches the outside world lives here:
//!
//! - `cli`       – the `-b/--base-dir` flag, parsed once by the binary
//! - `source`    – filesystem and in-memory [`ConfigSource`] implementations
//! - `watcher`   – debounced `notify` watch that reloads the file and emits changes
//! - `bootstrap` – the [`Config`] handle tying the layers together
//!
//! [`ConfigSource`]: crate::application::load_config::ConfigSource
//! [`Config`]: bootstrap::Config

pub mod bootstrap;
pub mod cli;
pub mod source;
pub mod watcher;
