//! [`ConfigSource`] implementations.
//!
//! - `fs`   – the real filesystem, used in production
//! - `mock` – an in-memory map of paths to contents, used in unit tests
//!
//! [`ConfigSource`]: crate::application::load_config::ConfigSource

pub mod fs;
pub mod mock;

pub use fs::FsConfigSource;
pub use mock::MockConfigSource;
