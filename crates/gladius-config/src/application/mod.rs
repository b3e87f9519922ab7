//! Application layer: finding and loading the config file.
//!
//! The use case here depends only on the [`ConfigSource`] trait, so it can be
//! exercised against the in-memory `MockConfigSource` in unit tests and
//! against the real filesystem in production.
//!
//! [`ConfigSource`]: load_config::ConfigSource

pub mod load_config;
