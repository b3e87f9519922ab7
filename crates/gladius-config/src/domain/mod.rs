//! Domain types for configuration bootstrap.
//!
//! Nothing in this module touches the process environment, the filesystem or
//! the clock.  Callers hand in already-captured values (an [`EnvSnapshot`],
//! a [`HostOs`], file contents as a string) so every rule here can be tested
//! on any platform without setup.
//!
//! [`EnvSnapshot`]: base_dir::EnvSnapshot
//! [`HostOs`]: base_dir::HostOs

/// Base-directory resolution rules.
pub mod base_dir;

/// Supported config file formats and their parsing into flat key/value leaves.
pub mod format;

/// Layered defaults + file values with case-insensitive lookup.
pub mod settings;
