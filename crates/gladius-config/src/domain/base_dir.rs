//! Gladius base-directory resolution.
//!
//! The base directory is where a node expects its config file to live:
//! - Windows:       `%HOMEDRIVE%%HOMEPATH%\.gladius`
//! - Linux / macOS: `$HOME/.config/gladius`
//!
//! Either default can be replaced, in priority order, by:
//!
//! 1. the `-b/--base-dir` command-line flag;
//! 2. the `GLADIUSBASE` environment variable.
//!
//! An empty value counts as "not provided" and falls through to the next
//! source.  The resolved path is not checked for existence; a missing
//! directory simply yields no config file at load time.

use std::path::PathBuf;

use thiserror::Error;

/// Environment variable that overrides the OS default base directory.
pub const BASE_ENV_VAR: &str = "GLADIUSBASE";

/// Home directory variable used on Linux and macOS.
pub const HOME_ENV_VAR: &str = "HOME";

/// Drive letter variable used on Windows (e.g. `C:`).
pub const HOME_DRIVE_ENV_VAR: &str = "HOMEDRIVE";

/// Drive-relative home path variable used on Windows (e.g. `\Users\alice`).
pub const HOME_PATH_ENV_VAR: &str = "HOMEPATH";

/// Subdirectory of `$HOME` used on Linux and macOS.
const UNIX_BASE_SUBDIR: &str = ".config/gladius";

/// Subdirectory of the Windows home folder.
const WINDOWS_BASE_SUBDIR: &str = ".gladius";

/// Errors produced while resolving the base directory.
///
/// Both variants are recoverable: the loader falls back to searching only
/// the working directory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BaseDirError {
    /// No default location is known for this operating system.
    #[error(
        "unknown operating system '{os}', can't find gladius base directory. \
         Set the GLADIUSBASE environment variable, or use the flag -b <base_dir> to add it manually"
    )]
    UnsupportedOs { os: String },

    /// The variable needed to build the OS default is unset or empty.
    #[error("environment variable {name} is not set, can't compute gladius base directory")]
    MissingEnvVar { name: &'static str },
}

/// Operating system the default base directory is computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    MacOs,
    /// Any other target; carries the OS identifier for error messages.
    Other(String),
}

impl HostOs {
    /// The OS this binary was compiled for.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps an OS identifier (as in `std::env::consts::OS`) to a `HostOs`.
    ///
    /// `"darwin"` is accepted as a synonym for `"macos"`.
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "windows" => Self::Windows,
            "linux" => Self::Linux,
            "macos" | "darwin" => Self::MacOs,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The environment variables the resolver looks at, captured once.
///
/// Empty values are stored as `None` so they never short-circuit the
/// priority chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    /// `GLADIUSBASE`
    pub gladius_base: Option<String>,
    /// `HOME`
    pub home: Option<String>,
    /// `HOMEDRIVE`
    pub home_drive: Option<String>,
    /// `HOMEPATH`
    pub home_path: Option<String>,
}

impl EnvSnapshot {
    /// Reads the relevant variables from the current process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a snapshot from an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| non_empty(lookup(name).as_deref());
        Self {
            gladius_base: read(BASE_ENV_VAR),
            home: read(HOME_ENV_VAR),
            home_drive: read(HOME_DRIVE_ENV_VAR),
            home_path: read(HOME_PATH_ENV_VAR),
        }
    }
}

/// Resolves the base directory from already-parsed inputs.
///
/// Priority: `flag` > `GLADIUSBASE` > OS default.
///
/// The OS default is only built from home variables that are actually set.
/// With `HOME` (or `HOMEDRIVE`/`HOMEPATH` on Windows) unset this returns
/// [`BaseDirError::MissingEnvVar`] instead of a root-relative path such as
/// `/.config/gladius`.  [`setup_config`](crate::setup_config) treats that the
/// same as an unsupported OS and searches only the working directory.
///
/// # Errors
///
/// Returns [`BaseDirError::UnsupportedOs`] when no override is given and `os`
/// has no known default, or [`BaseDirError::MissingEnvVar`] when the home
/// variables the default is built from are unset.
pub fn resolve_base_dir(
    flag: Option<&str>,
    env: &EnvSnapshot,
    os: &HostOs,
) -> Result<PathBuf, BaseDirError> {
    if let Some(dir) = non_empty(flag) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = non_empty(env.gladius_base.as_deref()) {
        return Ok(PathBuf::from(dir));
    }
    os_default(env, os)
}

fn os_default(env: &EnvSnapshot, os: &HostOs) -> Result<PathBuf, BaseDirError> {
    match os {
        HostOs::Windows => {
            let drive = require(env.home_drive.as_deref(), HOME_DRIVE_ENV_VAR)?;
            let path = require(env.home_path.as_deref(), HOME_PATH_ENV_VAR)?;
            // Built as a string so the result is the same on every host.
            let path = path.trim_end_matches(['\\', '/']);
            Ok(PathBuf::from(format!("{drive}{path}\\{WINDOWS_BASE_SUBDIR}")))
        }
        HostOs::Linux | HostOs::MacOs => {
            let home = require(env.home.as_deref(), HOME_ENV_VAR)?;
            let home = home.trim_end_matches('/');
            Ok(PathBuf::from(format!("{home}/{UNIX_BASE_SUBDIR}")))
        }
        HostOs::Other(name) => Err(BaseDirError::UnsupportedOs { os: name.clone() }),
    }
}

fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, BaseDirError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(BaseDirError::MissingEnvVar { name })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
