//! Command-line arguments for the base-directory override.
//!
//! [`BaseDirArgs`] is meant to be flattened into a binary's own `clap`
//! parser so that flags are parsed exactly once, at process entry:
//!
//! ```rust
//! use clap::Parser;
//! use gladius_config::BaseDirArgs;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     base: BaseDirArgs,
//! }
//!
//! let cli = Cli::parse_from(["node", "-b", "/srv/gladius"]);
//! assert_eq!(cli.base.base_dir.as_deref(), Some("/srv/gladius"));
//! ```
//!
//! The `GLADIUSBASE` environment variable is deliberately *not* bound to this
//! flag through clap's `env` feature; the resolver reads it separately so the
//! flag > environment > OS default order stays in one place.

use clap::Args;

/// The base-directory override flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct BaseDirArgs {
    /// The base directory for the gladius node.
    ///
    /// Takes precedence over the GLADIUSBASE environment variable and the
    /// OS default (~/.config/gladius or %HOMEDRIVE%%HOMEPATH%\.gladius).
    #[arg(short = 'b', long = "base-dir", visible_alias = "baseDir", value_name = "DIR")]
    pub base_dir: Option<String>,
}

impl BaseDirArgs {
    /// Convenience constructor for an explicit override.
    pub fn with_base_dir(dir: impl Into<String>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
