//! Gladius node launcher entry point.
//!
//! Parses the command line once, loads the node configuration through
//! `gladius-config`, prints the requested values and, with `--watch`, keeps
//! running so edits to the config file are picked up live.
//!
//! # Usage
//!
//! ```text
//! gladius-node [OPTIONS]
//!
//! Options:
//!   -b, --base-dir <DIR>        Base directory [aliases: baseDir]
//!       --config-name <NAME>    Config file stem [default: gladius-node]
//!       --default <KEY=VALUE>   Default value, repeatable
//!       --get <KEY>             Print KEY=VALUE after loading, repeatable
//!       --watch                 Stay running and report config changes
//! ```
//!
//! Without `--get` every known key is printed.
//!
//! # Environment
//!
//! | Variable      | Description                                         |
//! |---------------|-----------------------------------------------------|
//! | `GLADIUSBASE` | Base directory when `-b/--base-dir` is not given    |
//! | `RUST_LOG`    | Log filter, defaults to `info`                      |
//!
//! A config file that exists but cannot be parsed is fatal: the process exits
//! with status 1 and a `fatal error in config file` message.

use anyhow::Context;
use clap::Parser;
use gladius_config::{setup_config, BaseDirArgs, Config};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Gladius node launcher.
#[derive(Debug, Parser)]
#[command(
    name = "gladius-node",
    about = "Loads and live-reloads the Gladius node configuration",
    version
)]
struct Cli {
    #[command(flatten)]
    base: BaseDirArgs,

    /// Config file name without extension.
    ///
    /// `<NAME>.json`, `.toml`, `.yaml` and `.yml` are probed in the working
    /// directory, then in the base directory.
    #[arg(long, default_value = "gladius-node", value_name = "NAME")]
    config_name: String,

    /// Default value used when the config file does not set KEY.
    #[arg(long = "default", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    defaults: Vec<(String, String)>,

    /// Key to print after loading; may be repeated.
    #[arg(long = "get", value_name = "KEY")]
    keys: Vec<String>,

    /// Keep running and log config changes until Ctrl+C.
    #[arg(long)]
    watch: bool,
}

/// Parses a `KEY=VALUE` pair.  The value may be empty or contain `=`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Renders `KEY=VALUE` lines for the requested keys, or every key if none
/// were requested.
fn render_values(config: &Config, keys: &[String]) -> Vec<String> {
    let keys = if keys.is_empty() {
        config.keys()
    } else {
        keys.to_vec()
    };
    keys.iter()
        .map(|key| format!("{key}={}", config.get_string(key)))
        .collect()
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = setup_config(&cli.config_name, cli.defaults.clone(), &cli.base)
        .context("fatal error in config file")?;

    match config.config_file_used() {
        Some(path) => info!("using config file {}", path.display()),
        None => info!("no config file found, running on defaults"),
    }

    for line in render_values(&config, &cli.keys) {
        println!("{line}");
    }

    if cli.watch {
        watch_until_ctrl_c(&config, &cli.keys).await;
    }

    Ok(())
}

/// Logs the requested values after every reload until Ctrl+C.
async fn watch_until_ctrl_c(config: &Config, keys: &[String]) {
    if !config.is_watching() {
        warn!("no config file is being watched; waiting for Ctrl+C only");
    }
    let mut changes = config.subscribe();

    info!("watching for config changes. Press Ctrl+C to exit.");
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::error!("failed to listen for Ctrl+C signal: {e}");
                }
                info!("shutdown signal received");
                break;
            }
            change = changes.recv() => match change {
                Ok(change) if change.reloaded => {
                    for line in render_values(config, keys) {
                        info!("{line}");
                    }
                }
                Ok(change) => {
                    warn!("{} changed but could not be reloaded", change.path.display());
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("missed {skipped} config change notifications");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use gladius_config::SetupOptions;

    #[test]
    fn test_cli_defaults() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["gladius-node"]);

        // Assert
        assert_eq!(cli.config_name, "gladius-node");
        assert_eq!(cli.base.base_dir, None);
        assert!(cli.defaults.is_empty());
        assert!(cli.keys.is_empty());
        assert!(!cli.watch);
    }

    #[test]
    fn test_cli_base_dir_short_flag() {
        let cli = Cli::parse_from(["gladius-node", "-b", "/srv/gladius"]);
        assert_eq!(cli.base.base_dir.as_deref(), Some("/srv/gladius"));
    }

    #[test]
    fn test_cli_repeated_defaults_and_keys() {
        let cli = Cli::parse_from([
            "gladius-node",
            "--default",
            "port=8080",
            "--default",
            "url=http://x/?a=b",
            "--get",
            "port",
            "--get",
            "url",
        ]);
        assert_eq!(
            cli.defaults,
            vec![
                ("port".to_string(), "8080".to_string()),
                ("url".to_string(), "http://x/?a=b".to_string()),
            ]
        );
        assert_eq!(cli.keys, vec!["port", "url"]);
    }

    #[test]
    fn test_cli_rejects_default_without_equals() {
        let result = Cli::try_parse_from(["gladius-node", "--default", "port"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_key_value_allows_empty_value() {
        assert_eq!(
            parse_key_value("name="),
            Ok(("name".to_string(), String::new()))
        );
    }

    #[test]
    fn test_parse_key_value_rejects_empty_key() {
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_render_values_for_requested_keys() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let config = Config::setup(
            SetupOptions::new("node")
                .working_dir(dir.path())
                .defaults([("port", "8080"), ("host", "localhost")]),
        )
        .unwrap();

        // Act
        let lines = render_values(&config, &["port".to_string(), "absent".to_string()]);

        // Assert
        assert_eq!(lines, vec!["port=8080", "absent="]);
    }

    #[test]
    fn test_render_values_lists_all_keys_when_none_requested() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::setup(
            SetupOptions::new("node")
                .working_dir(dir.path())
                .defaults([("port", "8080"), ("host", "localhost")]),
        )
        .unwrap();

        let lines = render_values(&config, &[]);

        assert_eq!(lines, vec!["host=localhost", "port=8080"]);
    }
}
