//! Config file formats.
//!
//! A config named `gladius-node` may be stored as any of:
//!
//! | Extension       | Format |
//! |-----------------|--------|
//! | `.json`         | JSON   |
//! | `.toml`         | TOML   |
//! | `.yaml`, `.yml` | YAML   |
//!
//! Within one directory the extensions are probed in the order above.
//!
//! Every format is deserialized into the same `serde_json::Value` tree and
//! then flattened: nested tables become dotted keys and keys are lower-cased,
//! so `[Server] Port = 9090` in TOML and `{"server": {"port": 9090}}` in JSON
//! both produce the leaf `server.port = 9090`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Extensions probed for each search path, in priority order.
pub const SUPPORTED_EXTENSIONS: &[(&str, ConfigFormat)] = &[
    ("json", ConfigFormat::Json),
    ("toml", ConfigFormat::Toml),
    ("yaml", ConfigFormat::Yaml),
    ("yml", ConfigFormat::Yaml),
];

/// Separator between nested table names in a flattened key.
pub const KEY_SEPARATOR: char = '.';

/// A config file format understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

/// The file contents could not be turned into key/value leaves.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The text is not valid for its format.
    #[error("{format} syntax error: {message}")]
    Syntax {
        format: ConfigFormat,
        message: String,
    },

    /// The document parsed but its root is a scalar or a list.
    #[error("{format} document must have a table at the top level")]
    NotATable { format: ConfigFormat },
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
        };
        f.write_str(name)
    }
}

impl ConfigFormat {
    /// Looks up the format for a file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        SUPPORTED_EXTENSIONS
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, format)| *format)
    }

    /// Extensions that map to this format, in probe order.
    pub fn extensions(self) -> impl Iterator<Item = &'static str> {
        SUPPORTED_EXTENSIONS
            .iter()
            .filter(move |(_, format)| *format == self)
            .map(|(ext, _)| *ext)
    }

    /// Parses `contents` and flattens it into lower-cased dotted keys.
    ///
    /// Only leaves are kept; a key that names a table (`server` above) is not
    /// present in the result.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Syntax`] for malformed text and
    /// [`FormatError::NotATable`] when the root is not a table.
    pub fn parse(self, contents: &str) -> Result<BTreeMap<String, Value>, FormatError> {
        let mut leaves = BTreeMap::new();
        if self == Self::Yaml && contents.trim().is_empty() {
            return Ok(leaves);
        }
        let tree = self.deserialize_tree(contents)?;
        match tree {
            Value::Object(map) => {
                for (key, value) in map {
                    flatten_into(&mut leaves, key.to_lowercase(), value);
                }
            }
            // `~` or `null` as the whole YAML document.
            Value::Null if self == Self::Yaml => {}
            _ => return Err(FormatError::NotATable { format: self }),
        }
        Ok(leaves)
    }

    fn deserialize_tree(self, contents: &str) -> Result<Value, FormatError> {
        let syntax = |message: String| FormatError::Syntax {
            format: self,
            message,
        };
        match self {
            Self::Json => serde_json::from_str(contents).map_err(|e| syntax(e.to_string())),
            Self::Toml => toml::from_str::<toml::Table>(contents)
                .map(|table| toml_to_json(toml::Value::Table(table)))
                .map_err(|e| syntax(e.to_string())),
            Self::Yaml => serde_yaml::from_str(contents).map_err(|e| syntax(e.to_string())),
        }
    }
}

/// Converts a TOML tree without going through serde, which would expose
/// datetimes as a private marker table.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map_or_else(|| Value::String(f.to_string()), Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

fn flatten_into(leaves: &mut BTreeMap<String, Value>, prefix: String, value: Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = format!("{prefix}{KEY_SEPARATOR}{}", key.to_lowercase());
                flatten_into(leaves, key, child);
            }
        }
        leaf => {
            leaves.insert(prefix, leaf);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
