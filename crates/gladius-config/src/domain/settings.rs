//! Layered key/value settings.
//!
//! Two layers are kept side by side:
//!
//! - **defaults**: strings supplied by the caller at setup time;
//! - **file**: leaves parsed from the config file (replaced wholesale on
//!   every successful reload).
//!
//! A lookup checks the file layer first and falls back to the defaults.
//! Keys are case-insensitive.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// Defaults plus file values, queried by string key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    defaults: BTreeMap<String, String>,
    file: BTreeMap<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates settings whose only layer is `defaults`.
    pub fn with_defaults<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut settings = Self::new();
        for (key, value) in defaults {
            settings.set_default(key.as_ref(), value);
        }
        settings
    }

    /// Registers a default value; a later call for the same key replaces it.
    pub fn set_default(&mut self, key: &str, value: impl Into<String>) {
        self.defaults.insert(normalize_key(key), value.into());
    }

    /// Replaces the whole file layer with freshly parsed leaves.
    ///
    /// Keys are expected to be normalized already (as produced by
    /// [`ConfigFormat::parse`](super::format::ConfigFormat::parse)).
    pub fn replace_file_layer(&mut self, leaves: BTreeMap<String, Value>) {
        self.file = leaves;
    }

    /// Returns the value for `key`, or `None` when neither layer has it.
    ///
    /// File values win over defaults.  Numbers and booleans are rendered in
    /// their usual text form; null, lists and tables render as `""`.
    pub fn get(&self, key: &str) -> Option<String> {
        let key = normalize_key(key);
        if let Some(value) = self.file.get(&key) {
            return Some(render(value));
        }
        self.defaults.get(&key).cloned()
    }

    /// Like [`get`](Self::get) but yields `""` for a missing key.
    pub fn get_string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default()
    }

    /// Whether either layer defines `key`.
    pub fn is_set(&self, key: &str) -> bool {
        let key = normalize_key(key);
        self.file.contains_key(&key) || self.defaults.contains_key(&key)
    }

    /// All known keys across both layers, sorted and de-duplicated.
    pub fn keys(&self) -> Vec<String> {
        self.file
            .keys()
            .chain(self.defaults.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of leaves currently loaded from the file.
    pub fn file_len(&self) -> usize {
        self.file.len()
    }
}

/// Canonical form of a lookup key: trimmed and lower-cased.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
