//! Read-only view over a loaded configuration snapshot.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::remote::types::{ConfigError, ConfigResult};

/// Snapshot of the remote configuration taken at load time.
///
/// Lookups take path segments relative to the stripped prefix, so a key
/// stored as `<prefix>/mysql/host` is read with `&["mysql", "host"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigHandle {
    tree: Value,
    source: String,
    loaded_keys: usize,
}

impl ConfigHandle {
    pub(crate) fn new(tree: Value, source: impl Into<String>, loaded_keys: usize) -> Self {
        Self {
            tree,
            source: source.into(),
            loaded_keys,
        }
    }

    /// A handle with no keys.
    pub fn empty(source: impl Into<String>) -> Self {
        Self::new(Value::Object(Map::new()), source, 0)
    }

    /// Value at `path`, if any. An empty path returns the whole tree.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.tree, |node, segment| node.get(*segment))
    }

    /// Deserialize the value at `path`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &[&str]) -> ConfigResult<T> {
        let joined = path.join("/");
        let value = self
            .get(path)
            .ok_or_else(|| ConfigError::Missing(joined.clone()))?;
        T::deserialize(value).map_err(|source| ConfigError::Decode {
            path: joined,
            source,
        })
    }

    /// String value at `path`, if it is a string.
    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Deserialize the whole tree.
    pub fn scan<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        T::deserialize(&self.tree).map_err(|source| ConfigError::Decode {
            path: String::new(),
            source,
        })
    }

    /// Top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tree
            .as_object()
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Number of value-bearing keys read from the store.
    pub fn len(&self) -> usize {
        self.loaded_keys
    }

    pub fn is_empty(&self) -> bool {
        self.loaded_keys == 0
    }

    /// `host:port` the snapshot was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The raw tree.
    pub fn as_value(&self) -> &Value {
        &self.tree
    }
}
