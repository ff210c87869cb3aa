//! Attribute trees - hierarchical key/value state
//!
//! Effects persist into one tree per instance. Reads always take a default so
//! a partial or malformed tree degrades to "keep the default" instead of
//! failing. Keys keep insertion order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered, string-keyed tree of booleans, numbers, strings and sub-trees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeTree {
    values: Map<String, Value>,
}

impl AttributeTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; only objects form a tree
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self { values }),
            _ => None,
        }
    }

    /// Convert into a JSON object value
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Get a boolean, or `default` if missing or not a boolean
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Get an integer; floats are truncated
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .unwrap_or(default),
            None => default,
        }
    }

    /// Get a float; integers are widened
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.values
            .get(key)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    /// Get a string, or `default` if missing or not a string
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// Get a nested tree (cloned)
    pub fn get_tree(&self, key: &str) -> Option<AttributeTree> {
        match self.values.get(key) {
            Some(Value::Object(map)) => Some(Self {
                values: map.clone(),
            }),
            _ => None,
        }
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    /// Set a float. Non-finite values are stored as null and read back as the default.
    pub fn set_float(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), Value::from(value));
    }

    pub fn set_string(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    pub fn set_tree(&mut self, key: &str, tree: AttributeTree) {
        self.values.insert(key.to_string(), tree.into_value());
    }

    /// Iterate over every entry holding a sub-tree
    pub fn subtrees(&self) -> impl Iterator<Item = (&str, AttributeTree)> {
        self.values.iter().filter_map(|(k, v)| match v {
            Value::Object(map) => Some((
                k.as_str(),
                AttributeTree {
                    values: map.clone(),
                },
            )),
            _ => None,
        })
    }

    /// Overlay `other` onto this tree. Sub-trees merge recursively, everything
    /// else in `other` replaces the existing value.
    pub fn merge(&mut self, other: &AttributeTree) {
        merge_maps(&mut self.values, &other.values);
    }

    /// Copy of this tree with `other` overlaid
    pub fn merged(&self, other: &AttributeTree) -> AttributeTree {
        let mut tree = self.clone();
        tree.merge(other);
        tree
    }
}

fn merge_maps(into: &mut Map<String, Value>, from: &Map<String, Value>) {
    for (key, value) in from {
        match (into.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            _ => {
                into.insert(key.clone(), value.clone());
            }
        }
    }
}

impl From<AttributeTree> for Value {
    fn from(tree: AttributeTree) -> Self {
        tree.into_value()
    }
}
