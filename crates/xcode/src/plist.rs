//! Values of the OpenStep-style property list used by `project.pbxproj`

use std::fmt;

/// A property-list value
///
/// Xcode writes object references as a bare id followed by a display
/// comment (`ABC123 /* Plugin.swift */`). Such strings parse as
/// [`Value::Annotated`] so the comment survives a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Annotated(String, String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    /// The string content, ignoring any annotation
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Annotated(s, _) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// True if this value is the string `s`, annotated or not
    pub fn is_str(&self, s: &str) -> bool {
        self.as_str() == Some(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Dict> for Value {
    fn from(dict: Dict) -> Self {
        Value::Dict(dict)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// A dictionary that keeps its keys in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict {
    entries: Vec<(String, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    pub fn get_dict(&self, key: &str) -> Option<&Dict> {
        self.get(key).and_then(Value::as_dict)
    }

    /// The `isa` of an object dictionary
    pub fn isa(&self) -> Option<&str> {
        self.get_str("isa")
    }

    /// Insert a value, replacing an existing key in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style [`Dict::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Get an array value, creating an empty one when the key is absent
    ///
    /// A new key goes where Xcode writes it: after `isa`, in key order.
    pub fn array_entry(&mut self, key: &str) -> &mut Vec<Value> {
        let index = match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                let index = self.ordered_position(key);
                self.entries
                    .insert(index, (key.to_string(), Value::Array(Vec::new())));
                index
            }
        };

        let slot = &mut self.entries[index].1;
        if !matches!(slot, Value::Array(_)) {
            *slot = Value::Array(Vec::new());
        }
        match slot {
            Value::Array(items) => items,
            _ => unreachable!("array entry was just inserted"),
        }
    }

    /// Index of the first key after `isa` that sorts after `key`
    fn ordered_position(&self, key: &str) -> usize {
        self.entries
            .iter()
            .position(|(k, _)| k != "isa" && k.as_str() > key)
            .unwrap_or(self.entries.len())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<(String, Value)> {
        &mut self.entries
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::Annotated(s, _) => write!(f, "{}", s),
            Value::Array(items) => write!(f, "[{} items]", items.len()),
            Value::Dict(dict) => write!(f, "{{{} entries}}", dict.len()),
        }
    }
}
