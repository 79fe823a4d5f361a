use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tile::TilePos;

/// Value held in the persisted key/value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StorageValue {
    Bool(bool),
    Number(f64),
    Position { x: i32, y: i32 },
    Text(String),
}

impl StorageValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StorageValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            StorageValue::Number(value) if value.fract() == 0.0 => Some(*value as i32),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<TilePos> {
        match self {
            StorageValue::Position { x, y } => Some(TilePos::new(*x, *y)),
            _ => None,
        }
    }
}

impl From<bool> for StorageValue {
    fn from(value: bool) -> Self {
        StorageValue::Bool(value)
    }
}

impl From<i32> for StorageValue {
    fn from(value: i32) -> Self {
        StorageValue::Number(f64::from(value))
    }
}

impl From<TilePos> for StorageValue {
    fn from(value: TilePos) -> Self {
        StorageValue::Position {
            x: value.x,
            y: value.y,
        }
    }
}

/// Persisted key/value store consumed by objects, NPCs and events.
pub trait Storage {
    fn get(&self, key: &str) -> Option<StorageValue>;
    fn set(&mut self, key: &str, value: StorageValue);

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|value| value.as_bool())
    }

    fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|value| value.as_i32())
    }

    fn get_position(&self, key: &str) -> Option<TilePos> {
        self.get(key).and_then(|value| value.as_position())
    }
}

/// Reads `key` when bound, otherwise (or when the store has no usable value) keeps `fallback`.
pub(crate) fn bound_bool(storage: &dyn Storage, key: Option<&str>, fallback: bool) -> bool {
    key.and_then(|key| storage.get_bool(key)).unwrap_or(fallback)
}

pub(crate) fn bound_i32(storage: &dyn Storage, key: Option<&str>, fallback: i32) -> i32 {
    key.and_then(|key| storage.get_i32(key)).unwrap_or(fallback)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryStorage {
    values: HashMap<String, StorageValue>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<StorageValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<StorageValue> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: StorageValue) {
        self.values.insert(key.to_string(), value);
    }
}
