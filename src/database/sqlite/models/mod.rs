
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One slot of the key-value store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct KeyValueEntry {
    pub key: String,
    pub value: String,
    pub updated_date: NaiveDateTime,
}

impl KeyValueEntry {
    /// Size of the stored value in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.value.len()
    }
}

/// A value waiting to be written under `key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKeyValue<'a> {
    pub key: &'a str,
    pub value: String,
}

impl<'a> NewKeyValue<'a> {
    #[inline]
    pub fn new(key: &'a str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}
