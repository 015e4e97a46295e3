//! Fingerprint keys for error deduplication.
//!
//! A fingerprint is the concatenation of the values of a configured, ordered
//! list of context property names. It is deliberately coarser than the message
//! text: two errors carrying the same values for the configured properties are
//! "the same" error for throttling purposes, whatever they say.
//!
//! Missing properties contribute nothing. With no configured keys every record
//! maps to the empty key.

use crate::domain::record::LogRecord;
use std::fmt;

/// Ordered list of context property names used to build fingerprints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MdcKeys(Vec<String>);

impl MdcKeys {
    /// Create a key list from property names, dropping empty names.
    pub fn new<I, T>(keys: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(
            keys.into_iter()
                .map(Into::into)
                .filter(|key| !key.is_empty())
                .collect(),
        )
    }

    /// Parse a comma-separated list such as `"tenant, req_id"`.
    ///
    /// Names are trimmed and empty segments are ignored; order is preserved.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for MdcKeys {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl From<Vec<String>> for MdcKeys {
    fn from(keys: Vec<String>) -> Self {
        Self::new(keys)
    }
}

/// Deduplication identity of a log record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FingerprintKey(String);

impl FingerprintKey {
    /// Derive the key of `record` for the given property names.
    ///
    /// Values are concatenated in key order with no separator.
    pub fn of(record: &LogRecord, keys: &MdcKeys) -> Self {
        let key = keys
            .as_slice()
            .iter()
            .filter_map(|name| record.property(name))
            .collect::<String>();
        FingerprintKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FingerprintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
