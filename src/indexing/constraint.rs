//! Keyword indexing limits

use crate::fields::FieldCatalogEntry;

/// Longest string the backend indexes for exact matching
pub const DEFAULT_KEYWORD_LIMIT: usize = 1024;

/// Characters never allowed in dynamic map keys
pub const DISALLOWED_KEY_CHARS: [char; 3] = ['.', '*', '"'];

/// Limit that applies to one catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordConstraint {
    pub max_length: usize,
}

impl Default for KeywordConstraint {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_KEYWORD_LIMIT,
        }
    }
}

impl KeywordConstraint {
    /// The entry's override, or the default limit
    pub fn for_entry(entry: &FieldCatalogEntry) -> Self {
        Self {
            max_length: entry.max_length.unwrap_or(DEFAULT_KEYWORD_LIMIT),
        }
    }

    /// Length is counted in characters, not bytes.
    pub fn accepts_value(&self, value: &str) -> bool {
        value.chars().count() <= self.max_length
    }

    pub fn accepts_key(&self, key: &str) -> bool {
        self.accepts_value(key) && !key.contains(&DISALLOWED_KEY_CHARS[..])
    }

    /// A value exactly at the limit
    pub fn value_at_limit(&self) -> String {
        "x".repeat(self.max_length)
    }

    /// The shortest value over the limit
    pub fn value_over_limit(&self) -> String {
        "x".repeat(self.max_length + 1)
    }
}
