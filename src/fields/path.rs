//! Dotted field paths
//!
//! A `FieldPath` names a logical field such as
//! `error.exception.stacktrace.filename`. Equality is plain string equality;
//! the only structure is the `.` separating segments.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use super::errors::{FieldError, FieldResult};

/// A dotted field path.
///
/// Paths built with [`FieldPath::parse`] are guaranteed to be non-empty and
/// free of empty segments. Paths derived from payload keys go through
/// [`FieldPath::child`], which does not re-check user supplied keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(String);

impl FieldPath {
    /// Parses and validates a dotted path.
    pub fn parse(path: impl Into<String>) -> FieldResult<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(FieldError::EmptyPath);
        }
        if path.split('.').any(str::is_empty) {
            return Err(FieldError::EmptySegment(path));
        }
        Ok(Self(path))
    }

    /// Appends a segment. An empty `self` yields the segment alone.
    pub fn child(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}.{}", self.0, segment))
        }
    }

    /// The empty root path, only used as a traversal seed.
    pub(crate) fn root() -> Self {
        Self(String::new())
    }

    /// Returns the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the traversal seed
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the dot separated segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns true if `self` equals `prefix` or lies below it.
    ///
    /// `error.log` covers `error.log.message` but not `error.logger`.
    pub fn is_within(&self, prefix: &str) -> bool {
        within_prefix(prefix, &self.0)
    }
}

/// Prefix semantics for groups: the prefix itself or anything below it.
pub(crate) fn within_prefix(prefix: &str, path: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with('.'),
        None => false,
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FieldPath {
    type Error = FieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = FieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0
    }
}
