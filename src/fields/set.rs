//! Named sets of field paths with prefix groups
//!
//! A set member is either a literal path or a group that stands for a path
//! and all of its descendants. Groups are never expanded eagerly; every
//! operation asks [`Member::matches`] against the paths it is given.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::errors::FieldResult;
use super::path::{within_prefix, FieldPath};

/// A single member of a [`NamedSet`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Member {
    /// Matches exactly this path
    Literal(FieldPath),
    /// Matches the prefix itself and every path below it
    Group {
        /// Prefix shared by every matched path
        group: FieldPath,
    },
}

impl Member {
    /// Returns true if this member matches `path`.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Member::Literal(literal) => literal.as_str() == path,
            Member::Group { group } => within_prefix(group.as_str(), path),
        }
    }

    /// The path (or prefix) carried by the member
    pub fn path(&self) -> &FieldPath {
        match self {
            Member::Literal(path) => path,
            Member::Group { group } => group,
        }
    }
}

/// An ordered, read-only collection of literal and group members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedSet {
    name: String,
    members: Vec<Member>,
    literals: HashSet<String>,
}

impl NamedSet {
    /// Creates a set from already validated members.
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = Member>) -> Self {
        let mut set = Self {
            name: name.into(),
            members: Vec::new(),
            literals: HashSet::new(),
        };
        for member in members {
            set.push(member);
        }
        set
    }

    /// An empty set with a name.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Starts a builder that validates paths on `build`.
    pub fn builder(name: impl Into<String>) -> NamedSetBuilder {
        NamedSetBuilder {
            name: name.into(),
            pending: Vec::new(),
        }
    }

    /// Builds a set of literal members.
    pub fn from_paths<'a>(name: impl Into<String>, paths: impl IntoIterator<Item = &'a FieldPath>) -> Self {
        Self::new(name, paths.into_iter().cloned().map(Member::Literal))
    }

    fn push(&mut self, member: Member) {
        if self.members.contains(&member) {
            return;
        }
        if let Member::Literal(path) = &member {
            self.literals.insert(path.as_str().to_string());
        }
        self.members.push(member);
    }

    /// Name used in reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in insertion order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Number of members (groups count once)
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the set has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Checks literal members first, then each group prefix.
    pub fn contains(&self, path: &str) -> bool {
        if self.literals.contains(path) {
            return true;
        }
        self.members
            .iter()
            .any(|member| matches!(member, Member::Group { .. }) && member.matches(path))
    }

    /// Every path of `universe` that no member matches, in universe order.
    pub fn difference<'a, I>(&self, universe: I) -> Vec<FieldPath>
    where
        I: IntoIterator<Item = &'a FieldPath>,
    {
        universe
            .into_iter()
            .filter(|path| !self.contains(path.as_str()))
            .cloned()
            .collect()
    }

    /// A new set holding the members of both, named after `self`.
    pub fn union(&self, other: &NamedSet) -> NamedSet {
        let mut merged = self.clone();
        for member in &other.members {
            merged.push(member.clone());
        }
        merged
    }
}

/// Collects raw member strings and validates them all at once.
#[derive(Debug)]
pub struct NamedSetBuilder {
    name: String,
    pending: Vec<(String, bool)>,
}

impl NamedSetBuilder {
    /// Adds a literal member
    pub fn literal(mut self, path: impl Into<String>) -> Self {
        self.pending.push((path.into(), false));
        self
    }

    /// Adds a group member
    pub fn group(mut self, prefix: impl Into<String>) -> Self {
        self.pending.push((prefix.into(), true));
        self
    }

    /// Adds several literal members
    pub fn literals<S: Into<String>>(mut self, paths: impl IntoIterator<Item = S>) -> Self {
        self.pending
            .extend(paths.into_iter().map(|path| (path.into(), false)));
        self
    }

    /// Validates every path and builds the set.
    pub fn build(self) -> FieldResult<NamedSet> {
        let members = self
            .pending
            .into_iter()
            .map(|(raw, is_group)| {
                let path = FieldPath::parse(raw)?;
                Ok(if is_group {
                    Member::Group { group: path }
                } else {
                    Member::Literal(path)
                })
            })
            .collect::<FieldResult<Vec<_>>>()?;
        Ok(NamedSet::new(self.name, members))
    }
}
