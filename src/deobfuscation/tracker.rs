//! Consistency tracking of renames made during a run.
//!
//! Every successful rename is recorded as a [`RenameRecord`] holding the element's
//! original name and the name it was given. Later rules consult the tracker to refuse
//! conflicting reassignments, and reports use it to show a base type by its *assigned*
//! name. Records are never rolled back.

use std::collections::HashMap;

use crate::metadata::{module::ElementKind, token::Token};

/// One renamed element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    /// The element
    pub token: Token,
    /// Its kind
    pub kind: ElementKind,
    /// Its declaring scope at the time of the first rename
    pub scope: String,
    /// The name before the first rename
    pub original: String,
    /// The name given by the latest rename
    pub assigned: String,
}

/// All renames and visibility changes of one run, in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct RenameTracker {
    records: Vec<RenameRecord>,
    by_token: HashMap<Token, usize>,
    publicized: Vec<Token>,
}

impl RenameTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `token` was renamed from `original` to `assigned`.
    ///
    /// A second rename of the same element keeps the first original name and scope.
    pub fn record(
        &mut self,
        token: Token,
        kind: ElementKind,
        scope: String,
        original: String,
        assigned: String,
    ) {
        if let Some(index) = self.by_token.get(&token) {
            self.records[*index].assigned = assigned;
            return;
        }

        self.by_token.insert(token, self.records.len());
        self.records.push(RenameRecord {
            token,
            kind,
            scope,
            original,
            assigned,
        });
    }

    /// Records that `token` was made public.
    pub fn record_publicized(&mut self, token: Token) {
        if !self.publicized.contains(&token) {
            self.publicized.push(token);
        }
    }

    /// The record for `token`, if it was renamed.
    #[must_use]
    pub fn get(&self, token: Token) -> Option<&RenameRecord> {
        self.by_token.get(&token).map(|index| &self.records[*index])
    }

    /// The name assigned to `token` in this run.
    #[must_use]
    pub fn assigned_name(&self, token: Token) -> Option<&str> {
        self.get(token).map(|r| r.assigned.as_str())
    }

    /// The name `token` had before this run renamed it.
    #[must_use]
    pub fn original_name(&self, token: Token) -> Option<&str> {
        self.get(token).map(|r| r.original.as_str())
    }

    /// All records, in rename order.
    #[must_use]
    pub fn records(&self) -> &[RenameRecord] {
        &self.records
    }

    /// Records of elements declared in `scope`.
    #[must_use]
    pub fn for_scope(&self, scope: &str) -> Vec<&RenameRecord> {
        self.records.iter().filter(|r| r.scope == scope).collect()
    }

    /// Elements made public, in order.
    #[must_use]
    pub fn publicized(&self) -> &[Token] {
        &self.publicized
    }

    /// Number of renamed elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing was renamed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TableId;

    #[test]
    fn test_second_rename_keeps_original() {
        let mut tracker = RenameTracker::new();
        let token = Token::from_parts(TableId::TypeDef, 3);
        tracker.record(token, ElementKind::Type, String::new(), "a".into(), "World".into());
        tracker.record(token, ElementKind::Type, "x".into(), "World".into(), "GameWorld".into());

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.original_name(token), Some("a"));
        assert_eq!(tracker.assigned_name(token), Some("GameWorld"));
        assert_eq!(tracker.for_scope("").len(), 1);
    }

    #[test]
    fn test_publicized_deduplicates() {
        let mut tracker = RenameTracker::new();
        let token = Token::from_parts(TableId::Field, 1);
        tracker.record_publicized(token);
        tracker.record_publicized(token);
        assert_eq!(tracker.publicized(), &[token]);
        assert!(tracker.is_empty());
    }
}
