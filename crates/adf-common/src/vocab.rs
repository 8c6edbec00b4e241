//! Controlled-vocabulary translation tables
//!
//! Each extractor maps MGI vocabulary terms to external ontology IDs or
//! normalized names through static tables. A term with no entry is a data
//! error; what happens next is an explicit per-table policy rather than an
//! accident of which extractor hit it.

use tracing::warn;

use crate::error::{AdfError, Result};

/// What a translation table does on a missing term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissPolicy {
    /// Log a structured warning and let the caller skip the record.
    Skip,
    /// Fail the run: a miss means the table itself is out of date.
    Fail,
}

/// A static source-term → target mapping with an explicit miss policy.
pub struct TranslationTable {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
    policy: MissPolicy,
}

impl TranslationTable {
    pub const fn new(
        name: &'static str,
        entries: &'static [(&'static str, &'static str)],
        policy: MissPolicy,
    ) -> Self {
        Self { name, entries, policy }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Translate a term.
    ///
    /// `Ok(None)` means the term was missing and the table's policy is
    /// `Skip` (a warning has been logged); the caller drops the dependent
    /// record or field.
    pub fn translate(&self, term: &str) -> Result<Option<&'static str>> {
        match self.entries.iter().find(|(source, _)| *source == term) {
            Some((_, target)) => Ok(Some(target)),
            None => match self.policy {
                MissPolicy::Skip => {
                    warn!(table = self.name, term, "Term missing from translation table");
                    Ok(None)
                }
                MissPolicy::Fail => Err(AdfError::VocabularyMiss {
                    table: self.name,
                    term: term.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ENTRIES: &[(&str, &str)] = &[
        ("Deletion", "SO:0000159"),
        ("Insertion", "SO:0000667"),
    ];

    #[test]
    fn test_hit() {
        let table = TranslationTable::new("test", TEST_ENTRIES, MissPolicy::Fail);
        assert_eq!(table.translate("Deletion").unwrap(), Some("SO:0000159"));
    }

    #[test]
    fn test_miss_with_skip_policy() {
        let table = TranslationTable::new("test", TEST_ENTRIES, MissPolicy::Skip);
        assert_eq!(table.translate("Inversion").unwrap(), None);
    }

    #[test]
    fn test_miss_with_fail_policy() {
        let table = TranslationTable::new("test", TEST_ENTRIES, MissPolicy::Fail);
        let err = table.translate("Inversion").unwrap_err();
        assert!(matches!(err, AdfError::VocabularyMiss { table: "test", .. }));
    }
}
