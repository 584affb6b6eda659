//! Reader selection for bulk dispatch.
//!
//! # Invariants
//! - A resolved selection is never empty.
//! - Resolved readers keep roster order, not selection order.

use crate::model::overdue::OverdueReader;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Selection rejected before any dispatch happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// No reader was selected.
    Empty,
    /// A selected id is not on the current roster.
    UnknownReader(String),
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "select at least one reader"),
            Self::UnknownReader(id) => write!(f, "reader `{id}` has no overdue books"),
        }
    }
}

impl Error for SelectionError {}

/// Set of reader ids picked for a bulk send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterSelection {
    reader_ids: BTreeSet<String>,
}

impl RosterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects every reader on `roster`.
    pub fn all(roster: &[OverdueReader]) -> Self {
        roster
            .iter()
            .map(|reader| reader.reader_id.clone())
            .collect()
    }

    /// Flips selection of one reader; returns whether it is now selected.
    pub fn toggle(&mut self, reader_id: &str) -> bool {
        if self.reader_ids.remove(reader_id) {
            false
        } else {
            self.reader_ids.insert(reader_id.to_string());
            true
        }
    }

    pub fn contains(&self, reader_id: &str) -> bool {
        self.reader_ids.contains(reader_id)
    }

    pub fn len(&self) -> usize {
        self.reader_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader_ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.reader_ids.clear();
    }

    /// Resolves the selection against `roster`.
    ///
    /// # Errors
    /// - `Empty` when nothing is selected.
    /// - `UnknownReader` for the first selected id missing from `roster`.
    pub fn resolve(&self, roster: &[OverdueReader]) -> Result<Vec<OverdueReader>, SelectionError> {
        if self.reader_ids.is_empty() {
            return Err(SelectionError::Empty);
        }
        if let Some(missing) = self
            .reader_ids
            .iter()
            .find(|id| !roster.iter().any(|reader| &reader.reader_id == *id))
        {
            return Err(SelectionError::UnknownReader(missing.clone()));
        }

        Ok(roster
            .iter()
            .filter(|reader| self.reader_ids.contains(&reader.reader_id))
            .cloned()
            .collect())
    }
}

impl FromIterator<String> for RosterSelection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            reader_ids: iter
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .collect(),
        }
    }
}
