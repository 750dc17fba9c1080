//! Set-level comparison of two hint list versions.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hintlist::HintList;

/// Entries added and removed between two list versions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Present in the new list only
    pub added: BTreeSet<String>,
    /// Present in the old list only
    pub removed: BTreeSet<String>,
}

impl DiffResult {
    /// Returns true if the lists hold the same entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Returns true if the change both adds and removes entries
    #[must_use]
    pub fn is_mixed(&self) -> bool {
        !self.added.is_empty() && !self.removed.is_empty()
    }
}

/// `added = new - old`, `removed = old - new`
#[must_use]
pub fn diff(old: &HintList, new: &HintList) -> DiffResult {
    old.diff(new)
}

/// Strictly load both files and diff them.
///
/// # Errors
///
/// Fails before computing anything if either file is unsorted or holds
/// duplicates.
pub fn diff_files(old: &Path, new: &Path) -> Result<DiffResult> {
    let old = HintList::load_strict(old)?;
    let new = HintList::load_strict(new)?;
    Ok(diff(&old, &new))
}
