//! The persisted hint list.
//!
//! On disk the list is UTF-8 text with one domain per line, sorted ascending,
//! without blank lines or duplicates, and terminated by a newline. In memory it
//! is an ordered set, so every write produces that format regardless of the
//! order entries were inserted in.

use std::collections::BTreeSet;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::diff::DiffResult;
use crate::domain::{normalize, DomainName};
use crate::error::{HintsError, Result};

/// Sorted, duplicate-free set of hint list entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintList {
    entries: BTreeSet<String>,
}

impl HintList {
    /// An empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a list for discovery.
    ///
    /// A missing file yields an empty list. Order is ignored. Every entry is
    /// normalized so membership checks compare canonical forms; entries that
    /// were not canonical are logged and will be written back normalized.
    ///
    /// # Errors
    ///
    /// Fails on IO errors other than "not found", and with
    /// [`HintsError::InvalidDomain`] when a line is not a domain name.
    pub fn load(path: &Path) -> Result<Self> {
        let Some(content) = read_if_exists(path)? else {
            debug!(path = %path.display(), "hint list missing, starting empty");
            return Ok(Self::new());
        };

        let mut list = Self::new();
        for (idx, line) in content_lines(&content) {
            let domain = normalize(line).map_err(|e| match e {
                HintsError::InvalidDomain { input, reason } => HintsError::InvalidDomain {
                    input,
                    reason: format!("{reason} ({}:{})", path.display(), idx + 1),
                },
                other => other,
            })?;
            if domain.as_str() != line {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    entry = line,
                    normalized = %domain,
                    "hint list entry is not normalized"
                );
            }
            list.insert(domain);
        }

        debug!(path = %path.display(), entries = list.len(), "loaded hint list");
        Ok(list)
    }

    /// Load a list for verification.
    ///
    /// A missing file yields an empty list. Entries are kept verbatim so
    /// callers can detect non-canonical names, and the file must already be
    /// sorted and duplicate-free.
    ///
    /// # Errors
    ///
    /// Fails with [`HintsError::UnsortedList`] or
    /// [`HintsError::DuplicateEntry`] on the first violating line.
    pub fn load_strict(path: &Path) -> Result<Self> {
        let content = read_if_exists(path)?.unwrap_or_default();

        let mut entries = BTreeSet::new();
        let mut previous: Option<&str> = None;
        for (idx, line) in content_lines(&content) {
            if let Some(prev) = previous {
                if line == prev {
                    return Err(HintsError::DuplicateEntry {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        entry: line.to_string(),
                    });
                }
                if line < prev {
                    return Err(HintsError::UnsortedList {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        entry: line.to_string(),
                    });
                }
            }
            entries.insert(line.to_string());
            previous = Some(line);
        }

        debug!(path = %path.display(), entries = entries.len(), "loaded hint list (strict)");
        Ok(Self { entries })
    }

    /// Returns true if the canonical form of `domain` is listed
    #[must_use]
    pub fn contains(&self, domain: &DomainName) -> bool {
        self.entries.contains(domain.as_str())
    }

    /// Add a domain. Returns false if it was already present.
    pub fn insert(&mut self, domain: DomainName) -> bool {
        self.entries.insert(domain.into_string())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Set difference against a newer version of the list
    #[must_use]
    pub fn diff(&self, new: &Self) -> DiffResult {
        DiffResult {
            added: new.entries.difference(&self.entries).cloned().collect(),
            removed: self.entries.difference(&new.entries).cloned().collect(),
        }
    }

    /// The persisted file format
    #[must_use]
    pub fn to_file_contents(&self) -> String {
        let mut out = String::with_capacity(self.entries.iter().map(|e| e.len() + 1).sum());
        for entry in &self.entries {
            out.push_str(entry);
            out.push('\n');
        }
        out
    }

    /// Write the list to `path`, replacing any existing file.
    ///
    /// The content goes to a temporary file in the same directory first and
    /// is renamed over the target, so a crash never leaves a truncated list.
    ///
    /// # Errors
    ///
    /// Returns [`HintsError::Persist`] if the temporary file cannot be created,
    /// written or renamed.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let persist_err = |message: String| HintsError::Persist {
            path: path.to_path_buf(),
            message,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| persist_err(e.to_string()))?;
        tmp.write_all(self.to_file_contents().as_bytes())
            .map_err(|e| persist_err(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| persist_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| persist_err(e.error.to_string()))?;

        debug!(path = %path.display(), entries = self.len(), "persisted hint list");
        Ok(())
    }
}

impl FromIterator<DomainName> for HintList {
    fn from_iter<I: IntoIterator<Item = DomainName>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(DomainName::into_string).collect(),
        }
    }
}

impl Extend<DomainName> for HintList {
    fn extend<I: IntoIterator<Item = DomainName>>(&mut self, iter: I) {
        self.entries.extend(iter.into_iter().map(DomainName::into_string));
    }
}

fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-blank trimmed lines with their 0-indexed line numbers
fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}
