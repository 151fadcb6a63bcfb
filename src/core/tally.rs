//! # Tally
//!
//! In-memory key counts plus whole-file JSON persistence.
//!
//! ```text
//! Tally
//! └── inner: Mutex<Inner>
//!     ├── counts: HashMap<String, u64>   // key-identifier → presses
//!     └── revision: u64                  // bumped on every mutation
//! ```
//!
//! Every public method takes the one lock for its whole duration, so a
//! `save()` always writes a consistent snapshot even while the capture
//! thread keeps incrementing.
//!
//! Saves write `<file name>.tmp` and then `rename()` it over the target, so the
//! file on disk is either the old tally or the new one, never half of each.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum TallyError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for TallyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TallyError::Io(e) => write!(f, "tally I/O error: {e}"),
            TallyError::Json(e) => write!(f, "tally format error: {e}"),
        }
    }
}

impl std::error::Error for TallyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TallyError::Io(e) => Some(e),
            TallyError::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for TallyError {
    fn from(e: io::Error) -> Self {
        TallyError::Io(e)
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(e: serde_json::Error) -> Self {
        TallyError::Json(e)
    }
}

impl TallyError {
    /// True when the tally file simply doesn't exist yet (first run).
    pub fn is_not_found(&self) -> bool {
        matches!(self, TallyError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

// ============================================================================
// Counter Store
// ============================================================================

#[derive(Debug, Default)]
struct Inner {
    counts: HashMap<String, u64>,
    revision: u64,
}

#[derive(Debug, Default)]
pub struct Tally {
    inner: Mutex<Inner>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the guard can't leave the map half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds one press for `key`, inserting it with a count of 1 if absent.
    pub fn increment(&self, key: &str) {
        let mut inner = self.lock();
        match inner.counts.get_mut(key) {
            // Saturate rather than wrap: counts never go down
            Some(count) => *count = count.saturating_add(1),
            None => {
                inner.counts.insert(key.to_string(), 1);
            }
        }
        inner.revision += 1;
    }

    /// Press count for `key` (0 if never pressed).
    pub fn count(&self, key: &str) -> u64 {
        self.lock().counts.get(key).copied().unwrap_or(0)
    }

    /// Sorted copy of all counts.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        sorted(&self.lock().counts)
    }

    pub fn len(&self) -> usize {
        self.lock().counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().counts.is_empty()
    }

    /// Sum of all presses across every key.
    pub fn total(&self) -> u64 {
        self.lock()
            .counts
            .values()
            .fold(0u64, |total, count| total.saturating_add(*count))
    }

    /// Mutation counter. Changes whenever the counts change; used to skip
    /// saves when nothing happened.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Writes the whole tally to `path`, replacing any existing file.
    ///
    /// Returns the revision that was written.
    pub fn save(&self, path: &Path) -> Result<u64, TallyError> {
        let inner = self.lock();
        let mut json = serde_json::to_string_pretty(&sorted(&inner.counts))?;
        json.push('\n');

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = tmp_path_for(path);
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;

        debug!(
            "Saved {} keys (revision {}) to {}",
            inner.counts.len(),
            inner.revision,
            path.display()
        );
        Ok(inner.revision)
    }

    /// Replaces the tally with the contents of `path`.
    ///
    /// On any error (missing file, bad JSON, negative counts) the current
    /// counts are left untouched. Returns the number of keys loaded.
    pub fn load(&self, path: &Path) -> Result<usize, TallyError> {
        let json = fs::read_to_string(path)?;
        let counts: HashMap<String, u64> = serde_json::from_str(&json)?;
        let loaded = counts.len();

        let mut inner = self.lock();
        inner.counts = counts;
        inner.revision += 1;
        Ok(loaded)
    }
}

/// `key_counts.json` → `key_counts.json.tmp`, so the scratch file never
/// collides with a sibling that merely shares the stem.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn sorted(counts: &HashMap<String, u64>) -> BTreeMap<String, u64> {
    counts.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

/// Keys ordered by press count (descending), ties broken alphabetically.
pub fn top_keys(counts: &BTreeMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}
