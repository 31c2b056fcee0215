//! Persistent per-day sequence counters.
//!
//! Stored as a flat JSON object mapping `YYYYMMDD` to the last sequence
//! id handed out for that day:
//!
//! ```json
//! {"20240305": 2, "20240306": 7}
//! ```
//!
//! The whole file is rewritten on every [`CounterStore::save`].

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShotsortError};

/// In-memory counter mapping bound to its backing file.
#[derive(Debug, Clone)]
pub struct CounterStore {
    path: PathBuf,
    counters: BTreeMap<String, u64>,
}

impl CounterStore {
    /// Load counters from `path`, or start empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ShotsortError::Io`] if the file exists but cannot be read.
    /// Returns [`ShotsortError::Counter`] if its contents are not a JSON
    /// object of non-negative integers.
    pub fn load(path: &Path) -> Result<Self> {
        let counters = match fs::read(path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| ShotsortError::Counter {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), days = counters.len(), "loaded counters");

        Ok(Self {
            path: path.to_path_buf(),
            counters,
        })
    }

    /// Reserve the next sequence id for `date`.
    ///
    /// Ids start at 1 and are never handed back, so a reservation that is
    /// not followed by a successful move leaves a gap.
    ///
    /// # Errors
    ///
    /// Returns [`ShotsortError::Counter`] if the day's counter is already
    /// at `u64::MAX`; the stored value is left unchanged.
    pub fn reserve(&mut self, date: &str) -> Result<u64> {
        let last = self.counters.get(date).copied().unwrap_or(0);
        let next = last.checked_add(1).ok_or_else(|| ShotsortError::Counter {
            path: self.path.clone(),
            message: format!("counter for {date} is exhausted ({last})"),
        })?;
        self.counters.insert(date.to_string(), next);
        Ok(next)
    }

    /// Last id handed out for `date`.
    #[must_use]
    pub fn get(&self, date: &str) -> Option<u64> {
        self.counters.get(date).copied()
    }

    /// Iterate `(date, last id)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the backing file with the full mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ShotsortError::Io`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_vec(&self.counters).map_err(|e| ShotsortError::Counter {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
