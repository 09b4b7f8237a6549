//! The inspection collection as a single JSON blob.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::record::InspectionRecord;

use super::KeyValueStore;

/// Reads and writes the whole record collection under one key.
#[derive(Debug)]
pub struct LocalStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> LocalStore<S> {
    /// Wrap a key-value backend, storing the collection under `key`.
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// The underlying key-value backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// The key the collection is stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored records.
    ///
    /// A missing key or a stored `null` is an empty collection. Entries that
    /// fail validation are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the blob is not a JSON array.
    pub fn load(&self) -> Result<Vec<InspectionRecord>> {
        let Some(blob) = self.backend.get(&self.key)? else {
            debug!("No stored inspections under {}", self.key);
            return Ok(Vec::new());
        };

        let entries: Option<Vec<Value>> = serde_json::from_str(&blob)?;
        let entries = entries.unwrap_or_default();
        let total = entries.len();

        let records: Vec<_> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match InspectionRecord::from_stored_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping stored inspection #{}: {}", index, e);
                    None
                }
            })
            .collect();

        debug!("Loaded {} of {} stored inspections", records.len(), total);
        Ok(records)
    }

    /// Replace the stored collection.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn save(&self, records: &[InspectionRecord]) -> Result<()> {
        let blob = serde_json::to_string(records)?;
        self.backend.set(&self.key, &blob)?;
        debug!("Saved {} inspections under {}", records.len(), self.key);
        Ok(())
    }
}
