//! Sled-based storage for reports.
//!
//! Reports are keyed by event id, which makes the event id unique across all
//! users. Lookups on behalf of a user additionally check ownership.

use crate::report::Report;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result of an insert that must not overwrite.
#[derive(Debug)]
pub enum InsertOutcome {
    /// The report was stored
    Inserted,
    /// A report for the same event id already existed and was kept
    Conflict(Report),
}

/// Sled-based storage for meeting reports.
pub struct ReportStore {
    db: sled::Db,
}

impl ReportStore {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// In-memory store that is discarded on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Look up a user's report for an event
    pub fn find(&self, user_id: &str, event_id: &str) -> Result<Option<Report>, StorageError> {
        Ok(self
            .find_by_event(event_id)?
            .filter(|report| report.user_id == user_id))
    }

    /// Look up the report for an event regardless of owner
    pub fn find_by_event(&self, event_id: &str) -> Result<Option<Report>, StorageError> {
        match self.db.get(event_id.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Store a report unless one already exists for its event id
    pub fn insert(&self, report: &Report) -> Result<InsertOutcome, StorageError> {
        let value = serde_json::to_vec(report)?;
        loop {
            let swapped = self.db.compare_and_swap(
                report.event_id.as_bytes(),
                None as Option<&[u8]>,
                Some(value.as_slice()),
            )?;

            match swapped {
                Ok(()) => {
                    self.db.flush()?;
                    return Ok(InsertOutcome::Inserted);
                }
                Err(conflict) => match conflict.current {
                    Some(current) => {
                        debug!(event_id = %report.event_id, "insert conflict on event id");
                        return Ok(InsertOutcome::Conflict(serde_json::from_slice(&current)?));
                    }
                    // Removed between the failed swap and now; try again
                    None => continue,
                },
            }
        }
    }

    /// All reports owned by a user, newest first
    pub fn list_by_user(&self, user_id: &str) -> Result<Vec<Report>, StorageError> {
        let mut results = Vec::new();
        for item in self.db.iter() {
            let (_key, value) = item?;
            let report: Report = serde_json::from_slice(&value)?;
            if report.user_id == user_id {
                results.push(report);
            }
        }
        // Sort by created_at descending (newest first)
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// Delete one report if it exists and belongs to the user
    pub fn delete_one(&self, report_id: Uuid, user_id: &str) -> Result<bool, StorageError> {
        for item in self.db.iter() {
            let (key, value) = item?;
            let report: Report = serde_json::from_slice(&value)?;
            if report.id == report_id {
                if report.user_id != user_id {
                    return Ok(false);
                }
                let existed = self.db.remove(key)?.is_some();
                self.db.flush()?;
                return Ok(existed);
            }
        }
        Ok(false)
    }

    /// Delete every report owned by a user, returning how many were removed
    pub fn clear_user(&self, user_id: &str) -> Result<usize, StorageError> {
        let mut keys = Vec::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            let report: Report = serde_json::from_slice(&value)?;
            if report.user_id == user_id {
                keys.push(key);
            }
        }

        let mut removed = 0;
        for key in keys {
            if self.db.remove(key)?.is_some() {
                removed += 1;
            }
        }
        self.db.flush()?;
        Ok(removed)
    }

    /// Get the number of stored reports
    pub fn count(&self) -> usize {
        self.db.len()
    }
}
