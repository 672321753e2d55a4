// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),

    #[error("data store query failed: {0}")]
    Query(String),

    #[error("malformed {table} row {id}: {detail}")]
    Integrity {
        table: &'static str,
        id: i64,
        detail: String,
    },
}

impl StoreError {
    /// True when the store itself can no longer serve requests.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseCorrupt
                | ErrorCode::SystemIoFailure
                | ErrorCode::PermissionDenied
                | ErrorCode::DiskFull
                | ErrorCode::ReadOnly,
            ) => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum BonusError {
    #[error("data integrity violation for partner {partner_id}: {detail}")]
    DataIntegrity { partner_id: i64, detail: String },

    #[error("failed to persist bonus for partner {partner_id}: {source}")]
    Persistence {
        partner_id: i64,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_open_is_fatal() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            None,
        );
        let store: StoreError = err.into();
        assert!(store.is_fatal());
    }

    #[test]
    fn constraint_violation_is_not_fatal() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("FOREIGN KEY constraint failed".into()),
        );
        let store: StoreError = err.into();
        assert!(!store.is_fatal());
        assert!(store.to_string().contains("FOREIGN KEY"));
    }
}
