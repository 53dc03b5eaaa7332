// SPDX-FileCopyrightText: 2026 Frilans Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection setup: PRAGMAs, migrations, and checkpointing.
//!
//! All statements run on tokio-rusqlite's single background thread. Do not
//! open a second connection for writes.

use std::path::Path;

use frilans_core::FrilansError;
use tracing::debug;

use crate::migrations;

/// Handle to the single serialized SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode.
    pub async fn open(path: &str) -> Result<Self, FrilansError> {
        Self::open_with(path, true).await
    }

    /// Open the database at `path`, migrating it to the latest schema.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, FrilansError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| FrilansError::Persistence {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| FrilansError::Persistence {
                source: Box::new(e),
            })?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| -> Result<(), refinery::Error> {
            migrations::run_migrations(conn)
        })
        .await
        .map_err(|e| FrilansError::Persistence {
            source: Box::new(e),
        })?;

        debug!(path, wal_mode, "database opened and migrated");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Fold the WAL back into the main database file.
    pub async fn checkpoint(&self) -> Result<(), FrilansError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)
    }
}

/// Convert a tokio-rusqlite error into [`FrilansError::Persistence`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FrilansError {
    FrilansError::Persistence {
        source: Box::new(e),
    }
}
