//! Schema migrations.
//!
//! Each migration is a struct implementing [`Migration`] with a
//! timestamp-style version and SQL statement lists for `up()`/`down()`. The
//! [`Migrator`] tracks applied versions in a `schema_migrations` state table,
//! verifies SHA-256 checksums of applied migrations, and applies pending
//! ones in version order — each inside its own transaction.

mod core_tables;
mod migrator;

pub use core_tables::CreateCoreTables;
pub use migrator::Migrator;

use sha2::{Digest, Sha256};
use std::fmt;

use crate::executor::SqlExecutor;
use crate::store::StorageError;

/// Migration error type
#[derive(Debug)]
pub enum MigrationError {
    /// An applied migration's statements no longer match what was recorded
    ChecksumMismatch {
        version: i64,
        stored: String,
        current: String,
    },
    /// Underlying SQL failure
    Storage(StorageError),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::ChecksumMismatch {
                version,
                stored,
                current,
            } => write!(
                f,
                "Checksum mismatch for migration {}: stored={}, current={}",
                version, stored, current
            ),
            MigrationError::Storage(e) => write!(f, "Migration failed: {}", e),
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<StorageError> for MigrationError {
    fn from(err: StorageError) -> Self {
        MigrationError::Storage(err)
    }
}

/// Trait that all migrations implement
pub trait Migration: Send + Sync {
    /// Human-readable identifier
    fn name(&self) -> &str;

    /// Version timestamp (YYYYMMDDHHMMSS)
    fn version(&self) -> i64;

    /// Statements applying the migration, in order
    fn up_statements(&self) -> Vec<&'static str>;

    /// Statements reverting the migration, in order
    fn down_statements(&self) -> Vec<&'static str>;

    /// Apply the migration
    ///
    /// # Errors
    ///
    /// Returns the first failing statement's error.
    fn up(&self, exec: &dyn SqlExecutor) -> Result<(), MigrationError> {
        for sql in self.up_statements() {
            exec.execute(sql, &[])?;
        }
        Ok(())
    }

    /// Revert the migration
    ///
    /// # Errors
    ///
    /// Returns the first failing statement's error.
    fn down(&self, exec: &dyn SqlExecutor) -> Result<(), MigrationError> {
        for sql in self.down_statements() {
            exec.execute(sql, &[])?;
        }
        Ok(())
    }

    /// SHA-256 over the up statements, hex encoded
    ///
    /// Recorded on apply and validated on every later run, so an edited
    /// migration is caught instead of silently diverging from the database.
    fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for sql in self.up_statements() {
            hasher.update(sql.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}
