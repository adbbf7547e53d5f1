//! Migration runner.

use std::collections::HashMap;

use super::{CreateCoreTables, Migration, MigrationError};
use crate::executor::SqlExecutor;

const STATE_TABLE_DDL: &str = r#"CREATE TABLE IF NOT EXISTS schema_migrations (
    version BIGINT PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    checksum VARCHAR(64) NOT NULL,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)"#;

/// Applies registered migrations in version order
///
/// Applied versions are recorded in `schema_migrations` together with a
/// checksum of their statements; a later run with edited statements fails
/// instead of leaving the database silently out of sync.
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    /// A migrator with this crate's schema registered
    pub fn new() -> Self {
        let mut migrator = Migrator {
            migrations: Vec::new(),
        };
        migrator.register(Box::new(CreateCoreTables));
        migrator
    }

    /// A migrator with no registered migrations (for composition and tests)
    pub fn empty() -> Self {
        Migrator {
            migrations: Vec::new(),
        }
    }

    /// Register a migration, keeping the list version-ordered
    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
        self.migrations.sort_by_key(|m| m.version());
    }

    /// Registered versions in apply order
    pub fn versions(&self) -> Vec<i64> {
        self.migrations.iter().map(|m| m.version()).collect()
    }

    /// Apply every pending migration, returning how many ran
    ///
    /// Each migration runs inside its own transaction together with its
    /// state-table record, so a failed migration leaves no partial schema.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::ChecksumMismatch`] if an applied migration's
    /// statements changed, or the underlying SQL error (after rollback of the
    /// failing migration's transaction).
    pub fn run(&self, exec: &dyn SqlExecutor) -> Result<u32, MigrationError> {
        exec.execute(STATE_TABLE_DDL, &[])?;

        let applied = self.applied_checksums(exec)?;
        let mut ran = 0u32;

        for migration in &self.migrations {
            let version = migration.version();
            let checksum = migration.checksum();

            if let Some(stored) = applied.get(&version) {
                if *stored != checksum {
                    return Err(MigrationError::ChecksumMismatch {
                        version,
                        stored: stored.clone(),
                        current: checksum,
                    });
                }
                continue;
            }

            log::info!("applying migration {} {}", version, migration.name());
            exec.execute("BEGIN", &[])?;
            let result = migration.up(exec).and_then(|()| {
                exec.execute(
                    "INSERT INTO schema_migrations (version, name, checksum) VALUES ($1, $2, $3)",
                    &[&version, &migration.name(), &checksum.as_str()],
                )
                .map(|_| ())
                .map_err(MigrationError::from)
            });
            match result {
                Ok(()) => {
                    exec.execute("COMMIT", &[])?;
                    ran += 1;
                }
                Err(e) => {
                    let _ = exec.execute("ROLLBACK", &[]);
                    return Err(e);
                }
            }
        }

        Ok(ran)
    }

    fn applied_checksums(
        &self,
        exec: &dyn SqlExecutor,
    ) -> Result<HashMap<i64, String>, MigrationError> {
        let rows = exec.query_all("SELECT version, checksum FROM schema_migrations", &[])?;
        let mut applied = HashMap::with_capacity(rows.len());
        for row in rows {
            let version: i64 = row
                .try_get(0)
                .map_err(crate::store::StorageError::Postgres)?;
            let checksum: String = row
                .try_get(1)
                .map_err(crate::store::StorageError::Postgres)?;
            applied.insert(version, checksum);
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Versioned(i64);

    impl Migration for Versioned {
        fn name(&self) -> &str {
            "versioned"
        }

        fn version(&self) -> i64 {
            self.0
        }

        fn up_statements(&self) -> Vec<&'static str> {
            vec![]
        }

        fn down_statements(&self) -> Vec<&'static str> {
            vec![]
        }
    }

    #[test]
    fn test_default_migrator_carries_core_tables() {
        assert_eq!(Migrator::new().versions(), vec![20250301000000]);
    }

    #[test]
    fn test_register_keeps_version_order() {
        let mut migrator = Migrator::empty();
        migrator.register(Box::new(Versioned(20260101000000)));
        migrator.register(Box::new(Versioned(20250101000000)));
        assert_eq!(
            migrator.versions(),
            vec![20250101000000, 20260101000000]
        );
    }
}
