//! PostgreSQL transactions.
//!
//! [`PgTransaction`] wraps a client with an open `BEGIN` and implements
//! [`SqlExecutor`], so every statement the store layer issues runs inside
//! the transaction until `commit()` or `rollback()` consumes it. A closed
//! transaction refuses further statements.

use may_postgres::types::ToSql;
use may_postgres::{Client, Row};

use crate::executor::SqlExecutor;
use crate::store::StorageError;

/// Transaction isolation level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Read committed (PostgreSQL default)
    ReadCommitted,
    /// Repeatable read
    RepeatableRead,
    /// Serializable — used for every receipt save/update
    Serializable,
}

impl IsolationLevel {
    fn to_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// A database transaction
///
/// All statements executed through it are committed together or rolled back
/// together. Dropping without commit leaves the `BEGIN` dangling until the
/// connection issues the next `ROLLBACK`/`BEGIN`, so callers should always
/// resolve a transaction explicitly.
pub struct PgTransaction {
    client: Client,
    closed: bool,
}

impl PgTransaction {
    /// Open a transaction with the default isolation level
    pub(crate) fn new(client: Client) -> Result<Self, StorageError> {
        Self::new_with_isolation(client, IsolationLevel::ReadCommitted)
    }

    /// Open a transaction with a specific isolation level
    pub(crate) fn new_with_isolation(
        client: Client,
        isolation_level: IsolationLevel,
    ) -> Result<Self, StorageError> {
        client.execute("BEGIN", &[]).map_err(StorageError::Postgres)?;

        // SET TRANSACTION must run inside the transaction, before any query
        if isolation_level != IsolationLevel::ReadCommitted {
            let isolation_sql = format!(
                "SET TRANSACTION ISOLATION LEVEL {}",
                isolation_level.to_sql()
            );
            if let Err(e) = client.execute(isolation_sql.as_str(), &[]) {
                let _ = client.execute("ROLLBACK", &[]);
                return Err(StorageError::Postgres(e));
            }
        }

        Ok(Self {
            client,
            closed: false,
        })
    }

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TransactionClosed`] if the transaction was
    /// already resolved, or the driver error if `COMMIT` fails.
    pub fn commit(mut self) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::TransactionClosed);
        }
        self.client
            .execute("COMMIT", &[])
            .map_err(StorageError::Postgres)?;
        self.closed = true;
        Ok(())
    }

    /// Rollback the transaction
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::TransactionClosed`] if the transaction was
    /// already resolved, or the driver error if `ROLLBACK` fails.
    pub fn rollback(mut self) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::TransactionClosed);
        }
        self.client
            .execute("ROLLBACK", &[])
            .map_err(StorageError::Postgres)?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl SqlExecutor for PgTransaction {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StorageError> {
        if self.closed {
            return Err(StorageError::TransactionClosed);
        }
        self.client
            .execute(query, params)
            .map_err(StorageError::Postgres)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StorageError> {
        if self.closed {
            return Err(StorageError::TransactionClosed);
        }
        self.client
            .query_one(query, params)
            .map_err(StorageError::Postgres)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StorageError> {
        if self.closed {
            return Err(StorageError::TransactionClosed);
        }
        self.client
            .query(query, params)
            .map_err(StorageError::Postgres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_level_to_sql() {
        assert_eq!(IsolationLevel::ReadCommitted.to_sql(), "READ COMMITTED");
        assert_eq!(IsolationLevel::RepeatableRead.to_sql(), "REPEATABLE READ");
        assert_eq!(IsolationLevel::Serializable.to_sql(), "SERIALIZABLE");
    }

    #[test]
    fn test_isolation_level_equality() {
        assert_eq!(IsolationLevel::Serializable, IsolationLevel::Serializable);
        assert_ne!(IsolationLevel::ReadCommitted, IsolationLevel::Serializable);
    }
}
