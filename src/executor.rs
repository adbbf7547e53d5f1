//! SQL execution seam over `may_postgres`.
//!
//! [`SqlExecutor`] abstracts statement execution so the Postgres store and
//! the migrator can run against either a plain connection ([`PgExecutor`])
//! or an open transaction ([`crate::transaction::PgTransaction`]).

use may_postgres::types::ToSql;
use may_postgres::{Client, Row};

use crate::store::StorageError;

/// Trait for executing database statements
///
/// Implementations: [`PgExecutor`] (direct client) and
/// [`crate::transaction::PgTransaction`] (open transaction).
pub trait SqlExecutor {
    /// Execute a statement and return the number of rows affected
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the execution fails.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StorageError>;

    /// Execute a query and return exactly one row
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the execution fails or the query does not
    /// produce exactly one row.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StorageError>;

    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the execution fails.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StorageError>;
}

/// Direct `may_postgres::Client` executor
pub struct PgExecutor {
    client: Client,
}

impl PgExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn into_client(self) -> Client {
        self.client
    }
}

impl SqlExecutor for PgExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StorageError> {
        self.client
            .execute(query, params)
            .map_err(StorageError::Postgres)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StorageError> {
        self.client
            .query_one(query, params)
            .map_err(StorageError::Postgres)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StorageError> {
        self.client
            .query(query, params)
            .map_err(StorageError::Postgres)
    }
}
