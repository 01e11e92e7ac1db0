//! The client capability the middleware needs from a database library.
//!
//! [`crate::clickhouse::ClickhouseDriver`] is the production implementation; tests plug in
//! the scripted driver from `test_utils`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::ClickhouseConfig;
use crate::error::ClickhouseMiddlewareError;
use crate::types::RowValues;

/// A client session: connect, liveness, ad hoc statements, transactions, close.
#[async_trait]
pub trait Driver: Send + Sync + Sized {
    type Transaction: DriverTransaction;

    /// Construct a client for `config`. Must not talk to the server.
    ///
    /// # Errors
    /// Returns an error if the client cannot be constructed from the configuration.
    async fn connect(config: &ClickhouseConfig) -> Result<Self, ClickhouseMiddlewareError>;

    /// Round-trip a trivial request to the server.
    ///
    /// # Errors
    /// Returns an error if the server cannot be reached or the client is closed.
    async fn ping(&self) -> Result<(), ClickhouseMiddlewareError>;

    /// Execute one statement with positional parameters outside any transaction.
    ///
    /// # Errors
    /// Returns an error on parameter mismatch or execution failure.
    async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), ClickhouseMiddlewareError>;

    /// Query the server clock (query-row-and-scan of `now()`).
    ///
    /// # Errors
    /// Returns an error on transport or decode failure.
    async fn server_time(&self) -> Result<DateTime<Utc>, ClickhouseMiddlewareError>;

    /// Begin a transaction.
    ///
    /// # Errors
    /// Returns an error if the client is closed or cannot start a transaction.
    async fn begin(&self) -> Result<Self::Transaction, ClickhouseMiddlewareError>;

    /// Release the client.
    ///
    /// # Errors
    /// Returns an error if releasing the client fails.
    async fn close(&mut self) -> Result<(), ClickhouseMiddlewareError>;
}

/// A driver transaction.
///
/// Finished-state bookkeeping lives in [`crate::batch::Transaction`]; implementations only
/// need to do the work.
#[async_trait]
pub trait DriverTransaction: Send {
    type Statement: Send + Sync;

    /// # Errors
    /// Returns an error if the statement cannot be prepared.
    async fn prepare(&mut self, sql: &str) -> Result<Self::Statement, ClickhouseMiddlewareError>;

    /// Execute a prepared statement with one row of parameters; returns rows affected.
    ///
    /// # Errors
    /// Returns an error on parameter mismatch or execution failure.
    async fn execute(
        &mut self,
        statement: &Self::Statement,
        params: &[RowValues],
    ) -> Result<usize, ClickhouseMiddlewareError>;

    /// # Errors
    /// Returns an error if the commit fails.
    async fn commit(&mut self) -> Result<(), ClickhouseMiddlewareError>;

    /// # Errors
    /// Returns an error if the rollback fails.
    async fn rollback(&mut self) -> Result<(), ClickhouseMiddlewareError>;
}
