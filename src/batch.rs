use tracing::{debug, warn};

use crate::driver::{Driver, DriverTransaction};
use crate::error::{ClickhouseMiddlewareError, ErrorKind};
use crate::types::RowValues;

/// What [`multi_insert`] does when a row fails to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Roll back, skip the remaining rows and return the row's error.
    #[default]
    AbortOnError,
    /// Legacy behaviour: roll back but keep looping and still attempt the commit.
    ///
    /// The failing row's error is not returned. The next row runs against a finished
    /// transaction, so the call reports that failure together with the failed rollback;
    /// if the failing row was the last one, the commit reports the finished transaction.
    ContinueOnError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Active,
    Committed,
    RolledBack,
}

/// Transaction handle that refuses every operation once committed or rolled back.
pub struct Transaction<T: DriverTransaction> {
    inner: T,
    state: TxState,
}

impl<T: DriverTransaction> Transaction<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            state: TxState::Active,
        }
    }

    /// Begin a transaction on `driver`.
    ///
    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Transaction` if the driver cannot begin.
    pub async fn begin<D>(driver: &D) -> Result<Self, ClickhouseMiddlewareError>
    where
        D: Driver<Transaction = T>,
    {
        let inner = driver
            .begin()
            .await
            .map_err(|e| e.categorize(ErrorKind::Transaction, "begin"))?;
        Ok(Self::new(inner))
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state != TxState::Active
    }

    fn ensure_active(&self) -> Result<(), ClickhouseMiddlewareError> {
        if self.is_finished() {
            Err(ClickhouseMiddlewareError::transaction_done())
        } else {
            Ok(())
        }
    }

    /// # Errors
    /// Returns an error if the transaction is finished or the driver rejects the statement.
    pub async fn prepare(&mut self, sql: &str) -> Result<T::Statement, ClickhouseMiddlewareError> {
        self.ensure_active()?;
        self.inner
            .prepare(sql)
            .await
            .map_err(|e| transaction_error(e, "prepare"))
    }

    /// # Errors
    /// Returns an error if the transaction is finished or the row fails.
    pub async fn execute(
        &mut self,
        statement: &T::Statement,
        params: &[RowValues],
    ) -> Result<usize, ClickhouseMiddlewareError> {
        self.ensure_active()?;
        self.inner
            .execute(statement, params)
            .await
            .map_err(|e| transaction_error(e, "exec"))
    }

    /// # Errors
    /// Returns an error if the transaction is finished or the commit fails.
    pub async fn commit(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        self.ensure_active()?;
        self.state = TxState::Committed;
        self.inner
            .commit()
            .await
            .map_err(|e| e.categorize(ErrorKind::Transaction, "commit"))
    }

    /// # Errors
    /// Returns an error if the transaction is finished or the rollback fails.
    pub async fn rollback(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        self.ensure_active()?;
        self.state = TxState::RolledBack;
        self.inner
            .rollback()
            .await
            .map_err(|e| e.categorize(ErrorKind::Transaction, "rollback"))
    }
}

// A statement or row that does not fit is a failed transaction step.
fn transaction_error(err: ClickhouseMiddlewareError, operation: &str) -> ClickhouseMiddlewareError {
    match err {
        ClickhouseMiddlewareError::Parameter(message) => {
            ClickhouseMiddlewareError::Transaction(format!("{operation}: {message}"))
        }
        other => other.categorize(ErrorKind::Transaction, operation),
    }
}

async fn rollback_after<T: DriverTransaction>(
    tx: &mut Transaction<T>,
    err: ClickhouseMiddlewareError,
) -> ClickhouseMiddlewareError {
    match tx.rollback().await {
        Ok(()) => err,
        Err(rollback_err) => ClickhouseMiddlewareError::combine(err, rollback_err),
    }
}

/// Insert many rows in one transaction through a single prepared statement.
///
/// Rows are executed in input order. A prepare failure rolls back and is returned; row
/// failures follow `policy`. An empty `rows` slice still begins and commits.
///
/// # Errors
/// Returns `ClickhouseMiddlewareError::Transaction` for begin, prepare, row and commit
/// failures (a row is reported as soon as it fails under [`BatchPolicy::AbortOnError`]),
/// and a compound error whenever the rollback that follows a failure fails too.
pub async fn multi_insert<D: Driver>(
    driver: &D,
    query: &str,
    rows: &[Vec<RowValues>],
    policy: BatchPolicy,
) -> Result<(), ClickhouseMiddlewareError> {
    let mut tx = Transaction::begin(driver).await?;

    let statement = match tx.prepare(query).await {
        Ok(statement) => statement,
        Err(err) => return Err(rollback_after(&mut tx, err).await),
    };

    for (index, row) in rows.iter().enumerate() {
        let Err(err) = tx.execute(&statement, row).await else {
            continue;
        };
        warn!(row = index, error = %err, "batch row failed, rolling back");
        if let Err(rollback_err) = tx.rollback().await {
            return Err(ClickhouseMiddlewareError::combine(err, rollback_err));
        }
        if policy == BatchPolicy::AbortOnError {
            return Err(err);
        }
    }

    tx.commit().await?;
    debug!(rows = rows.len(), "batch committed");
    Ok(())
}
