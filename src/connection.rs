use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::batch::{self, BatchPolicy};
use crate::clickhouse::ClickhouseDriver;
use crate::config::ClickhouseConfig;
use crate::driver::Driver;
use crate::error::{ClickhouseMiddlewareError, ErrorKind};
use crate::model::{Model, prepare_insertion_sql};
use crate::types::RowValues;

/// A verified client session plus the configuration it was opened with.
///
/// No locking is added: share a `Connection` across tasks only behind your own
/// synchronisation. Calls carry no timeout; wrap them with `tokio::time::timeout` for
/// bounded latency.
#[derive(Debug)]
pub struct Connection<D: Driver = ClickhouseDriver> {
    config: ClickhouseConfig,
    driver: Option<D>,
}

impl Connection<ClickhouseDriver> {
    /// Open a ClickHouse session and verify it with a ping.
    ///
    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Validation` for a bad configuration and
    /// `ClickhouseMiddlewareError::Connection` if the client cannot be built or the ping
    /// fails (compounded with the close failure if cleanup fails too).
    pub async fn open(config: ClickhouseConfig) -> Result<Self, ClickhouseMiddlewareError> {
        Self::open_with(config).await
    }

    /// The underlying `clickhouse::Client` for ad hoc queries; `None` once closed.
    #[must_use]
    pub fn client(&self) -> Option<&::clickhouse::Client> {
        self.driver.as_ref().and_then(ClickhouseDriver::client)
    }
}

impl<D: Driver> Connection<D> {
    /// Open a session through driver `D`.
    ///
    /// # Errors
    /// See [`Connection::open`].
    pub async fn open_with(config: ClickhouseConfig) -> Result<Self, ClickhouseMiddlewareError> {
        config.validate()?;
        let driver = D::connect(&config)
            .await
            .map_err(|e| e.categorize(ErrorKind::Connection, "connect"))?;
        Self::from_driver(config, driver).await
    }

    /// Verify an already constructed driver and take ownership of it.
    ///
    /// If the ping fails the driver is closed before the error is returned.
    ///
    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Connection` if the ping fails, or a compound
    /// error if closing the driver afterwards fails as well.
    pub async fn from_driver(
        config: ClickhouseConfig,
        mut driver: D,
    ) -> Result<Self, ClickhouseMiddlewareError> {
        if let Err(err) = driver.ping().await {
            let err = err.categorize(ErrorKind::Connection, "ping");
            warn!(addr = %config.addr, error = %err, "initial ping failed");
            if let Err(close_err) = driver.close().await {
                return Err(ClickhouseMiddlewareError::combine(
                    err,
                    close_err.categorize(ErrorKind::Close, "close"),
                ));
            }
            return Err(err);
        }

        debug!(addr = %config.addr, database = %config.database, "connection opened");
        Ok(Self {
            config,
            driver: Some(driver),
        })
    }

    /// A connection that holds no client; every query reports it as not open.
    #[must_use]
    pub fn unopened(config: ClickhouseConfig) -> Self {
        Self {
            config,
            driver: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClickhouseConfig {
        &self.config
    }

    /// The driver, unless the connection is closed.
    #[must_use]
    pub fn driver(&self) -> Option<&D> {
        self.driver.as_ref()
    }

    fn live(&self) -> Result<&D, ClickhouseMiddlewareError> {
        self.driver
            .as_ref()
            .ok_or_else(ClickhouseMiddlewareError::connection_closed)
    }

    /// Liveness probe that never fails: `false` without a client or when the ping errors.
    pub async fn is_connected(&self) -> bool {
        let Some(driver) = &self.driver else {
            return false;
        };
        match driver.ping().await {
            Ok(()) => true,
            Err(err) => {
                warn!(addr = %self.config.addr, error = %err, "ping failed");
                false
            }
        }
    }

    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Connection` if the connection is not open or
    /// the server cannot be reached.
    pub async fn ping(&self) -> Result<(), ClickhouseMiddlewareError> {
        self.live()?
            .ping()
            .await
            .map_err(|e| e.categorize(ErrorKind::Connection, "ping"))
    }

    /// The database server's current time, with one-second resolution.
    ///
    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Query` on transport or decode failure.
    pub async fn server_time(&self) -> Result<DateTime<Utc>, ClickhouseMiddlewareError> {
        self.live()?
            .server_time()
            .await
            .map_err(|e| e.categorize(ErrorKind::Query, "server time"))
    }

    /// Execute one ad hoc statement with positional parameters.
    ///
    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Parameter` on a placeholder mismatch and
    /// `ClickhouseMiddlewareError::Query` when execution fails.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), ClickhouseMiddlewareError> {
        let driver = self.live()?;
        if self.config.debug {
            debug!(sql = %sql, params = params.len(), "execute");
        }
        driver
            .execute(sql, params)
            .await
            .map_err(|e| e.categorize(ErrorKind::Query, "execute"))
    }

    /// Insert `rows` in one transaction, aborting on the first failing row.
    ///
    /// # Errors
    /// See [`batch::multi_insert`].
    pub async fn multi_insert(
        &self,
        query: &str,
        rows: &[Vec<RowValues>],
    ) -> Result<(), ClickhouseMiddlewareError> {
        self.multi_insert_with_policy(query, rows, BatchPolicy::default())
            .await
    }

    /// Insert `rows` in one transaction with an explicit row-failure policy.
    ///
    /// # Errors
    /// See [`batch::multi_insert`].
    pub async fn multi_insert_with_policy(
        &self,
        query: &str,
        rows: &[Vec<RowValues>],
        policy: BatchPolicy,
    ) -> Result<(), ClickhouseMiddlewareError> {
        let driver = self.live()?;
        if self.config.debug {
            debug!(sql = %query, rows = rows.len(), ?policy, "multi insert");
        }
        batch::multi_insert(driver, query, rows, policy).await
    }

    /// Insert records through [`prepare_insertion_sql`] of the first one.
    ///
    /// All records must share the first record's table and field list.
    ///
    /// # Errors
    /// See [`batch::multi_insert`].
    pub async fn insert_models<M: Model + Sync>(
        &self,
        models: &[M],
    ) -> Result<(), ClickhouseMiddlewareError> {
        let Some(first) = models.first() else {
            return Ok(());
        };
        let sql = prepare_insertion_sql(first);
        let rows: Vec<Vec<RowValues>> = models.iter().map(Model::values).collect();
        self.multi_insert(&sql, &rows).await
    }

    /// Release the client. Closing an unopened or already closed connection is a no-op.
    ///
    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Close` if the driver fails to close.
    pub async fn close(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        let Some(mut driver) = self.driver.take() else {
            return Ok(());
        };
        driver
            .close()
            .await
            .map_err(|e| e.categorize(ErrorKind::Close, "close"))?;
        debug!(addr = %self.config.addr, "connection closed");
        Ok(())
    }
}
