use ::clickhouse::Client;
use ::clickhouse::query::Query;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::ClickhouseConfig;
use crate::driver::Driver;
use crate::error::ClickhouseMiddlewareError;
use crate::placeholders::{count_placeholders, escape_quoted_marks};
use crate::types::RowValues;

use super::config::build_client;
use super::params::{bind_params, check_arity};
use super::query;
use super::transaction::{Tx, begin_transaction};

/// [`Driver`] backed by `clickhouse::Client`.
///
/// The HTTP client pools its connections internally; closing drops the handle.
#[derive(Clone, Default)]
pub struct ClickhouseDriver {
    client: Option<Client>,
    log_statements: bool,
}

// Manual Debug implementation because `clickhouse::Client` does not expose `Debug`
impl std::fmt::Debug for ClickhouseDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickhouseDriver")
            .field("open", &self.client.is_some())
            .field("log_statements", &self.log_statements)
            .finish()
    }
}

impl ClickhouseDriver {
    /// Wrap an already configured client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
            log_statements: false,
        }
    }

    #[must_use]
    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// The underlying client, unless the driver was closed.
    #[must_use]
    pub fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }

    fn live(&self) -> Result<&Client, ClickhouseMiddlewareError> {
        self.client
            .as_ref()
            .ok_or_else(ClickhouseMiddlewareError::connection_closed)
    }
}

fn bound_query(
    client: &Client,
    sql: &str,
    params: &[RowValues],
) -> Result<Query, ClickhouseMiddlewareError> {
    let sql = escape_quoted_marks(sql)?;
    check_arity(count_placeholders(&sql)?, params)?;
    Ok(bind_params(client.query(&sql), params))
}

#[async_trait]
impl Driver for ClickhouseDriver {
    type Transaction = Tx;

    async fn connect(config: &ClickhouseConfig) -> Result<Self, ClickhouseMiddlewareError> {
        let client = build_client(config)?;
        Ok(Self::new(client).with_statement_logging(config.debug))
    }

    async fn ping(&self) -> Result<(), ClickhouseMiddlewareError> {
        query::ping(self.live()?).await
    }

    async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), ClickhouseMiddlewareError> {
        let query = bound_query(self.live()?, sql, params)?;
        if self.log_statements {
            debug!(sql = %sql, params = params.len(), "executing statement");
        }
        query.execute().await?;
        Ok(())
    }

    async fn server_time(&self) -> Result<DateTime<Utc>, ClickhouseMiddlewareError> {
        query::server_time(self.live()?).await
    }

    async fn begin(&self) -> Result<Tx, ClickhouseMiddlewareError> {
        Ok(begin_transaction(self.live()?, self.log_statements))
    }

    async fn close(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        if self.client.take().is_some() {
            debug!("ClickHouse client released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn closed_driver_refuses_work() {
        let mut driver = ClickhouseDriver::connect(&ClickhouseConfig::new("localhost:8123"))
            .await
            .unwrap();
        assert!(driver.client().is_some());

        driver.close().await.unwrap();
        driver.close().await.unwrap();
        assert!(driver.client().is_none());

        let err = driver.ping().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(driver.begin().await.is_err());
    }

    #[tokio::test]
    async fn execute_checks_arity_before_sending() {
        let driver = ClickhouseDriver::new(Client::default().with_url("http://localhost:8123"));
        let err = driver
            .execute("INSERT INTO t (a) VALUES (?)", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parameter);
    }

    #[test]
    fn question_mark_in_literal_is_not_bound() {
        let client = Client::default().with_url("http://localhost:8123");
        let query = bound_query(
            &client,
            "INSERT INTO t (a, b) VALUES ('what?', ?) -- note?",
            &[RowValues::Text("x".into())],
        )
        .unwrap();
        assert_eq!(
            query.sql_display().to_string(),
            "INSERT INTO t (a, b) VALUES ('what?', 'x') -- note?"
        );

        let err = bound_query(&client, "SELECT 'what?'", &[RowValues::Int(1)]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Parameter);
    }
}
