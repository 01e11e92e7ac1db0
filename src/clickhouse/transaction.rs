use std::sync::Arc;

use ::clickhouse::Client;
use async_trait::async_trait;
use tracing::debug;

use crate::driver::DriverTransaction;
use crate::error::ClickhouseMiddlewareError;
use crate::placeholders::{InsertTemplate, analyze, escape_quoted_marks};
use crate::types::RowValues;

use super::params::{bind_params, check_arity};

/// Client-side transaction for ClickHouse.
///
/// Executed rows are buffered and sent on commit, one multi-row `INSERT` per prepared
/// statement; rollback discards the buffer. Nothing reaches the server before commit.
pub struct Tx {
    client: Client,
    next_id: usize,
    pending: Vec<PendingBatch>,
    log_statements: bool,
}

/// Statement prepared inside a [`Tx`]. Preparation validates the template client-side and
/// escapes question marks inside literals so the client binds only real placeholders.
#[derive(Debug, Clone)]
pub struct Prepared {
    inner: Arc<PreparedInner>,
}

#[derive(Debug)]
struct PreparedInner {
    id: usize,
    sql: String,
    placeholders: usize,
    template: Option<InsertTemplate>,
}

impl Prepared {
    #[must_use]
    pub fn placeholders(&self) -> usize {
        self.inner.placeholders
    }
}

struct PendingBatch {
    statement: Prepared,
    rows: Vec<Vec<RowValues>>,
}

/// Begin a buffered transaction on `client`.
#[must_use]
pub fn begin_transaction(client: &Client, log_statements: bool) -> Tx {
    Tx {
        client: client.clone(),
        next_id: 0,
        pending: Vec::new(),
        log_statements,
    }
}

impl Tx {
    /// Number of rows waiting for commit.
    #[must_use]
    pub fn pending_rows(&self) -> usize {
        self.pending.iter().map(|batch| batch.rows.len()).sum()
    }

    async fn send(&self, batch: PendingBatch) -> Result<(), ClickhouseMiddlewareError> {
        let statement = &batch.statement.inner;
        if let Some(template) = &statement.template {
            let sql = template.render(batch.rows.len());
            if self.log_statements {
                debug!(sql = %sql, rows = batch.rows.len(), "sending batch");
            }
            let query = bind_params(self.client.query(&sql), batch.rows.iter().flatten());
            query.execute().await?;
            return Ok(());
        }

        for row in &batch.rows {
            if self.log_statements {
                debug!(sql = %statement.sql, "sending statement");
            }
            bind_params(self.client.query(&statement.sql), row)
                .execute()
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DriverTransaction for Tx {
    type Statement = Prepared;

    async fn prepare(&mut self, sql: &str) -> Result<Prepared, ClickhouseMiddlewareError> {
        if sql.trim().is_empty() {
            return Err(ClickhouseMiddlewareError::Parameter(
                "cannot prepare an empty statement".to_string(),
            ));
        }
        let sql = escape_quoted_marks(sql)?;
        let shape = analyze(&sql)?;
        let template = InsertTemplate::parse(&sql, &shape);

        self.next_id += 1;
        Ok(Prepared {
            inner: Arc::new(PreparedInner {
                id: self.next_id,
                sql,
                placeholders: shape.placeholders,
                template,
            }),
        })
    }

    async fn execute(
        &mut self,
        statement: &Prepared,
        params: &[RowValues],
    ) -> Result<usize, ClickhouseMiddlewareError> {
        check_arity(statement.placeholders(), params)?;

        match self.pending.last_mut() {
            Some(batch) if batch.statement.inner.id == statement.inner.id => {
                batch.rows.push(params.to_vec());
            }
            _ => self.pending.push(PendingBatch {
                statement: statement.clone(),
                rows: vec![params.to_vec()],
            }),
        }
        Ok(1)
    }

    async fn commit(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        let pending = std::mem::take(&mut self.pending);
        for batch in pending {
            self.send(batch).await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> Tx {
        begin_transaction(&Client::default().with_url("http://localhost:8123"), false)
    }

    #[tokio::test]
    async fn prepare_validates_template() {
        let mut tx = tx();
        let stmt = tx.prepare("INSERT INTO t (a, b) VALUES (?,?)").await.unwrap();
        assert_eq!(stmt.placeholders(), 2);
        assert!(stmt.inner.template.is_some());

        assert!(tx.prepare("   ").await.is_err());
        assert!(tx.prepare("INSERT INTO t VALUES ('?").await.is_err());
    }

    #[tokio::test]
    async fn literal_question_marks_survive_batching() {
        let mut tx = tx();
        let stmt = tx
            .prepare("INSERT INTO t (a, b) VALUES ('what?', ?)")
            .await
            .unwrap();
        assert_eq!(stmt.placeholders(), 1);

        let template = stmt.inner.template.as_ref().unwrap();
        let sql = template.render(2);
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES ('what??', ?), ('what??', ?)");

        let rows = [RowValues::Int(1), RowValues::Int(2)];
        let query = bind_params(tx.client.query(&sql), &rows);
        assert_eq!(
            query.sql_display().to_string(),
            "INSERT INTO t (a, b) VALUES ('what?', 1), ('what?', 2)"
        );
    }

    #[tokio::test]
    async fn execute_buffers_until_rollback() {
        let mut tx = tx();
        let first = tx.prepare("INSERT INTO t (a) VALUES (?)").await.unwrap();
        let second = tx.prepare("INSERT INTO u (a) VALUES (?)").await.unwrap();

        tx.execute(&first, &[RowValues::Int(1)]).await.unwrap();
        tx.execute(&first, &[RowValues::Int(2)]).await.unwrap();
        tx.execute(&second, &[RowValues::Int(3)]).await.unwrap();
        assert_eq!(tx.pending_rows(), 3);
        assert_eq!(tx.pending.len(), 2);

        let err = tx.execute(&first, &[]).await.unwrap_err();
        assert!(err.to_string().contains("expected 1 parameters, got 0"));
        assert_eq!(tx.pending_rows(), 3);

        tx.rollback().await.unwrap();
        assert_eq!(tx.pending_rows(), 0);
    }

    #[tokio::test]
    async fn empty_commit_sends_nothing() {
        let mut tx = tx();
        tx.prepare("INSERT INTO t (a) VALUES (?)").await.unwrap();
        tx.commit().await.unwrap();
    }
}
