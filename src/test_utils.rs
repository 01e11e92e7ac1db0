//! Scripted in-memory [`Driver`] for tests.
//!
//! Enabled with the `test-utils` feature. The driver records every call in a shared log and
//! keeps committed rows in memory so tests can assert on ordering and failure handling
//! without a ClickHouse server.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::ClickhouseConfig;
use crate::driver::{Driver, DriverTransaction};
use crate::error::ClickhouseMiddlewareError;
use crate::placeholders::count_placeholders;
use crate::types::RowValues;

/// Which operations the mock should fail.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    pub fail_ping: bool,
    pub fail_close: bool,
    pub fail_server_time: bool,
    pub fail_begin: bool,
    pub fail_prepare: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    /// Zero-based indexes of `execute` calls (per transaction) that fail.
    pub failing_rows: BTreeSet<usize>,
    /// Clock reported by `server_time`; wall clock when unset.
    pub now: Option<DateTime<Utc>>,
}

impl MockScript {
    #[must_use]
    pub fn failing_rows(rows: impl IntoIterator<Item = usize>) -> Self {
        Self {
            failing_rows: rows.into_iter().collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    script: MockScript,
    calls: Vec<String>,
    committed: Vec<Vec<RowValues>>,
    executed: Vec<(String, Vec<RowValues>)>,
    closed: bool,
}

/// In-memory driver whose behaviour is controlled by a [`MockScript`].
///
/// Clones share state, so a test can keep a handle after moving the driver into a
/// `Connection`.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    #[must_use]
    pub fn new(script: MockScript) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                script,
                ..MockState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the script, keeping recorded calls and rows.
    pub fn set_script(&self, script: MockScript) {
        self.lock().script = script;
    }

    /// Every call made so far, e.g. `["ping", "begin", "prepare", "exec", "commit"]`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Rows that reached a successful commit, in order.
    #[must_use]
    pub fn committed_rows(&self) -> Vec<Vec<RowValues>> {
        self.lock().committed.clone()
    }

    /// Statements run through [`Driver::execute`].
    #[must_use]
    pub fn executed(&self) -> Vec<(String, Vec<RowValues>)> {
        self.lock().executed.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn record(&self, call: &str) -> MockScript {
        let mut state = self.lock();
        state.calls.push(call.to_string());
        state.script.clone()
    }
}

fn scripted_failure(operation: &str) -> ClickhouseMiddlewareError {
    ClickhouseMiddlewareError::Driver(format!("scripted {operation} failure"))
}

#[async_trait]
impl Driver for MockDriver {
    type Transaction = MockTransaction;

    async fn connect(config: &ClickhouseConfig) -> Result<Self, ClickhouseMiddlewareError> {
        config.validate()?;
        Ok(Self::default())
    }

    async fn ping(&self) -> Result<(), ClickhouseMiddlewareError> {
        let script = self.record("ping");
        if script.fail_ping || self.is_closed() {
            return Err(scripted_failure("ping"));
        }
        Ok(())
    }

    async fn execute(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<(), ClickhouseMiddlewareError> {
        self.record("execute");
        let expected = count_placeholders(sql)?;
        if expected != params.len() {
            return Err(ClickhouseMiddlewareError::Parameter(format!(
                "expected {expected} parameters, got {}",
                params.len()
            )));
        }
        self.lock()
            .executed
            .push((sql.to_string(), params.to_vec()));
        Ok(())
    }

    async fn server_time(&self) -> Result<DateTime<Utc>, ClickhouseMiddlewareError> {
        let script = self.record("server_time");
        if script.fail_server_time {
            return Err(scripted_failure("server_time"));
        }
        Ok(script.now.unwrap_or_else(Utc::now))
    }

    async fn begin(&self) -> Result<MockTransaction, ClickhouseMiddlewareError> {
        let script = self.record("begin");
        if script.fail_begin {
            return Err(scripted_failure("begin"));
        }
        Ok(MockTransaction {
            driver: self.clone(),
            executed: 0,
            buffered: Vec::new(),
        })
    }

    async fn close(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        let script = self.record("close");
        if script.fail_close {
            return Err(scripted_failure("close"));
        }
        self.lock().closed = true;
        Ok(())
    }
}

/// Transaction handed out by [`MockDriver`].
#[derive(Debug)]
pub struct MockTransaction {
    driver: MockDriver,
    executed: usize,
    buffered: Vec<Vec<RowValues>>,
}

/// Statement handed out by [`MockTransaction`].
#[derive(Debug, Clone)]
pub struct MockStatement {
    pub sql: String,
    pub placeholders: usize,
}

#[async_trait]
impl DriverTransaction for MockTransaction {
    type Statement = MockStatement;

    async fn prepare(&mut self, sql: &str) -> Result<MockStatement, ClickhouseMiddlewareError> {
        let script = self.driver.record("prepare");
        if script.fail_prepare {
            return Err(scripted_failure("prepare"));
        }
        Ok(MockStatement {
            sql: sql.to_string(),
            placeholders: count_placeholders(sql)?,
        })
    }

    async fn execute(
        &mut self,
        statement: &MockStatement,
        params: &[RowValues],
    ) -> Result<usize, ClickhouseMiddlewareError> {
        let script = self.driver.record("exec");
        let index = self.executed;
        self.executed += 1;
        if script.failing_rows.contains(&index) {
            return Err(scripted_failure(&format!("exec of row {index}")));
        }
        if statement.placeholders != params.len() {
            return Err(ClickhouseMiddlewareError::Parameter(format!(
                "expected {} parameters, got {}",
                statement.placeholders,
                params.len()
            )));
        }
        self.buffered.push(params.to_vec());
        Ok(1)
    }

    async fn commit(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        let script = self.driver.record("commit");
        if script.fail_commit {
            return Err(scripted_failure("commit"));
        }
        let rows = std::mem::take(&mut self.buffered);
        self.driver.lock().committed.extend(rows);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), ClickhouseMiddlewareError> {
        let script = self.driver.record("rollback");
        self.buffered.clear();
        if script.fail_rollback {
            return Err(scripted_failure("rollback"));
        }
        Ok(())
    }
}
