use thiserror::Error;

/// Broad category of a [`ClickhouseMiddlewareError`].
///
/// Compound errors report the kind of the failure that caused them, not of the cleanup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration.
    Validation,
    /// Opening the client or the initial liveness check failed.
    Connection,
    /// Closing the client failed.
    Close,
    /// A simple query failed in transport or while decoding its row.
    Query,
    /// Begin, prepare, commit or rollback failed.
    Transaction,
    /// Parameters did not fit the statement.
    Parameter,
    /// Uncategorised failure reported by the underlying driver.
    Driver,
}

#[derive(Debug, Error)]
pub enum ClickhouseMiddlewareError {
    #[error(transparent)]
    Clickhouse(#[from] ::clickhouse::error::Error),

    #[error("clickhouse config validation error: {0}")]
    Validation(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Close error: {0}")]
    Close(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Driver error: {0}")]
    Driver(String),

    /// An operation failed and the cleanup that followed failed as well.
    #[error("multiple errors: {primary}, {cleanup}")]
    Multiple {
        primary: Box<ClickhouseMiddlewareError>,
        cleanup: Box<ClickhouseMiddlewareError>,
    },
}

impl ClickhouseMiddlewareError {
    /// Category of this error; a compound error answers with its primary failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Clickhouse(_) | Self::Driver(_) => ErrorKind::Driver,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Close(_) => ErrorKind::Close,
            Self::Query(_) => ErrorKind::Query,
            Self::Transaction(_) => ErrorKind::Transaction,
            Self::Parameter(_) => ErrorKind::Parameter,
            Self::Multiple { primary, .. } => primary.kind(),
        }
    }

    /// Report `primary` together with the failure of the cleanup that followed it.
    #[must_use]
    pub fn combine(primary: Self, cleanup: Self) -> Self {
        Self::Multiple {
            primary: Box::new(primary),
            cleanup: Box::new(cleanup),
        }
    }

    /// Re-home an uncategorised driver failure under `kind`, prefixing the operation name.
    ///
    /// Errors that already carry a category are returned unchanged.
    #[must_use]
    pub fn categorize(self, kind: ErrorKind, operation: &str) -> Self {
        if self.kind() != ErrorKind::Driver {
            return self;
        }
        let message = format!("{operation}: {self}");
        match kind {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Connection => Self::Connection(message),
            ErrorKind::Close => Self::Close(message),
            ErrorKind::Query => Self::Query(message),
            ErrorKind::Transaction => Self::Transaction(message),
            ErrorKind::Parameter => Self::Parameter(message),
            ErrorKind::Driver => self,
        }
    }

    /// Error returned by any operation on a transaction that was already committed or rolled back.
    #[must_use]
    pub fn transaction_done() -> Self {
        Self::Transaction("transaction has already been committed or rolled back".to_string())
    }

    pub(crate) fn connection_closed() -> Self {
        Self::Connection("connection is not open".to_string())
    }
}
