//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::batch::{BatchPolicy, Transaction, multi_insert};
pub use crate::clickhouse::ClickhouseDriver;
pub use crate::config::ClickhouseConfig;
pub use crate::connection::Connection;
pub use crate::driver::{Driver, DriverTransaction};
pub use crate::error::{ClickhouseMiddlewareError, ErrorKind};
pub use crate::model::{Model, prepare_insertion_sql};
pub use crate::types::RowValues;

#[cfg(any(test, feature = "test-utils"))]
pub use crate::test_utils::{MockDriver, MockScript};
