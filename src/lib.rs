//! Lightweight async helpers around the `clickhouse` client: configuration and DSN
//! rendering, a verified connection, transactional multi-row inserts and INSERT generation
//! for model types.
//!
//! ```rust,no_run
//! use clickhouse_middleware::prelude::*;
//!
//! # async fn demo() -> Result<(), ClickhouseMiddlewareError> {
//! let config = ClickhouseConfig::new("localhost:8123").with_database("default");
//! let mut conn = Connection::open(config).await?;
//!
//! conn.multi_insert(
//!     "INSERT INTO visits (user_id, path) VALUES (?,?)",
//!     &[
//!         vec![RowValues::UInt(1), RowValues::Text("/".into())],
//!         vec![RowValues::UInt(2), RowValues::Text("/about".into())],
//!     ],
//! )
//! .await?;
//!
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub mod batch;
pub mod clickhouse;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod model;
pub mod placeholders;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

pub use batch::{BatchPolicy, multi_insert};
pub use config::ClickhouseConfig;
pub use connection::Connection;
pub use error::{ClickhouseMiddlewareError, ErrorKind};
pub use model::{Model, prepare_insertion_sql};
pub use types::RowValues;
