// ClickHouse backend built on the `clickhouse` HTTP client.
//
// - config: client construction from `ClickhouseConfig`
// - params: binding `RowValues` as SQL literals
// - query: liveness and server clock
// - transaction: client-side buffered transactions
// - client: the `Driver` implementation

pub mod client;
pub mod config;
pub mod params;
pub mod query;
pub mod transaction;

pub use client::ClickhouseDriver;
pub use config::build_client;
pub use transaction::{Prepared, Tx, begin_transaction};
