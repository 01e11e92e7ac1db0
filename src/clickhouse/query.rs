use ::clickhouse::{Client, Row};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ClickhouseMiddlewareError, ErrorKind};

#[derive(Debug, Row, Deserialize)]
struct ServerNow {
    epoch: u32,
}

/// Send `SELECT 1`.
///
/// # Errors
/// Returns the client error if the request fails.
pub async fn ping(client: &Client) -> Result<(), ClickhouseMiddlewareError> {
    client.query("SELECT 1").execute().await?;
    Ok(())
}

/// Read the server clock as a UTC instant, truncated to whole seconds.
///
/// # Errors
/// Returns `ClickhouseMiddlewareError::Query` on transport or decode failure.
pub async fn server_time(client: &Client) -> Result<DateTime<Utc>, ClickhouseMiddlewareError> {
    let row = client
        .query("SELECT toUnixTimestamp(now()) AS epoch")
        .fetch_one::<ServerNow>()
        .await
        .map_err(|e| ClickhouseMiddlewareError::from(e).categorize(ErrorKind::Query, "now()"))?;

    epoch_to_utc(row.epoch)
}

pub(crate) fn epoch_to_utc(epoch: u32) -> Result<DateTime<Utc>, ClickhouseMiddlewareError> {
    DateTime::from_timestamp(i64::from(epoch), 0).ok_or_else(|| {
        ClickhouseMiddlewareError::Query(format!("server time {epoch} is out of range"))
    })
}
