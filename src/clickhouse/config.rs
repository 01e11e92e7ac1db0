use ::clickhouse::Client;
use tracing::debug;

use crate::config::ClickhouseConfig;
use crate::error::ClickhouseMiddlewareError;

/// ClickHouse setting carrying the configured timezone.
pub const SESSION_TIMEZONE: &str = "session_timezone";

/// Build an HTTP client for `cfg`.
///
/// The timezone is sent as the `session_timezone` setting on every request, so DateTime
/// literals are parsed in that zone without touching the process environment.
///
/// # Errors
/// Returns `ClickhouseMiddlewareError::Validation` for a missing address and
/// `ClickhouseMiddlewareError::Connection` for an address the client cannot use.
pub fn build_client(cfg: &ClickhouseConfig) -> Result<Client, ClickhouseMiddlewareError> {
    cfg.validate()?;
    if cfg.addr.chars().any(char::is_whitespace) {
        return Err(ClickhouseMiddlewareError::Connection(format!(
            "invalid address {:?}",
            cfg.addr
        )));
    }

    let url = cfg.http_url();
    let mut client = Client::default().with_url(&url);
    if !cfg.database.is_empty() {
        client = client.with_database(&cfg.database);
    }
    if !cfg.zone_info.is_empty() {
        client = client.with_option(SESSION_TIMEZONE, &cfg.zone_info);
    }

    debug!(
        url = %url,
        database = %cfg.database,
        zone_info = %cfg.zone_info,
        dsn = %cfg.dsn(),
        "building ClickHouse client"
    );

    Ok(client)
}
