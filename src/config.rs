use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ClickhouseMiddlewareError;

/// Connection settings for a ClickHouse server.
///
/// The DSN is built by plain interpolation: `addr` and `database` are trusted
/// configuration and must not contain `?` or `&`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickhouseConfig {
    /// `host:port` of the server. Required.
    pub addr: String,
    /// Database to use; empty means the server default.
    pub database: String,
    /// Log every executed statement at `debug` level.
    pub debug: bool,
    /// Timezone name (e.g. `Europe/Berlin`) sent as the session timezone.
    #[serde(alias = "zoneinfo")]
    pub zone_info: String,
}

impl ClickhouseConfig {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_zone_info(mut self, zone_info: impl Into<String>) -> Self {
        self.zone_info = zone_info.into();
        self
    }

    /// Read `CLICKHOUSE_ADDR`, `CLICKHOUSE_DATABASE`, `CLICKHOUSE_DEBUG` and
    /// `CLICKHOUSE_ZONE_INFO`. Missing variables keep their defaults; nothing is validated.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_prefix("CLICKHOUSE")
    }

    /// Same as [`ClickhouseConfig::from_env`] with a custom variable prefix.
    #[must_use]
    pub fn from_env_with_prefix(prefix: &str) -> Self {
        Self::from_vars(prefix, |key| env::var(key).ok())
    }

    fn from_vars(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(&format!("{prefix}_{name}")).unwrap_or_default();
        Self {
            addr: var("ADDR"),
            database: var("DATABASE"),
            debug: parse_flag(&var("DEBUG")),
            zone_info: var("ZONE_INFO"),
        }
    }

    /// Check required fields.
    ///
    /// # Errors
    /// Returns `ClickhouseMiddlewareError::Validation` when `addr` is empty.
    pub fn validate(&self) -> Result<(), ClickhouseMiddlewareError> {
        if self.addr.is_empty() {
            return Err(ClickhouseMiddlewareError::Validation(
                "addr is empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Data Source Name in the native driver grammar:
    /// `tcp://<addr>?charset=utf8&parseTime=True&debug=<True|False>[&database=<database>]`.
    #[must_use]
    pub fn dsn(&self) -> String {
        let debug = if self.debug { "True" } else { "False" };
        let database = if self.database.is_empty() {
            String::new()
        } else {
            format!("&database={}", self.database)
        };

        format!(
            "tcp://{}?charset=utf8&parseTime=True&debug={debug}{database}",
            self.addr
        )
    }

    /// URL for the HTTP client; an address without a scheme is served over `http://`.
    #[must_use]
    pub fn http_url(&self) -> String {
        if self.addr.contains("://") {
            self.addr.clone()
        } else {
            format!("http://{}", self.addr)
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
