use ::clickhouse::query::Query;
use serde::ser::{Serialize, Serializer};

use crate::error::ClickhouseMiddlewareError;
use crate::types::RowValues;

/// Text form used for `RowValues::Timestamp`; ClickHouse parses it in the session timezone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

// The client binds any `Serialize` value as an escaped SQL literal.
impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::UInt(u) => serializer.serialize_u64(*u),
            RowValues::Float(f) => serializer.serialize_f64(*f),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::Timestamp(dt) => serializer.collect_str(&dt.format(TIMESTAMP_FORMAT)),
            RowValues::Null => serializer.serialize_none(),
            RowValues::JSON(value) => serializer.collect_str(value),
        }
    }
}

/// Fail unless exactly `expected` parameters were supplied.
///
/// # Errors
/// Returns `ClickhouseMiddlewareError::Parameter` on a count mismatch.
pub fn check_arity(expected: usize, params: &[RowValues]) -> Result<(), ClickhouseMiddlewareError> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(ClickhouseMiddlewareError::Parameter(format!(
            "expected {expected} parameters, got {}",
            params.len()
        )))
    }
}

/// Bind `params` to the query's placeholders in order.
#[must_use]
pub fn bind_params<'a, I>(mut query: Query, params: I) -> Query
where
    I: IntoIterator<Item = &'a RowValues>,
{
    for value in params {
        query = query.bind(value);
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn values_serialize_as_plain_json_scalars() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let row = vec![
            RowValues::Int(-1),
            RowValues::UInt(u64::MAX),
            RowValues::Text("x'y".into()),
            RowValues::Bool(false),
            RowValues::Timestamp(ts),
            RowValues::Null,
            RowValues::JSON(serde_json::json!({"k": 1})),
        ];
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"[-1,18446744073709551615,"x'y",false,"2024-01-02 03:04:05",null,"{\"k\":1}"]"#
        );
    }

    #[test]
    fn arity_mismatch_is_a_parameter_error() {
        assert!(check_arity(2, &[RowValues::Int(1), RowValues::Null]).is_ok());
        let err = check_arity(2, &[RowValues::Int(1)]).unwrap_err();
        assert_eq!(err.to_string(), "Parameter error: expected 2 parameters, got 1");
    }
}
