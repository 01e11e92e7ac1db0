use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Values that can be bound to a positional `?` placeholder.
///
/// A batch row is a `Vec<RowValues>` whose order matches the placeholders:
/// ```rust
/// use clickhouse_middleware::prelude::*;
///
/// let row = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = row;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Signed integer value (64-bit)
    Int(i64),
    /// Unsigned integer value (64-bit), for `UInt64` columns that exceed `i64`
    UInt(u64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value, interpreted in the session timezone
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value, sent as its serialized text
    JSON(JsonValue),
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<u64> for RowValues {
    fn from(value: u64) -> Self {
        RowValues::UInt(value)
    }
}

impl From<u32> for RowValues {
    fn from(value: u32) -> Self {
        RowValues::UInt(u64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_become_null() {
        let none: Option<i64> = None;
        assert_eq!(RowValues::from(none), RowValues::Null);
        assert_eq!(RowValues::from(Some("x")), RowValues::Text("x".into()));
    }

    #[test]
    fn unsigned_values_keep_their_range() {
        assert_eq!(RowValues::from(u64::MAX), RowValues::UInt(u64::MAX));
        assert_eq!(RowValues::from(7u32), RowValues::UInt(7));
        assert_eq!(RowValues::from(-7i32), RowValues::Int(-7));
    }
}
