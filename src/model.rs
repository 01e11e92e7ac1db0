use crate::types::RowValues;

/// A record that can be inserted generically.
///
/// `fields` and `values` must have the same length and order; this is not checked beyond
/// the placeholder count of the generated statement.
///
/// ```rust
/// use clickhouse_middleware::prelude::*;
///
/// struct Visit {
///     user_id: u64,
///     path: String,
/// }
///
/// impl Model for Visit {
///     fn fields(&self) -> Vec<&str> {
///         vec!["user_id", "path"]
///     }
///
///     fn values(&self) -> Vec<RowValues> {
///         vec![self.user_id.into(), self.path.as_str().into()]
///     }
///
///     fn table_name(&self) -> &str {
///         "visits"
///     }
/// }
///
/// let visit = Visit { user_id: 7, path: "/".into() };
/// assert_eq!(
///     prepare_insertion_sql(&visit),
///     "INSERT INTO visits (user_id, path) VALUES (?,?)"
/// );
/// ```
pub trait Model {
    /// Column names, in insertion order.
    fn fields(&self) -> Vec<&str>;

    /// Column values, in the same order as [`Model::fields`].
    fn values(&self) -> Vec<RowValues>;

    /// Target table.
    fn table_name(&self) -> &str;
}

/// Build `INSERT INTO <table> (<fields>) VALUES (?,...)` for `model`.
///
/// Table and column names are trusted identifiers and are not quoted or escaped; values
/// must go through parameter binding.
#[must_use]
pub fn prepare_insertion_sql<M: Model + ?Sized>(model: &M) -> String {
    let fields = model.fields();
    let binds = vec!["?"; fields.len()].join(",");

    format!(
        "INSERT INTO {} ({}) VALUES ({binds})",
        model.table_name(),
        fields.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        table: &'static str,
        fields: Vec<&'static str>,
    }

    impl Model for Fixed {
        fn fields(&self) -> Vec<&str> {
            self.fields.clone()
        }

        fn values(&self) -> Vec<RowValues> {
            self.fields.iter().map(|f| RowValues::from(*f)).collect()
        }

        fn table_name(&self) -> &str {
            self.table
        }
    }

    #[test]
    fn builds_insert_statement() {
        let model = Fixed {
            table: "t",
            fields: vec!["a", "b", "c"],
        };
        assert_eq!(
            prepare_insertion_sql(&model),
            "INSERT INTO t (a, b, c) VALUES (?,?,?)"
        );
    }

    #[test]
    fn single_field() {
        let model = Fixed {
            table: "db.events",
            fields: vec!["ts"],
        };
        assert_eq!(
            prepare_insertion_sql(&model),
            "INSERT INTO db.events (ts) VALUES (?)"
        );
    }

    #[test]
    fn no_fields_gives_empty_lists() {
        let model = Fixed {
            table: "t",
            fields: vec![],
        };
        assert_eq!(prepare_insertion_sql(&model), "INSERT INTO t () VALUES ()");
    }

    #[test]
    fn works_through_trait_objects() {
        let model: Box<dyn Model> = Box::new(Fixed {
            table: "t",
            fields: vec!["x", "y"],
        });
        assert_eq!(
            prepare_insertion_sql(model.as_ref()),
            "INSERT INTO t (x, y) VALUES (?,?)"
        );
    }
}
