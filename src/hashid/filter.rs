use sqlx::{Postgres, QueryBuilder};

use super::HasHashid;

/// Equality predicate on the stored hashid column.
///
/// The value is compared literally and never decoded, so a lookup through a filter is a
/// plain index match on whatever string the row holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashidFilter {
    column: String,
    value: String,
}

impl HashidFilter {
    /// `column` must already be a validated identifier; it is interpolated, not bound.
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Evaluates the predicate against an entity already in memory
    pub fn matches<E: HasHashid>(&self, entity: &E) -> bool {
        entity.hashid() == Some(self.value.as_str())
    }

    /// Appends ` AND <column> = $n` to a query whose WHERE clause is already open
    pub fn apply<'args>(&self, builder: &mut QueryBuilder<'args, Postgres>) {
        scope_hashid(builder, &self.column, &self.value);
    }
}

/// Narrows a query under construction to rows whose `column` equals `value`.
pub fn scope_hashid<'b, 'args>(
    builder: &'b mut QueryBuilder<'args, Postgres>,
    column: &str,
    value: &str,
) -> &'b mut QueryBuilder<'args, Postgres> {
    builder
        .push(" AND ")
        .push(column)
        .push(" = ")
        .push_bind(value.to_string());
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(Option<String>);

    impl HasHashid for Row {
        fn key(&self) -> Option<i64> {
            Some(1)
        }

        fn hashid(&self) -> Option<&str> {
            self.0.as_deref()
        }

        fn set_hashid(&mut self, hashid: String) {
            self.0 = Some(hashid);
        }
    }

    #[test]
    fn test_matches_is_literal_equality() {
        let filter = HashidFilter::new("hashid", "x9Lk2m");

        assert!(filter.matches(&Row(Some("x9Lk2m".into()))));
        assert!(!filter.matches(&Row(Some("X9LK2M".into()))));
        assert!(!filter.matches(&Row(None)));
    }

    #[test]
    fn test_apply_appends_bound_equality() {
        let filter = HashidFilter::new("public_id", "x9Lk2m");
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM links WHERE 1=1");
        filter.apply(&mut builder);

        assert_eq!(
            builder.sql(),
            "SELECT * FROM links WHERE 1=1 AND public_id = $1"
        );
    }

    #[test]
    fn test_scope_composes_with_other_constraints() {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT * FROM links WHERE access_count > ");
        builder.push_bind(10_i64);
        scope_hashid(&mut builder, "hashid", "abc").push(" LIMIT 1");

        assert_eq!(
            builder.sql(),
            "SELECT * FROM links WHERE access_count > $1 AND hashid = $2 LIMIT 1"
        );
    }
}
