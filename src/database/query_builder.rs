use sqlx::{Encode, QueryBuilder, Sqlite, Type};

/// Builds `UPDATE <table> SET ...` statements one column at a time.
///
/// `updated_at` is always the first assignment, so the SET list is never
/// empty and every mutation refreshes the timestamp. Callers append the
/// ownership-scoped `WHERE` and `RETURNING *` via [`UpdateQuery::finish`].
pub struct UpdateQuery<'a> {
    builder: QueryBuilder<'a, Sqlite>,
}

impl<'a> UpdateQuery<'a> {
    pub fn new(table: &str) -> Self {
        let mut builder = QueryBuilder::new(format!("UPDATE {} SET updated_at = ", table));
        builder.push_bind(chrono::Utc::now());
        Self { builder }
    }

    /// Assign `column = value`
    pub fn set<T>(&mut self, column: &str, value: T) -> &mut Self
    where
        T: 'a + Encode<'a, Sqlite> + Type<Sqlite> + Send,
    {
        self.builder.push(", ");
        self.builder.push(column);
        self.builder.push(" = ");
        self.builder.push_bind(value);
        self
    }

    /// Assign only when the patch carries a value for this column
    pub fn set_if<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'a + Encode<'a, Sqlite> + Type<Sqlite> + Send,
    {
        if let Some(value) = value {
            self.set(column, value);
        }
        self
    }

    /// Hand back the builder so the caller can push its filter predicate
    pub fn finish(self) -> QueryBuilder<'a, Sqlite> {
        self.builder
    }
}

/// Case-insensitive `LIKE` pattern matching `term` anywhere in the column.
/// Compare against `LOWER(col)`: SQLite folds ASCII only, so the term is
/// folded the same way. `%` and `_` in the term are escaped; use with
/// `ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
