//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE for an introspected table.
//! Every identifier is taken from the `Table` model; every value is a numbered parameter,
//! except server expressions such as the current timestamp.

use crate::schema::{Column, Table};
use crate::sql::{bind_key, FieldValue, SearchFilter, SqlValue};

/// Quote identifier for SQLite (safe: only from introspection).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlValue) -> String {
        self.params.push(v);
        format!("?{}", self.params.len())
    }
}

/// ` WHERE "a" LIKE ?1 AND "b" LIKE ?2`, or empty. Filter entries naming no column of
/// `table` are dropped; patterns are bound as `%pattern%`.
fn where_like(q: &mut QueryBuf, table: &Table, filters: &SearchFilter) -> String {
    let mut parts = Vec::new();
    for (col, pattern) in filters.iter() {
        let Some(column) = table.column(col) else {
            continue;
        };
        let ph = q.push_param(SqlValue::Text(format!("%{}%", pattern)));
        parts.push(format!("{} LIKE {}", quoted(&column.name), ph));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// One page of rows: `LIMIT limit OFFSET offset`, ordered by the primary key when there is one.
pub fn select_page(table: &Table, filters: &SearchFilter, limit: u32, offset: u64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_like(&mut q, table, filters);
    let order_clause = table
        .primary_key()
        .map(|pk| format!(" ORDER BY {}", quoted(&pk.name)))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT * FROM {}{}{} LIMIT {} OFFSET {}",
        quoted(&table.name),
        where_clause,
        order_clause,
        limit,
        offset
    );
    q
}

/// Row count under the same predicates and bound values as `select_page`.
pub fn count(table: &Table, filters: &SearchFilter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_like(&mut q, table, filters);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(&table.name), where_clause);
    q
}

fn by_key(verb: &str, table: &Table, pk_column: &str, key: &SqlValue, pk_type: Option<&str>) -> Option<QueryBuf> {
    let column = table.column(pk_column)?;
    let mut q = QueryBuf::new();
    let ph = q.push_param(bind_key(key, pk_type));
    q.sql = format!("{} FROM {} WHERE {} = {}", verb, quoted(&table.name), quoted(&column.name), ph);
    Some(q)
}

/// SELECT one row where `pk_column = key`. `None` if `pk_column` is not a column of `table`.
pub fn select_by_key(table: &Table, pk_column: &str, key: &SqlValue, pk_type: Option<&str>) -> Option<QueryBuf> {
    by_key("SELECT *", table, pk_column, key, pk_type)
}

/// DELETE the row where `pk_column = key`. `None` if `pk_column` is not a column of `table`.
pub fn delete_by_key(table: &Table, pk_column: &str, key: &SqlValue, pk_type: Option<&str>) -> Option<QueryBuf> {
    by_key("DELETE", table, pk_column, key, pk_type)
}

/// Right-hand side for one column, or `None` when the column is left to the database.
fn value_sql(q: &mut QueryBuf, value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Literal(v) => Some(q.push_param(v.clone())),
        FieldValue::ExplicitNull => Some(q.push_param(SqlValue::Null)),
        FieldValue::ServerExpression(expr) => Some(expr.sql().to_string()),
        FieldValue::UseServerDefault => None,
    }
}

fn known_columns<'a>(
    table: &'a Table,
    values: &'a [(String, FieldValue)],
) -> impl Iterator<Item = (&'a Column, &'a FieldValue)> {
    values
        .iter()
        .filter_map(move |(name, v)| table.column(name).map(|c| (c, v)))
}

/// INSERT one row. Columns using the server default are omitted; with nothing left the
/// statement is `INSERT ... DEFAULT VALUES`. Names that are not columns of `table` are dropped.
pub fn insert(table: &Table, values: &[(String, FieldValue)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut rhs = Vec::new();
    for (column, value) in known_columns(table, values) {
        if let Some(v) = value_sql(&mut q, value) {
            cols.push(quoted(&column.name));
            rhs.push(v);
        }
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", quoted(&table.name))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(&table.name),
            cols.join(", "),
            rhs.join(", ")
        )
    };
    q
}

/// UPDATE the row where `pk_column = key`, setting every given column except those left to the
/// server default. `None` when `pk_column` is unknown or there is nothing to set.
pub fn update(
    table: &Table,
    values: &[(String, FieldValue)],
    pk_column: &str,
    key: &SqlValue,
    pk_type: Option<&str>,
) -> Option<QueryBuf> {
    let pk = table.column(pk_column)?;
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (column, value) in known_columns(table, values) {
        if let Some(v) = value_sql(&mut q, value) {
            sets.push(format!("{} = {}", quoted(&column.name), v));
        }
    }
    if sets.is_empty() {
        return None;
    }
    let ph = q.push_param(bind_key(key, pk_type));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(&table.name),
        sets.join(", "),
        quoted(&pk.name),
        ph
    );
    Some(q)
}
