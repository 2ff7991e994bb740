//! Reads table, column, index and sequence metadata from `sqlite_master` and the table-valued pragmas.
//! Table names are always bound as parameters, never spliced into the introspection SQL.

use crate::error::AppError;
use crate::schema::index_sql::parse_index_columns;
use crate::schema::{Column, Index, Sequence, Table};
use sqlx::SqliteConnection;

/// Internal bookkeeping table that backs AUTOINCREMENT counters.
pub const SEQUENCE_TABLE: &str = "sqlite_sequence";

pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// All user tables in storage order, each with its columns and indexed columns.
    pub async fn list_tables(conn: &mut SqliteConnection) -> Result<Vec<Table>, AppError> {
        let names = Self::table_names(conn).await?;
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            tables.push(Self::describe(conn, name).await?);
        }
        Ok(tables)
    }

    /// Names of all user tables (sequence bookkeeping excluded).
    pub async fn table_names(conn: &mut SqliteConnection) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name <> ?1")
            .bind(SEQUENCE_TABLE)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(|(n,)| n).collect())
    }

    /// One table by name, or `None` when no such user table exists.
    pub async fn table(conn: &mut SqliteConnection, name: &str) -> Result<Option<Table>, AppError> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 AND name <> ?2")
                .bind(name)
                .bind(SEQUENCE_TABLE)
                .fetch_optional(&mut *conn)
                .await?;
        match found {
            Some((name,)) => Ok(Some(Self::describe(conn, name).await?)),
            None => Ok(None),
        }
    }

    async fn describe(conn: &mut SqliteConnection, name: String) -> Result<Table, AppError> {
        let columns = Self::column_info(conn, &name).await?;
        let indexed = Self::indexed(conn, &name).await?;
        Ok(Table { name, columns, indexed })
    }

    /// Columns in native order. An `INTEGER` primary key declared `AUTOINCREMENT` carries the
    /// counter: the stored sequence value, or 0 if the sequence has not been used yet.
    pub async fn column_info(conn: &mut SqliteConnection, table: &str) -> Result<Vec<Column>, AppError> {
        let rows: Vec<(i64, String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"SELECT cid, name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#,
        )
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
        let mut columns: Vec<Column> = rows
            .into_iter()
            .map(|(cid, name, declared_type, not_null, default_value, pk)| Column {
                cid,
                name,
                declared_type,
                not_null: not_null != 0,
                primary_key: pk > 0,
                default_value,
                autoincrement_seq: None,
            })
            .collect();

        let mut pks = columns.iter().filter(|c| c.primary_key);
        let rowid_alias = match (pks.next(), pks.next()) {
            (Some(pk), None) => pk.declared_type.eq_ignore_ascii_case("INTEGER"),
            _ => false,
        };
        if !rowid_alias {
            return Ok(columns);
        }
        let seq = match Self::sequence(conn, table).await? {
            Some(s) => Some(s.seq),
            None => {
                let sql = Self::table_sql(conn, table).await?;
                sql.as_deref().filter(|s| declares_autoincrement(s)).map(|_| 0)
            }
        };
        if let Some(pk) = columns.iter_mut().find(|c| c.primary_key) {
            pk.autoincrement_seq = seq;
        }
        Ok(columns)
    }

    /// Current autoincrement counter for `table`, if the table has a sequence row.
    pub async fn sequence(conn: &mut SqliteConnection, table: &str) -> Result<Option<Sequence>, AppError> {
        let (has_sequence_table,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
                .bind(SEQUENCE_TABLE)
                .fetch_one(&mut *conn)
                .await?;
        if has_sequence_table == 0 {
            return Ok(None);
        }
        let row: Option<(String, i64)> = sqlx::query_as("SELECT name, seq FROM sqlite_sequence WHERE name = ?1")
            .bind(table)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(|(name, seq)| Sequence { name, seq }))
    }

    async fn table_sql(conn: &mut SqliteConnection, table: &str) -> Result<Option<String>, AppError> {
        let sql: Option<(Option<String>,)> =
            sqlx::query_as("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1")
                .bind(table)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(sql.and_then(|(s,)| s))
    }

    /// Explicitly created indexes on `table`, in creation order, each with its own columns.
    /// Implicit indexes (primary key, UNIQUE constraints) have no SQL text and are skipped.
    pub async fn indexes(conn: &mut SqliteConnection, table: &str) -> Result<Vec<Index>, AppError> {
        let defs: Vec<(String, String)> = sqlx::query_as(
            "SELECT name, sql FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL",
        )
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
        let mut out = Vec::with_capacity(defs.len());
        for (name, sql) in defs {
            let named: Vec<(Option<String>,)> = sqlx::query_as("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")
                .bind(&name)
                .fetch_all(&mut *conn)
                .await?;
            let columns = if !named.is_empty() && named.iter().all(|(n,)| n.is_some()) {
                named.into_iter().filter_map(|(n,)| n).collect()
            } else {
                tracing::debug!(index = %name, "index has expression columns, parsing definition");
                parse_index_columns(&sql)
            };
            out.push(Index { name, columns });
        }
        Ok(out)
    }

    /// Flattened index columns of `table`; a column covered by several indexes appears once per index.
    pub async fn indexed(conn: &mut SqliteConnection, table: &str) -> Result<Vec<String>, AppError> {
        Ok(Self::indexes(conn, table)
            .await?
            .into_iter()
            .flat_map(|i| i.columns)
            .collect())
    }
}

/// True when `sql` has `PRIMARY KEY [ASC|DESC] [ON CONFLICT <resolution>] AUTOINCREMENT`,
/// compared word by word so identifiers merely containing the keyword do not count.
fn declares_autoincrement(sql: &str) -> bool {
    const BETWEEN: [&str; 9] = ["ASC", "DESC", "ON", "CONFLICT", "ROLLBACK", "ABORT", "FAIL", "IGNORE", "REPLACE"];
    let words: Vec<String> = sql
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_uppercase())
        .collect();
    words.windows(2).enumerate().any(|(i, pair)| {
        pair[0] == "PRIMARY"
            && pair[1] == "KEY"
            && words[i + 2..]
                .iter()
                .find(|w| !BETWEEN.contains(&w.as_str()))
                .map(|w| w == "AUTOINCREMENT")
                .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::declares_autoincrement;

    #[test]
    fn autoincrement_follows_primary_key() {
        assert!(declares_autoincrement("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, n TEXT)"));
        assert!(declares_autoincrement("create table t (id integer primary key desc on conflict replace autoincrement)"));
    }

    #[test]
    fn keyword_inside_identifiers_does_not_count() {
        assert!(!declares_autoincrement("CREATE TABLE codes (code TEXT PRIMARY KEY, autoincrement_step INTEGER)"));
        assert!(!declares_autoincrement("CREATE TABLE t (id INTEGER PRIMARY KEY, autoincrement INTEGER)"));
        assert!(!declares_autoincrement("CREATE TABLE t (id INTEGER PRIMARY KEY)"));
    }
}
