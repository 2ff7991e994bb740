//! Query engine: runs introspection and generated statements against the configured SQLite file.
//! Each public operation opens its own connection and closes it before returning.

use crate::config::Settings;
use crate::error::AppError;
use crate::schema::{Column, Index, SchemaIntrospector, Sequence, Table};
use crate::sql::{self, FieldValue, QueryBuf, SearchFilter, SqlValue};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{ConnectOptions, Connection, SqliteConnection};

/// One cell of a fetched row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cell {
    pub column: String,
    pub value: SqlValue,
}

/// A fetched row, cells in result column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.cells.iter().find(|c| c.column == column).map(|c| &c.value)
    }
}

/// One page of a listing plus the filtered total. The two come from separate statements.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub rows: Vec<Row>,
    pub total: u64,
}

#[derive(Clone, Debug)]
pub struct Dao {
    options: SqliteConnectOptions,
    page_size: u32,
}

impl Dao {
    pub fn new(settings: &Settings) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(&settings.database)
            .create_if_missing(settings.create_if_missing);
        Dao {
            options,
            page_size: settings.page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    async fn open(&self) -> Result<SqliteConnection, AppError> {
        let mut conn = self.options.connect().await?;
        sqlx::query("PRAGMA case_sensitive_like = ON")
            .execute(&mut conn)
            .await?;
        Ok(conn)
    }

    async fn close(conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "closing connection");
        }
    }

    /// Open and close a connection; used by the readiness probe.
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.open().await?;
        let result = sqlx::query("SELECT 1").execute(&mut conn).await.map(|_| ()).map_err(AppError::from);
        Self::close(conn).await;
        result
    }

    pub async fn list_tables(&self) -> Result<Vec<Table>, AppError> {
        let mut conn = self.open().await?;
        let result = SchemaIntrospector::list_tables(&mut conn).await;
        Self::close(conn).await;
        result
    }

    pub async fn table_names(&self) -> Result<Vec<String>, AppError> {
        let mut conn = self.open().await?;
        let result = SchemaIntrospector::table_names(&mut conn).await;
        Self::close(conn).await;
        result
    }

    pub async fn table(&self, name: &str) -> Result<Option<Table>, AppError> {
        let mut conn = self.open().await?;
        let result = SchemaIntrospector::table(&mut conn, name).await;
        Self::close(conn).await;
        result
    }

    pub async fn column_info(&self, table: &str) -> Result<Vec<Column>, AppError> {
        let mut conn = self.open().await?;
        let result = SchemaIntrospector::column_info(&mut conn, table).await;
        Self::close(conn).await;
        result
    }

    pub async fn indexed(&self, table: &str) -> Result<Vec<String>, AppError> {
        let mut conn = self.open().await?;
        let result = SchemaIntrospector::indexed(&mut conn, table).await;
        Self::close(conn).await;
        result
    }

    pub async fn indexes(&self, table: &str) -> Result<Vec<Index>, AppError> {
        let mut conn = self.open().await?;
        let result = SchemaIntrospector::indexes(&mut conn, table).await;
        Self::close(conn).await;
        result
    }

    pub async fn sequence(&self, table: &str) -> Result<Option<Sequence>, AppError> {
        let mut conn = self.open().await?;
        let result = SchemaIntrospector::sequence(&mut conn, table).await;
        Self::close(conn).await;
        result
    }

    /// Rows of 1-based `page` (page 0 is treated as 1) and the total matching `filters`.
    pub async fn list(&self, table: &Table, filters: &SearchFilter, page: u32) -> Result<Page, AppError> {
        let page = page.max(1);
        let offset = (page as u64 - 1) * self.page_size as u64;
        let rows_q = sql::select_page(table, filters, self.page_size, offset);
        let count_q = sql::count(table, filters);

        let mut conn = self.open().await?;
        let result = async {
            let rows = fetch_rows(&mut conn, &rows_q).await?;
            let total = fetch_count(&mut conn, &count_q).await?;
            Ok::<_, AppError>(Page { rows, total })
        }
        .await;
        Self::close(conn).await;
        result
    }

    /// The row where `pk_column = key`, if any.
    pub async fn get(
        &self,
        table: &Table,
        key: &SqlValue,
        pk_column: &str,
        pk_type: Option<&str>,
    ) -> Result<Option<Row>, AppError> {
        let q = sql::select_by_key(table, pk_column, key, pk_type).ok_or_else(|| unknown_column(table, pk_column))?;
        let mut conn = self.open().await?;
        let result = fetch_optional(&mut conn, &q).await;
        Self::close(conn).await;
        result
    }

    /// Delete the row where `pk_column = key`. Returns the number of rows deleted.
    pub async fn remove(
        &self,
        table: &Table,
        key: &SqlValue,
        pk_column: &str,
        pk_type: Option<&str>,
    ) -> Result<u64, AppError> {
        let q = sql::delete_by_key(table, pk_column, key, pk_type).ok_or_else(|| unknown_column(table, pk_column))?;
        let mut conn = self.open().await?;
        let result = execute(&mut conn, &q).await.map(|r| r.rows_affected());
        Self::close(conn).await;
        result
    }

    /// Insert one row. Returns the new rowid.
    pub async fn insert(&self, table: &Table, values: &[(String, FieldValue)]) -> Result<i64, AppError> {
        let q = sql::insert(table, values);
        let mut conn = self.open().await?;
        let result = execute(&mut conn, &q).await.map(|r| r.last_insert_rowid());
        Self::close(conn).await;
        result
    }

    /// Update the row where `pk_column = key`. Returns the number of rows changed.
    pub async fn update(
        &self,
        table: &Table,
        values: &[(String, FieldValue)],
        key: &SqlValue,
        pk_column: &str,
        pk_type: Option<&str>,
    ) -> Result<u64, AppError> {
        if table.column(pk_column).is_none() {
            return Err(unknown_column(table, pk_column));
        }
        let q = sql::update(table, values, pk_column, key, pk_type)
            .ok_or_else(|| AppError::Validation("nothing to update".into()))?;
        let mut conn = self.open().await?;
        let result = execute(&mut conn, &q).await.map(|r| r.rows_affected());
        Self::close(conn).await;
        result
    }
}

fn unknown_column(table: &Table, column: &str) -> AppError {
    AppError::Validation(format!("table {} has no column {}", table.name, column))
}

async fn fetch_rows(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    let rows = query.fetch_all(&mut *conn).await?;
    Ok(rows.iter().map(read_row).collect())
}

async fn fetch_optional(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<Option<Row>, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    let row = query.fetch_optional(&mut *conn).await?;
    Ok(row.as_ref().map(read_row))
}

async fn fetch_count(conn: &mut SqliteConnection, q: &QueryBuf) -> Result<u64, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    let n = query.fetch_one(&mut *conn).await?;
    Ok(n.max(0) as u64)
}

async fn execute(
    conn: &mut SqliteConnection,
    q: &QueryBuf,
) -> Result<sqlx::sqlite::SqliteQueryResult, AppError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    Ok(query.execute(&mut *conn).await?)
}

fn read_row(row: &SqliteRow) -> Row {
    use sqlx::Column as _;
    use sqlx::Row as _;
    let cells = row
        .columns()
        .iter()
        .enumerate()
        .map(|(i, col)| Cell {
            column: col.name().to_string(),
            value: cell_to_value(row, i),
        })
        .collect();
    Row { cells }
}

fn cell_to_value(row: &SqliteRow, i: usize) -> SqlValue {
    use sqlx::Row as _;
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map(SqlValue::Integer).unwrap_or(SqlValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v.map(SqlValue::Real).unwrap_or(SqlValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return v.map(SqlValue::Text).unwrap_or(SqlValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(i) {
        return v.map(SqlValue::Blob).unwrap_or(SqlValue::Null);
    }
    SqlValue::Null
}
