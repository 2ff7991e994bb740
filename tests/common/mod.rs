//! Shared fixtures: a throwaway SQLite file with a known schema.
#![allow(dead_code)]

use schema_crud::{AppState, Dao, Settings};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use tempfile::TempDir;

pub const PEOPLE: &str = "CREATE TABLE people (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    note TEXT,
    created DATETIME DEFAULT CURRENT_TIMESTAMP
)";
pub const PEOPLE_NAME_IDX: &str = "CREATE INDEX people_name ON people (name)";
pub const PEOPLE_NAME_CREATED_IDX: &str = "CREATE INDEX people_name_created ON people (name, created)";
pub const TAGS: &str = "CREATE TABLE tags (label TEXT PRIMARY KEY, weight REAL)";

pub struct TestDb {
    // Keeps the directory alive for the duration of the test.
    _dir: TempDir,
    pub settings: Settings,
}

impl TestDb {
    pub fn dao(&self) -> Dao {
        Dao::new(&self.settings)
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.settings.clone())
    }

    pub async fn exec(&self, statements: &[&str]) {
        let mut conn = SqliteConnectOptions::new()
            .filename(&self.settings.database)
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        for sql in statements {
            sqlx::query(sql).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();
    }

    pub async fn count(&self, table: &str) -> i64 {
        let mut conn = SqliteConnectOptions::new()
            .filename(&self.settings.database)
            .connect()
            .await
            .unwrap();
        let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM \"{}\"", table))
            .fetch_one(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();
        n
    }
}

/// Empty database file created from `statements`.
pub async fn database(statements: &[&str]) -> TestDb {
    schema_crud::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::for_database(dir.path().join("test.db"));
    let db = TestDb { _dir: dir, settings };
    db.exec(statements).await;
    db
}

/// `people` (with both indexes) and `tags`.
pub async fn people_and_tags() -> TestDb {
    database(&[PEOPLE, PEOPLE_NAME_IDX, PEOPLE_NAME_CREATED_IDX, TAGS]).await
}

pub async fn insert_people(db: &TestDb, names: &[&str]) {
    let statements: Vec<String> = names
        .iter()
        .map(|n| format!("INSERT INTO people (name) VALUES ('{}')", n.replace('\'', "''")))
        .collect();
    let refs: Vec<&str> = statements.iter().map(String::as_str).collect();
    db.exec(&refs).await;
}
