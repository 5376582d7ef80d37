//! `SQLite` implementation of [`ReadingStore`].

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{ConnectOptions, Connection, FromRow, Row, SqliteConnection};

use homelog_app::ports::ReadingStore;
use homelog_domain::error::HomelogError;
use homelog_domain::id::ValueId;
use homelog_domain::reading::Reading;
use homelog_domain::time;

use crate::error::StorageError;

const COUNT_SCHEMA_OBJECTS: &str = "SELECT COUNT(*) FROM sqlite_master";

/// Shape shared with tooling that reads the database file directly.
const CREATE_TABLE: &str = r"
    CREATE TABLE value (
        recorded_utc DATETIME DEFAULT CURRENT_TIMESTAMP,
        value_id INTEGER,
        value REAL
    )
";

const INSERT: &str = "INSERT INTO value (recorded_utc, value_id, value) VALUES (?, ?, ?)";
const BEGIN: &str = "BEGIN";
const COMMIT: &str = "COMMIT";
const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";
const ROLLBACK: &str = "ROLLBACK";
const COUNT: &str = "SELECT COUNT(*) FROM value";
const SELECT: &str = r"
    SELECT CAST(recorded_utc AS TEXT) AS recorded_utc, value_id, value
    FROM value
    ORDER BY rowid ASC
    LIMIT ?
";

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(Reading);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let recorded_utc: String = row.try_get("recorded_utc")?;
        let value_id: i64 = row.try_get("value_id")?;
        let value: f64 = row.try_get("value")?;

        let timestamp =
            time::from_sql(&recorded_utc).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Reading::new(
            timestamp,
            ValueId::from_sql(value_id),
            value,
        )))
    }
}

/// Configuration for the `SQLite` storage adapter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database location: a `sqlite:` URL, a plain file path, or empty /
    /// `:memory:` for a transient in-memory database.
    pub database_url: String,
}

impl Config {
    /// Open the store described by this configuration.
    ///
    /// Creates the database file if missing and the `value` table if the
    /// database holds no schema yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the location cannot be
    /// opened, created, or initialised, or is not writable.
    pub async fn open(self) -> Result<SqliteReadingStore, StorageError> {
        SqliteReadingStore::open(&self.database_url).await
    }
}

fn connect_options(location: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    let options = match location.trim() {
        "" | ":memory:" => SqliteConnectOptions::from_str("sqlite::memory:")?,
        url if url.starts_with("sqlite:") => SqliteConnectOptions::from_str(url)?,
        path => SqliteConnectOptions::new().filename(path),
    };
    Ok(options.create_if_missing(true))
}

/// Create the `value` table when the database is empty.
///
/// Returns whether the table was created.
async fn bootstrap(conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let (objects,): (i64,) = sqlx::query_as(COUNT_SCHEMA_OBJECTS)
        .fetch_one(&mut *conn)
        .await?;
    if objects > 0 {
        return Ok(false);
    }
    sqlx::query(CREATE_TABLE).execute(&mut *conn).await?;
    Ok(true)
}

/// Take and release the write lock.
///
/// `SQLite` silently falls back to read-only when the file cannot be written,
/// which would otherwise only show up on the first append.
async fn check_writable(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(BEGIN_IMMEDIATE).execute(&mut *conn).await?;
    sqlx::query(ROLLBACK).execute(&mut *conn).await?;
    Ok(())
}

/// `SQLite`-backed reading log holding a single writer connection.
///
/// Appends go into a transaction opened on the first append after a commit,
/// so they are visible through this connection right away and become durable
/// on [`flush`](ReadingStore::flush).
pub struct SqliteReadingStore {
    conn: Option<SqliteConnection>,
    location: String,
    in_transaction: bool,
    created_schema: bool,
}

impl SqliteReadingStore {
    /// Open or create the store at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the location cannot be
    /// opened, created, or initialised, or is not writable.
    #[tracing::instrument]
    pub async fn open(location: &str) -> Result<Self, StorageError> {
        let options = connect_options(location).map_err(StorageError::Unavailable)?;
        let mut conn = options.connect().await.map_err(StorageError::Unavailable)?;

        let created_schema = bootstrap(&mut conn)
            .await
            .map_err(StorageError::Unavailable)?;
        if created_schema {
            tracing::info!("created reading table");
        }
        check_writable(&mut conn)
            .await
            .map_err(StorageError::Unavailable)?;

        Ok(Self {
            conn: Some(conn),
            location: location.to_string(),
            in_transaction: false,
            created_schema,
        })
    }

    /// Where this store was opened.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether opening this store created the `value` table.
    #[must_use]
    pub fn created_schema(&self) -> bool {
        self.created_schema
    }

    /// Whether appended readings are waiting for a commit.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.in_transaction
    }

    /// Number of stored readings, uncommitted ones included.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close, or
    /// [`StorageError::Read`] if the query fails.
    pub async fn count(&mut self) -> Result<u64, StorageError> {
        let conn = self.conn.as_mut().ok_or(StorageError::Closed)?;
        let (count,): (i64,) = sqlx::query_as(COUNT)
            .fetch_one(conn)
            .await
            .map_err(StorageError::Read)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Stored readings in insertion order, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close, or
    /// [`StorageError::Read`] if the query fails.
    pub async fn list(&mut self, limit: Option<usize>) -> Result<Vec<Reading>, StorageError> {
        let conn = self.conn.as_mut().ok_or(StorageError::Closed)?;
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT)
            .bind(limit)
            .fetch_all(conn)
            .await
            .map_err(StorageError::Read)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

impl ReadingStore for SqliteReadingStore {
    async fn append(&mut self, reading: &Reading) -> Result<(), HomelogError> {
        let conn = self.conn.as_mut().ok_or(StorageError::Closed)?;

        if !self.in_transaction {
            sqlx::query(BEGIN)
                .execute(&mut *conn)
                .await
                .map_err(StorageError::Write)?;
            self.in_transaction = true;
        }

        sqlx::query(INSERT)
            .bind(time::to_sql(reading.timestamp))
            .bind(reading.value_id.to_sql())
            .bind(reading.value)
            .execute(&mut *conn)
            .await
            .map_err(StorageError::Write)?;

        Ok(())
    }

    async fn flush(&mut self) -> Result<(), HomelogError> {
        let conn = self.conn.as_mut().ok_or(StorageError::Closed)?;

        if self.in_transaction {
            sqlx::query(COMMIT)
                .execute(&mut *conn)
                .await
                .map_err(StorageError::Write)?;
            self.in_transaction = false;
            tracing::debug!(location = %self.location, "committed pending readings");
        }

        Ok(())
    }

    async fn close(&mut self) -> Result<(), HomelogError> {
        let mut conn = self.conn.take().ok_or(StorageError::Closed)?;

        let committed = if self.in_transaction {
            sqlx::query(COMMIT).execute(&mut conn).await.map(|_| ())
        } else {
            Ok(())
        };
        self.in_transaction = false;
        let closed = conn.close().await;

        committed.map_err(StorageError::Write)?;
        closed.map_err(StorageError::Write)?;

        tracing::info!(location = %self.location, "database closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    async fn memory() -> SqliteReadingStore {
        Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .open()
        .await
        .unwrap()
    }

    fn reading(value_id: u64, value: f64) -> Reading {
        Reading::now(ValueId::new(value_id), value)
    }

    async fn table_columns(store: &mut SqliteReadingStore) -> Vec<(String, String)> {
        let conn = store.conn.as_mut().unwrap();
        let rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT cid, name, type FROM pragma_table_info('value') ORDER BY cid")
                .fetch_all(conn)
                .await
                .unwrap();
        rows.into_iter().map(|(_, name, ty)| (name, ty)).collect()
    }

    async fn table_names(store: &mut SqliteReadingStore) -> Vec<String> {
        let conn = store.conn.as_mut().unwrap();
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(conn)
                .await
                .unwrap();
        rows.into_iter().map(|(name,)| name).collect()
    }

    #[tokio::test]
    async fn should_create_three_column_table_when_database_is_empty() {
        let mut store = memory().await;

        assert!(store.created_schema());
        assert_eq!(table_names(&mut store).await, ["value"]);
        assert_eq!(
            table_columns(&mut store).await,
            [
                ("recorded_utc".to_string(), "DATETIME".to_string()),
                ("value_id".to_string(), "INTEGER".to_string()),
                ("value".to_string(), "REAL".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn should_not_recreate_schema_when_reopening_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.db");
        let location = path.to_str().unwrap();

        let mut first = SqliteReadingStore::open(location).await.unwrap();
        assert!(first.created_schema());
        first.close().await.unwrap();

        let mut second = SqliteReadingStore::open(location).await.unwrap();
        assert!(!second.created_schema());
        assert_eq!(table_names(&mut second).await, ["value"]);
        second.close().await.unwrap();
    }

    #[tokio::test]
    async fn should_accept_sqlite_url_for_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("url.db").display());

        let mut store = SqliteReadingStore::open(&url).await.unwrap();
        assert!(store.created_schema());
        store.close().await.unwrap();
        assert!(dir.path().join("url.db").exists());
    }

    #[tokio::test]
    async fn should_open_in_memory_when_no_location_given() {
        let mut store = SqliteReadingStore::open("").await.unwrap();
        assert!(store.created_schema());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_fail_with_unavailable_when_location_cannot_be_created() {
        let result = SqliteReadingStore::open("/nonexistent/homelog/home.db").await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn should_fail_with_unavailable_when_store_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.db");
        let mut store = SqliteReadingStore::open(path.to_str().unwrap())
            .await
            .unwrap();
        store.close().await.unwrap();

        let url = format!("sqlite:{}?mode=ro", path.display());
        let result = SqliteReadingStore::open(&url).await;

        assert!(matches!(result, Err(StorageError::Unavailable(_))));
    }

    #[tokio::test]
    async fn should_make_appended_rows_visible_before_flush() {
        let mut store = memory().await;

        store.append(&reading(5, 21.5)).await.unwrap();

        assert!(store.has_pending());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_clear_pending_on_flush_and_allow_repeated_flush() {
        let mut store = memory().await;
        store.append(&reading(5, 21.5)).await.unwrap();

        store.flush().await.unwrap();
        assert!(!store.has_pending());
        store.flush().await.unwrap();

        store.append(&reading(5, 21.6)).await.unwrap();
        assert!(store.has_pending());
        store.flush().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn should_store_example_readings_with_literal_values() {
        let mut store = memory().await;
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let t1 = t0 + chrono::Duration::milliseconds(1500);
        let t2 = t0 + chrono::Duration::seconds(3);
        let readings = [
            Reading::new(t0, ValueId::new(5), 21.5),
            Reading::new(t1, ValueId::new(5), 21.7),
            Reading::new(t2, ValueId::new(9), 3.0),
        ];

        for r in &readings {
            store.append(r).await.unwrap();
        }

        assert_eq!(store.list(None).await.unwrap(), readings.to_vec());
        assert_eq!(store.list(Some(2)).await.unwrap(), readings[..2].to_vec());
    }

    #[tokio::test]
    async fn should_read_back_current_time_readings_unchanged() {
        let mut store = memory().await;
        let sent = [reading(5, 21.5), reading(9, 3.0)];
        for r in &sent {
            store.append(r).await.unwrap();
        }

        assert_eq!(store.list(None).await.unwrap(), sent.to_vec());
    }

    #[tokio::test]
    async fn should_persist_rows_across_close_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("home.db");
        let location = path.to_str().unwrap();

        let mut store = SqliteReadingStore::open(location).await.unwrap();
        for value in [1.0, 2.0, 3.0] {
            store.append(&reading(7, value)).await.unwrap();
        }
        store.close().await.unwrap();

        let mut reopened = SqliteReadingStore::open(location).await.unwrap();
        let values: Vec<f64> = reopened
            .list(None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(values, [1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn should_preserve_value_ids_above_i64_max() {
        let mut store = memory().await;
        store.append(&reading(u64::MAX, 1.0)).await.unwrap();
        store
            .append(&reading(0x0100_0000_0249_4000, 0.0))
            .await
            .unwrap();

        let ids: Vec<ValueId> = store
            .list(None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.value_id)
            .collect();
        assert_eq!(
            ids,
            [ValueId::new(u64::MAX), ValueId::new(0x0100_0000_0249_4000)]
        );
    }

    #[tokio::test]
    async fn should_default_recorded_utc_to_current_timestamp() {
        let mut store = memory().await;
        let conn = store.conn.as_mut().unwrap();
        sqlx::query("INSERT INTO value (value_id, value) VALUES (1, 2.5)")
            .execute(conn)
            .await
            .unwrap();

        let rows = store.list(None).await.unwrap();
        assert_eq!(rows.len(), 1);
        let age = Utc::now() - rows[0].timestamp;
        assert!(age < chrono::Duration::minutes(1));
    }

    #[tokio::test]
    async fn should_fail_with_closed_after_close() {
        let mut store = memory().await;
        store.append(&reading(5, 1.0)).await.unwrap();
        store.close().await.unwrap();

        assert!(matches!(
            store.append(&reading(5, 2.0)).await,
            Err(HomelogError::StorageClosed)
        ));
        assert!(matches!(
            store.flush().await,
            Err(HomelogError::StorageClosed)
        ));
        assert!(matches!(
            store.close().await,
            Err(HomelogError::StorageClosed)
        ));
        assert!(matches!(store.count().await, Err(StorageError::Closed)));
    }
}
