//! SQLite-backed catalog repository.
//!
//! Tags are stored as a JSON array in a `TEXT` column and matched with
//! `json_each`. Every statement runs on tokio's blocking pool, so SQLite I/O
//! never stalls an async worker.

use crate::repository::CatalogRepository;
use crate::search::fold_case;
use crate::wallpaper::{NewWallpaper, Wallpaper};
use crate::{CatalogError, CatalogResult};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS wallpapers (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        name       TEXT    NOT NULL,
        tags       TEXT    NOT NULL,
        image_url  TEXT    NOT NULL UNIQUE,
        file_name  TEXT    NOT NULL,
        file_size  INTEGER NOT NULL CHECK (file_size > 0),
        mime_type  TEXT    NOT NULL,
        created_at TEXT    NOT NULL,
        updated_at TEXT    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_wallpapers_created_at ON wallpapers(created_at);";

const SELECT_COLUMNS: &str = "SELECT id, name, tags, image_url, file_name, file_size, \
     mime_type, created_at, updated_at FROM wallpapers";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

pub struct SqliteCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogRepository {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> CatalogResult<Self> {
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        info!(path = %path.display(), "catalog database opened");
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> CatalogResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> CatalogResult<Self> {
        conn.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let value: Option<String> = ctx.get(0)?;
                Ok(value.map(|v| fold_case(&v)))
            },
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `op` against the connection on the blocking pool.
    async fn run<T, F>(&self, op: F) -> CatalogResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| CatalogError::Internal("database connection lock poisoned".into()))?;
            op(&*guard).map_err(CatalogError::from)
        })
        .await?
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn initialise(&self) -> CatalogResult<()> {
        self.run(|conn| conn.execute_batch(SCHEMA)).await?;
        info!("catalog schema initialised");
        Ok(())
    }

    async fn insert(&self, wallpaper: NewWallpaper) -> CatalogResult<Wallpaper> {
        self.run(move |conn| {
            let tags = wallpaper.tag_strings();
            let tags_json = serde_json::to_string(&tags)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            let file_size = i64::try_from(wallpaper.file_size)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            let now = Utc::now().trunc_subsecs(6);
            let stamp = format_timestamp(now);

            conn.execute(
                "INSERT INTO wallpapers
                     (name, tags, image_url, file_name, file_size, mime_type, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    wallpaper.name.as_str(),
                    tags_json,
                    wallpaper.image_url,
                    wallpaper.file_name,
                    file_size,
                    wallpaper.mime_type,
                    stamp,
                ],
            )?;

            Ok(Wallpaper {
                id: conn.last_insert_rowid(),
                name: wallpaper.name.into_inner(),
                tags,
                image_url: wallpaper.image_url,
                file_name: wallpaper.file_name,
                file_size: wallpaper.file_size,
                mime_type: wallpaper.mime_type,
                created_at: now,
                updated_at: now,
            })
        })
        .await
    }

    async fn list_all(&self) -> CatalogResult<Vec<Wallpaper>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} {NEWEST_FIRST}"))?;
            let rows = stmt.query_map([], row_to_wallpaper)?;
            rows.collect()
        })
        .await
    }

    async fn search(&self, query: &str) -> CatalogResult<Vec<Wallpaper>> {
        let folded = fold_case(query);
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS}
                 WHERE instr(fold_case(name), ?1) > 0
                    OR EXISTS (
                        SELECT 1 FROM json_each(wallpapers.tags) AS tag
                        WHERE fold_case(tag.value) = ?1
                    )
                 {NEWEST_FIRST}"
            ))?;
            let rows = stmt.query_map(params![folded], row_to_wallpaper)?;
            rows.collect()
        })
        .await
    }

    async fn find_by_id(&self, id: i64) -> CatalogResult<Option<Wallpaper>> {
        self.run(move |conn| {
            conn.query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                row_to_wallpaper,
            )
            .optional()
        })
        .await
    }

    async fn delete_by_id(&self, id: i64) -> CatalogResult<bool> {
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM wallpapers WHERE id = ?1", params![id])?;
            Ok(removed > 0)
        })
        .await
    }

    async fn file_names(&self) -> CatalogResult<Vec<String>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT file_name FROM wallpapers")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect()
        })
        .await
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_wallpaper(row: &Row<'_>) -> rusqlite::Result<Wallpaper> {
    let tags_json: String = row.get(2)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let file_size: i64 = row.get(5)?;
    let file_size = u64::try_from(file_size)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Integer, Box::new(e)))?;

    Ok(Wallpaper {
        id: row.get(0)?,
        name: row.get(1)?,
        tags,
        image_url: row.get(3)?,
        file_name: row.get(4)?,
        file_size,
        mime_type: row.get(6)?,
        created_at: parse_timestamp(row, 7)?,
        updated_at: parse_timestamp(row, 8)?,
    })
}
