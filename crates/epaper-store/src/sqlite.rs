// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent page store backed by SQLite.
//
// Each page is one row. Its regions are embedded as a JSON array in the
// `regions` column using the stable region wire shape, so a page and its
// hotspots are always read and written as a unit.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use epaper_core::config::EpaperConfig;
use epaper_core::error::{EpaperError, Result};
use epaper_core::types::{NewPage, Page, PageId, Region};

use crate::traits::PageStore;

/// SQLite schema for the pages table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS epaper_pages (
        id TEXT PRIMARY KEY,
        date TEXT NOT NULL,
        page_number INTEGER NOT NULL,
        image_url TEXT NOT NULL,
        regions TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        UNIQUE (date, page_number)
    )
"#;

const SELECT_COLUMNS: &str = "SELECT id, date, page_number, image_url, regions, created_at FROM epaper_pages";

/// Convert a `rusqlite::Error` into an `EpaperError::Database`.
fn db_err(context: &'static str) -> impl Fn(rusqlite::Error) -> EpaperError {
    move |e| EpaperError::Database(format!("{context}: {e}"))
}

/// Page store backed by a SQLite database.
///
/// `rusqlite` is synchronous, so every call runs on tokio's blocking pool
/// with the connection behind a mutex.
#[derive(Clone)]
pub struct SqlitePageStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePageStore {
    /// Open (or create) the page database at the given path.
    ///
    /// Enables WAL journal mode and creates the `epaper_pages` table if it
    /// does not exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;
        info!("Page store database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;
        debug!("In-memory page store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// The configured database, or an in-memory one when no path is set.
    pub fn from_config(config: &EpaperConfig) -> Result<Self> {
        match &config.database_path {
            Some(path) => Self::open(path),
            None => Self::open_in_memory(),
        }
    }

    /// Run `op` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| EpaperError::StoreUnavailable("page store lock poisoned".into()))?;
            op(&mut *guard)
        })
        .await
        .map_err(|e| EpaperError::StoreUnavailable(format!("page store task failed: {e}")))?
    }
}

fn fetch_page(conn: &Connection, id: &PageId) -> Result<Option<Page>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE id = ?1"),
        params![id.as_str()],
        row_to_page,
    )
    .optional()
    .map_err(db_err("get page"))
}

#[async_trait]
impl PageStore for SqlitePageStore {
    #[instrument(skip(self))]
    async fn get_pages(&self, date: Option<NaiveDate>) -> Result<Vec<Page>> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{SELECT_COLUMNS} WHERE (?1 IS NULL OR date = ?1)
                     ORDER BY page_number ASC, date ASC"
                ))
                .map_err(db_err("prepare get_pages"))?;
            let pages = stmt
                .query_map(params![date.map(|d| d.to_string())], row_to_page)
                .map_err(db_err("query get_pages"))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(db_err("collect rows"))?;
            debug!(count = pages.len(), "Pages listed");
            Ok(pages)
        })
        .await
    }

    #[instrument(skip(self), fields(page_id = %id))]
    async fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        let id = id.clone();
        self.with_conn(move |conn| fetch_page(conn, &id)).await
    }

    #[instrument(skip(self, page), fields(date = %page.date, page_number = page.page_number))]
    async fn add_page(&self, page: NewPage) -> Result<Page> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(db_err("begin"))?;
            let taken: bool = tx
                .query_row(
                    "SELECT EXISTS (SELECT 1 FROM epaper_pages WHERE date = ?1 AND page_number = ?2)",
                    params![page.date.to_string(), page.page_number],
                    |row| row.get(0),
                )
                .map_err(db_err("check page number"))?;
            if taken {
                return Err(EpaperError::InvalidPage(format!(
                    "page {} already exists for edition {}",
                    page.page_number, page.date
                )));
            }

            let created = Page {
                id: PageId::generate(),
                date: page.date,
                page_number: page.page_number,
                image_url: page.image_url,
                regions: Vec::new(),
                created_at: Utc::now(),
            };
            tx.execute(
                "INSERT INTO epaper_pages (id, date, page_number, image_url, regions, created_at)
                 VALUES (?1, ?2, ?3, ?4, '[]', ?5)",
                params![
                    created.id.as_str(),
                    created.date.to_string(),
                    created.page_number,
                    created.image_url,
                    created.created_at.to_rfc3339(),
                ],
            )
            .map_err(db_err("insert page"))?;
            tx.commit().map_err(db_err("commit"))?;

            info!(page_id = %created.id, "Page added");
            Ok(created)
        })
        .await
    }

    #[instrument(skip(self, regions), fields(page_id = %id, count = regions.len()))]
    async fn replace_regions(&self, id: &PageId, regions: Vec<Region>) -> Result<Page> {
        let id = id.clone();
        self.with_conn(move |conn| {
            let regions_json = serde_json::to_string(&regions)?;
            let tx = conn.transaction().map_err(db_err("begin"))?;
            let rows = tx
                .execute(
                    "UPDATE epaper_pages SET regions = ?1 WHERE id = ?2",
                    params![regions_json, id.as_str()],
                )
                .map_err(|e| EpaperError::StoreWriteFailed(format!("update regions: {e}")))?;
            if rows == 0 {
                return Err(EpaperError::PageNotFound(id));
            }
            let page = fetch_page(&tx, &id)?.ok_or_else(|| EpaperError::PageNotFound(id.clone()))?;
            tx.commit()
                .map_err(|e| EpaperError::StoreWriteFailed(format!("commit: {e}")))?;
            debug!("Regions replaced");
            Ok(page)
        })
        .await
    }

    #[instrument(skip(self), fields(page_id = %id))]
    async fn delete_page(&self, id: &PageId) -> Result<()> {
        let id = id.clone();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM epaper_pages WHERE id = ?1", params![id.as_str()])
                .map_err(|e| EpaperError::StoreWriteFailed(format!("delete page: {e}")))?;
            info!(page_id = %id, "Page deleted");
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_err(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

/// Map a SQLite row to a `Page`.
///
/// Column indices must match `SELECT_COLUMNS`.
fn row_to_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    let id: String = row.get(0)?;
    let date_str: String = row.get(1)?;
    let page_number: u32 = row.get(2)?;
    let image_url: String = row.get(3)?;
    let regions_json: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;

    let date: NaiveDate = date_str.parse().map_err(|e| conversion_err(1, e))?;
    let regions: Vec<Region> = serde_json::from_str(&regions_json).map_err(|e| conversion_err(4, e))?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(5, e))?;

    Ok(Page {
        id: PageId(id),
        date,
        page_number,
        image_url,
        regions,
        created_at,
    })
}
