use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{RecordFilter, RecordStore, StoreError};
use crate::models::{NewRecord, RecordPatch, RemoteRecord};
use crate::utils;

/// Local stand-in for the remote store, one row per synced event.
pub struct SqliteStore {
    conn: Connection,
}

const SELECT_COLUMNS: &str = "SELECT id, title, date, location, description, url, archived FROM records";

impl SqliteStore {
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&utils::database_path())
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        utils::ensure_parent(path)?;
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS records(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                date TEXT,
                location TEXT NOT NULL,
                description TEXT NOT NULL,
                url TEXT NOT NULL,
                archived INTEGER NOT NULL DEFAULT 0,
                created_at_utc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS records_title ON records(title);",
        )
    }

    fn get(&self, id: i64) -> Result<RemoteRecord, StoreError> {
        self.conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                record_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

impl RecordStore for SqliteStore {
    fn query(&mut self, filter: &RecordFilter) -> Result<Vec<RemoteRecord>, StoreError> {
        let mut out = Vec::new();
        match filter {
            RecordFilter::All => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{SELECT_COLUMNS} WHERE archived = 0 ORDER BY id"))?;
                for row in stmt.query_map([], record_from_row)? {
                    out.push(row?);
                }
            }
            RecordFilter::TitleEquals(title) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE archived = 0 AND title = ?1 ORDER BY id"
                ))?;
                for row in stmt.query_map(params![title], record_from_row)? {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    fn create(&mut self, fields: &NewRecord) -> Result<RemoteRecord, StoreError> {
        let now = Utc::now().to_rfc3339();
        let date = fields.date.map(|d| d.format("%Y-%m-%d").to_string());
        self.conn.execute(
            "INSERT INTO records (title, date, location, description, url, archived, created_at_utc)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            params![
                fields.title,
                date,
                fields.location,
                fields.description,
                fields.url,
                now
            ],
        )?;
        self.get(self.conn.last_insert_rowid())
    }

    fn update(&mut self, id: &str, patch: &RecordPatch) -> Result<RemoteRecord, StoreError> {
        let row_id: i64 = id
            .parse()
            .map_err(|_| StoreError::NotFound(id.to_string()))?;
        if let Some(archived) = patch.archived {
            let changed = self.conn.execute(
                "UPDATE records SET archived = ?2 WHERE id = ?1",
                params![row_id, archived],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id.to_string()));
            }
        }
        self.get(row_id)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<RemoteRecord> {
    let id: i64 = row.get(0)?;
    Ok(RemoteRecord {
        id: id.to_string(),
        title: row.get(1)?,
        date: row.get(2)?,
        location: row.get(3)?,
        description: row.get(4)?,
        url: row.get(5)?,
        archived: row.get(6)?,
    })
}
