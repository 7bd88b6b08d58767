pub mod notion;
pub mod sqlite;

use thiserror::Error;

use crate::models::{NewRecord, RecordPatch, RemoteRecord};

pub use notion::NotionStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store api error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("unable to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("record not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every live record.
    All,
    /// Live records whose title equals the value exactly (case-sensitive).
    TitleEquals(String),
}

/// The external store events are synced into.
///
/// Queries only ever return records that are not archived.
pub trait RecordStore {
    fn query(&mut self, filter: &RecordFilter) -> Result<Vec<RemoteRecord>, StoreError>;
    fn create(&mut self, fields: &NewRecord) -> Result<RemoteRecord, StoreError>;
    fn update(&mut self, id: &str, patch: &RecordPatch) -> Result<RemoteRecord, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn query(&mut self, filter: &RecordFilter) -> Result<Vec<RemoteRecord>, StoreError> {
        (**self).query(filter)
    }

    fn create(&mut self, fields: &NewRecord) -> Result<RemoteRecord, StoreError> {
        (**self).create(fields)
    }

    fn update(&mut self, id: &str, patch: &RecordPatch) -> Result<RemoteRecord, StoreError> {
        (**self).update(id, patch)
    }
}
