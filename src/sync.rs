//! Pushes scraped events into a [`RecordStore`].
//!
//! A run has two phases, always in this order: the sweep archives records
//! whose date has passed, then the create phase adds every event whose
//! title is not already live in the store.
//!
//! Deduplication is check-then-create over two separate store calls. It
//! holds within one serial run only; two overlapping runs can both miss
//! the same title and both create it.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::models::{Event, RecordPatch, RemoteRecord};
use crate::store::{RecordFilter, RecordStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Added,
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CreateSummary {
    pub added: usize,
    pub skipped: usize,
}

/// Current calendar date in the listing's timezone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

pub struct SyncEngine<S: RecordStore> {
    store: S,
    today: NaiveDate,
    /// Zone stored timestamps are converted into before comparing with `today`.
    timezone: Tz,
}

impl<S: RecordStore> SyncEngine<S> {
    pub fn new(store: S, today: NaiveDate, timezone: Tz) -> Self {
        Self {
            store,
            today,
            timezone,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Archives every live record dated strictly before today. Records
    /// without a date are left alone. Returns how many were archived.
    pub fn sweep_past(&mut self) -> Result<usize, StoreError> {
        let records = self.store.query(&RecordFilter::All)?;
        let mut archived = 0;

        for record in records {
            if !self.is_past(&record) {
                continue;
            }
            self.store.update(&record.id, &RecordPatch::archive())?;
            tracing::debug!(id = %record.id, title = %record.title, "archived past event");
            archived += 1;
        }

        if archived > 0 {
            tracing::info!(archived, "Removed {archived} past event(s) from the store.");
        } else {
            tracing::info!("No past events to remove.");
        }
        Ok(archived)
    }

    fn is_past(&self, record: &RemoteRecord) -> bool {
        match (record.date.as_deref(), record.event_date_in(self.timezone)) {
            (_, Some(date)) => date < self.today,
            (Some(raw), None) => {
                tracing::warn!(id = %record.id, date = raw, "stored date is unreadable, leaving record");
                false
            }
            (None, None) => false,
        }
    }

    /// Whether a live record with exactly this title exists.
    pub fn exists(&mut self, title: &str) -> Result<bool, StoreError> {
        let hits = self
            .store
            .query(&RecordFilter::TitleEquals(title.to_string()))?;
        Ok(!hits.is_empty())
    }

    /// Creates the record unconditionally.
    pub fn create_event(&mut self, event: &Event) -> Result<RemoteRecord, StoreError> {
        let fields = event.to_new_record();
        if fields.date.is_none() {
            // the Date property is dropped, not flagged anywhere else
            tracing::warn!(
                title = %event.title,
                raw_date = %event.raw_date,
                "no usable date, creating record without one"
            );
        }
        self.store.create(&fields)
    }

    pub fn add_event(&mut self, event: &Event) -> Result<SyncOutcome, StoreError> {
        if self.exists(&event.title)? {
            tracing::info!(title = %event.title, "Skipping (already exists): {}", event.title);
            return Ok(SyncOutcome::Skipped);
        }
        let record = self.create_event(event)?;
        tracing::info!(id = %record.id, "Added: {}", event.title);
        Ok(SyncOutcome::Added)
    }

    /// Adds events in order. The first store failure aborts the phase.
    pub fn create_missing(&mut self, events: &[Event]) -> Result<CreateSummary, StoreError> {
        let mut summary = CreateSummary::default();
        for event in events {
            match self.add_event(event)? {
                SyncOutcome::Added => summary.added += 1,
                SyncOutcome::Skipped => summary.skipped += 1,
            }
        }
        Ok(summary)
    }
}
