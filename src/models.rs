use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dates;

/// One event card scraped from the listing, before it is synced anywhere.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub title: String,
    pub raw_date: String, // as scraped, may be empty
    pub location: String,
    pub description: String,
    pub url: String,
}

impl Event {
    pub fn normalized_date(&self) -> Option<NaiveDate> {
        dates::parse_event_date(&self.raw_date)
    }

    /// Fields for a create mutation. `date` stays `None` when the scraped
    /// text cannot be normalized, so the store never sees the property.
    pub fn to_new_record(&self) -> NewRecord {
        NewRecord {
            title: self.title.clone(),
            date: self.normalized_date(),
            location: self.location.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NewRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub location: String,
    pub description: String,
    pub url: String,
}

/// A record as persisted by a [`crate::store::RecordStore`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RemoteRecord {
    pub id: String,
    pub title: String,
    /// Stored date text, usually `YYYY-MM-DD` but may carry a time part.
    pub date: Option<String>,
    pub location: String,
    pub description: String,
    pub url: String,
    pub archived: bool,
}

impl RemoteRecord {
    /// Calendar day of the stored date as seen in `tz`. A timestamp with
    /// an offset is converted first; a bare or offset-less value is taken
    /// at face value.
    pub fn event_date_in(&self, tz: Tz) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Some(instant.with_timezone(&tz).date_naive());
        }
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl RecordPatch {
    pub fn archive() -> Self {
        Self {
            archived: Some(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: Option<&str>) -> RemoteRecord {
        RemoteRecord {
            id: "1".to_string(),
            title: "Pizza Night".to_string(),
            date: date.map(str::to_string),
            location: String::new(),
            description: String::new(),
            url: String::new(),
            archived: false,
        }
    }

    const PERTH: Tz = chrono_tz::Australia::Perth;

    #[test]
    fn record_date_accepts_datetime_values() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 3);
        assert_eq!(record(Some("2026-02-03")).event_date_in(PERTH), expected);
        assert_eq!(
            record(Some("2026-02-03T12:00:00.000+08:00")).event_date_in(PERTH),
            expected
        );
        assert_eq!(record(Some("2026-02-03T09:30")).event_date_in(PERTH), expected);
        assert_eq!(record(Some("soon")).event_date_in(PERTH), None);
        assert_eq!(record(None).event_date_in(PERTH), None);
    }

    #[test]
    fn record_timestamps_are_read_in_the_given_zone() {
        let evening_utc = record(Some("2026-03-09T20:00:00.000Z"));
        assert_eq!(
            evening_utc.event_date_in(PERTH),
            NaiveDate::from_ymd_opt(2026, 3, 10)
        );
        assert_eq!(
            evening_utc.event_date_in(chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2026, 3, 9)
        );
        assert_eq!(
            record(Some("2026-03-10T07:00:00+08:00")).event_date_in(chrono_tz::America::New_York),
            NaiveDate::from_ymd_opt(2026, 3, 9)
        );
    }

    #[test]
    fn new_record_omits_unparseable_date() {
        let event = Event {
            title: "Free Lunch".to_string(),
            raw_date: "TBA".to_string(),
            location: "Library".to_string(),
            description: String::new(),
            url: "https://www.curtin.edu.au/events/free-lunch/".to_string(),
        };
        let fields = event.to_new_record();
        assert_eq!(fields.date, None);
        let json = serde_json::to_value(&fields).expect("serialize");
        assert!(json.get("date").is_none());
    }
}
