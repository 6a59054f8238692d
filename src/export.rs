//! Event table rows and the downloadable CSV artifact.
//!
//! The search endpoint returns UTC instants; rows here carry start, end,
//! and predicted-end timestamps converted to each event's local timezone,
//! matching what the operator sees on the ground.

use crate::models::Event;
use crate::{Result, SurgeboardError};
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// CSV header, in column order
pub const CSV_COLUMNS: [&str; 10] = [
    "id",
    "title",
    "phq_attendance",
    "category",
    "start_date_local",
    "end_date_local",
    "predicted_end_date_local",
    "venue_name",
    "venue_address",
    "placekey",
];

/// One row of the event table. Field order matches `CSV_COLUMNS`.
#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub id: String,
    pub title: String,
    pub phq_attendance: u64,
    pub category: String,
    pub start_date_local: String,
    pub end_date_local: String,
    pub predicted_end_date_local: String,
    pub venue_name: String,
    pub venue_address: String,
    pub placekey: String,
}

/// Build table rows from fetched events
#[must_use]
pub fn event_rows(events: &[Event]) -> Vec<EventRow> {
    events
        .iter()
        .map(|event| {
            let tz = event.tz();
            let venue = event.venue();

            EventRow {
                id: event.id.clone(),
                title: event.title.clone(),
                phq_attendance: event.phq_attendance.unwrap_or(0),
                category: event.category.clone(),
                start_date_local: localize(event.start, tz),
                end_date_local: localize(event.end, tz),
                predicted_end_date_local: match (event.predicted_end, tz) {
                    (Some(predicted_end), Some(_)) => localize(predicted_end, tz),
                    _ => String::new(),
                },
                venue_name: venue
                    .and_then(|v| v.name.clone())
                    .unwrap_or_default(),
                venue_address: venue
                    .and_then(|v| v.formatted_address.clone())
                    .unwrap_or_default(),
                placekey: event
                    .geo
                    .as_ref()
                    .and_then(|geo| geo.placekey.clone())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// Encode rows as CSV: header first, then one line per event
pub fn to_csv(rows: &[EventRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| SurgeboardError::general(format!("CSV encoding failed: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| SurgeboardError::general(format!("CSV encoding failed: {e}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SurgeboardError::general(format!("CSV encoding failed: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| SurgeboardError::general(format!("CSV output was not UTF-8: {e}")))
}

/// Render a UTC instant in the event's local timezone, RFC 3339 with a
/// numeric offset. Events without a usable timezone stay in UTC.
fn localize(instant: DateTime<Utc>, tz: Option<Tz>) -> String {
    match tz {
        Some(tz) => instant
            .with_timezone(&tz)
            .to_rfc3339_opts(SecondsFormat::Secs, false),
        None => instant.to_rfc3339_opts(SecondsFormat::Secs, false),
    }
}
