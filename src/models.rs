//! Data model: restaurant locations, date-range presets, and the typed
//! records returned by the events API.
//!
//! Nothing here is persisted. The location roster and presets are static
//! reference data; everything else is re-fetched per interaction and held
//! only for the duration of a render cycle.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Event categories where people physically attend
pub const ATTENDED_CATEGORIES: &[&str] = &[
    "community",
    "concerts",
    "conferences",
    "expos",
    "festivals",
    "performing-arts",
    "sports",
];

/// Event categories with demand impact but no physical attendance
pub const NON_ATTENDED_CATEGORIES: &[&str] = &[
    "academic",
    "daylight-savings",
    "observances",
    "politics",
    "public-holidays",
    "school-holidays",
];

/// Unscheduled event categories (disruptions rather than gatherings)
pub const UNSCHEDULED_CATEGORIES: &[&str] = &[
    "airport-delays",
    "disasters",
    "health-warnings",
    "severe-weather",
    "terror",
];

/// Predicted-attendance features tracked on the dashboard. The academic and
/// school-holiday features exist upstream but are left out to match the
/// attended categories above.
pub const PHQ_ATTENDANCE_FEATURES: &[&str] = &[
    "phq_attendance_community",
    "phq_attendance_concerts",
    "phq_attendance_conferences",
    "phq_attendance_expos",
    "phq_attendance_festivals",
    "phq_attendance_performing_arts",
    "phq_attendance_sports",
];

/// Unit system a location reports in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Imperial,
    Metric,
}

impl UnitSystem {
    /// Radius unit matching the unit system
    #[must_use]
    pub fn radius_unit(self) -> RadiusUnit {
        match self {
            UnitSystem::Imperial => RadiusUnit::Mi,
            UnitSystem::Metric => RadiusUnit::Km,
        }
    }
}

/// Radius unit accepted by the external API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadiusUnit {
    Mi,
    Km,
    Ft,
    M,
}

impl RadiusUnit {
    /// Conversion factor to meters (the map layer only speaks meters)
    #[must_use]
    pub fn meters_per_unit(self) -> f64 {
        match self {
            RadiusUnit::Mi => 1609.0,
            RadiusUnit::Km => 1000.0,
            RadiusUnit::Ft => 0.3048,
            RadiusUnit::M => 1.0,
        }
    }
}

impl fmt::Display for RadiusUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RadiusUnit::Mi => "mi",
            RadiusUnit::Km => "km",
            RadiusUnit::Ft => "ft",
            RadiusUnit::M => "m",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RadiusUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mi" => Ok(RadiusUnit::Mi),
            "km" => Ok(RadiusUnit::Km),
            "ft" => Ok(RadiusUnit::Ft),
            "m" => Ok(RadiusUnit::M),
            other => Err(format!("unknown radius unit '{other}'")),
        }
    }
}

/// A restaurant location the operator can select
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Stable identifier used in URLs and cache keys
    pub id: String,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA timezone name
    pub timezone: String,
    /// Unit system used for radii at this location
    pub units: UnitSystem,
}

impl Location {
    /// Parsed timezone, falling back to UTC for malformed names
    #[must_use]
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(Tz::UTC)
    }

    /// The static roster of selectable restaurant locations
    #[must_use]
    pub fn roster() -> Vec<Location> {
        fn loc(
            id: &str,
            name: &str,
            address: &str,
            latitude: f64,
            longitude: f64,
            timezone: &str,
            units: UnitSystem,
        ) -> Location {
            Location {
                id: id.to_string(),
                name: name.to_string(),
                address: address.to_string(),
                latitude,
                longitude,
                timezone: timezone.to_string(),
                units,
            }
        }

        vec![
            loc(
                "san-francisco",
                "San Francisco, US",
                "30 Fremont St",
                37.79075,
                -122.39754,
                "America/Los_Angeles",
                UnitSystem::Imperial,
            ),
            loc(
                "new-york",
                "New York, US",
                "121 Reade St",
                40.71714,
                -74.00969,
                "America/New_York",
                UnitSystem::Imperial,
            ),
            loc(
                "los-angeles",
                "Los Angeles, US",
                "816 S Figueroa St",
                34.04977,
                -118.26218,
                "America/Los_Angeles",
                UnitSystem::Imperial,
            ),
            loc(
                "toronto",
                "Toronto, CA",
                "200 King Street West",
                43.64812,
                -79.38559,
                "America/Toronto",
                UnitSystem::Metric,
            ),
            loc(
                "london",
                "London, UK",
                "Parker Mews",
                51.51612,
                -0.12266,
                "Europe/London",
                UnitSystem::Metric,
            ),
            loc(
                "paris",
                "Paris, FR",
                "14 Rue Croix des Petits Champs",
                48.86409,
                2.33944,
                "Europe/Paris",
                UnitSystem::Metric,
            ),
            loc(
                "berlin",
                "Berlin, DE",
                "Leipziger Pl. 12",
                52.51231,
                13.38184,
                "Europe/Berlin",
                UnitSystem::Metric,
            ),
            loc(
                "sydney",
                "Sydney, AU",
                "Lang St",
                -33.86333,
                151.20590,
                "Australia/Sydney",
                UnitSystem::Metric,
            ),
            loc(
                "auckland",
                "Auckland, NZ",
                "31 Customs Street West",
                -36.84316,
                174.76427,
                "Pacific/Auckland",
                UnitSystem::Metric,
            ),
        ]
    }

    /// Look up a roster location by id
    #[must_use]
    pub fn by_id(id: &str) -> Option<Location> {
        Self::roster().into_iter().find(|l| l.id == id)
    }
}

/// A named date-range preset, resolved relative to "today" in the selected
/// location's timezone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangePreset {
    pub id: String,
    pub name: String,
    pub days: i64,
}

impl DateRangePreset {
    /// All selectable presets
    #[must_use]
    pub fn all() -> Vec<DateRangePreset> {
        fn preset(id: &str, name: &str, days: i64) -> DateRangePreset {
            DateRangePreset {
                id: id.to_string(),
                name: name.to_string(),
                days,
            }
        }

        vec![
            preset("next-7-days", "Next 7 days", 7),
            preset("next-30-days", "Next 30 days", 30),
            preset("next-90-days", "Next 90 days", 90),
        ]
    }

    /// Look up a preset by id
    #[must_use]
    pub fn by_id(id: &str) -> Option<DateRangePreset> {
        Self::all().into_iter().find(|p| p.id == id)
    }

    /// Resolve to a concrete from/to pair starting at `today`
    #[must_use]
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today, today + Duration::days(self.days))
    }
}

/// A linked entity on an event (the table only cares about venues)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

/// Geo payload on an event: GeoJSON-shaped geometry plus an optional
/// place identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventGeo {
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
    #[serde(default)]
    pub placekey: Option<String>,
}

/// An event returned by the search endpoint. Instants are UTC; the
/// presentation layer converts to the event's local timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub phq_attendance: Option<u64>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub local_rank: Option<u32>,
    #[serde(default)]
    pub timezone: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub predicted_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub geo: Option<EventGeo>,
}

impl Event {
    /// The event's venue entity, if any
    #[must_use]
    pub fn venue(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_type == "venue")
    }

    /// Parsed event timezone, `None` when absent or malformed
    #[must_use]
    pub fn tz(&self) -> Option<Tz> {
        self.timezone.as_deref().and_then(|name| name.parse().ok())
    }
}

/// The `stats` block of a feature aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureStats {
    #[serde(default)]
    pub sum: f64,
}

/// One feature's aggregate within a per-date record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureValue {
    #[serde(default)]
    pub stats: FeatureStats,
}

/// A per-date record from the features endpoint: the date plus one
/// aggregate per requested feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub features: HashMap<String, FeatureValue>,
}

/// Event counts by category over a date range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventCounts {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub categories: HashMap<String, u64>,
}

/// A calendar date flagged as an attendance anomaly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandSurgeDate {
    pub date: NaiveDate,
    #[serde(default)]
    pub surge_intensity: Option<String>,
}

/// Suggested catchment radius for a location/industry pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedRadius {
    pub radius: f64,
    pub radius_unit: RadiusUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_lookup() {
        let location = Location::by_id("new-york").unwrap();
        assert_eq!(location.name, "New York, US");
        assert_eq!(location.tz(), Tz::America__New_York);
        assert_eq!(location.units.radius_unit(), RadiusUnit::Mi);

        assert!(Location::by_id("atlantis").is_none());
    }

    #[test]
    fn test_roster_timezones_parse() {
        for location in Location::roster() {
            assert!(
                location.timezone.parse::<Tz>().is_ok(),
                "bad tz for {}",
                location.id
            );
        }
    }

    #[test]
    fn test_category_groups_are_disjoint() {
        for category in ATTENDED_CATEGORIES {
            assert!(!NON_ATTENDED_CATEGORIES.contains(category));
            assert!(!UNSCHEDULED_CATEGORIES.contains(category));
        }
        for category in NON_ATTENDED_CATEGORIES {
            assert!(!UNSCHEDULED_CATEGORIES.contains(category));
        }
        // Each attended category has a matching attendance feature
        assert_eq!(PHQ_ATTENDANCE_FEATURES.len(), ATTENDED_CATEGORIES.len());
    }

    #[test]
    fn test_preset_resolution() {
        let preset = DateRangePreset::by_id("next-30-days").unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (from, to) = preset.resolve(today);
        assert_eq!(from, today);
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_radius_unit_roundtrip() {
        assert_eq!("mi".parse::<RadiusUnit>().unwrap(), RadiusUnit::Mi);
        assert_eq!(RadiusUnit::Km.to_string(), "km");
        assert!("furlongs".parse::<RadiusUnit>().is_err());
    }

    #[test]
    fn test_event_venue_extraction() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "title": "Test Show",
            "category": "concerts",
            "start": "2024-01-01T00:00:00Z",
            "end": "2024-01-01T03:00:00Z",
            "timezone": "America/New_York",
            "entities": [
                {"type": "event-group", "name": "Tour"},
                {"type": "venue", "name": "The Garden", "formatted_address": "4 Penn Plaza"}
            ]
        }))
        .unwrap();

        let venue = event.venue().unwrap();
        assert_eq!(venue.name.as_deref(), Some("The Garden"));
        assert_eq!(event.tz(), Some(Tz::America__New_York));
    }

    #[test]
    fn test_feature_record_flatten() {
        let record: FeatureRecord = serde_json::from_value(serde_json::json!({
            "date": "2024-01-01",
            "phq_attendance_sports": {"stats": {"sum": 1200.0}},
            "phq_attendance_concerts": {"stats": {"sum": 300.0}}
        }))
        .unwrap();

        assert_eq!(record.features.len(), 2);
        assert_eq!(record.features["phq_attendance_sports"].stats.sum, 1200.0);
    }
}
