//! Map view model: a radius circle, the restaurant marker, and per-event
//! overlays colored by local rank tier.
//!
//! Geometry is passed through GeoJSON-shaped; events without geometry are
//! skipped. Point and polygon features are split into separate layers so
//! the frontend can style them differently.

use crate::aggregate::rank_to_color_tier;
use crate::context::ViewContext;
use crate::metrics::format_whole;
use crate::models::{Event, RadiusUnit};
use serde::Serialize;

/// Marker color palette, warmest last
pub const COLOR_RANGE: [[u8; 3]; 5] = [
    [255, 174, 0],
    [255, 138, 25],
    [255, 104, 49],
    [255, 69, 74],
    [255, 35, 100],
];

/// Local-rank breakpoints matching `COLOR_RANGE`
pub const BREAKS: [u32; 5] = [20, 40, 60, 80, 100];

/// One event overlay on the map, with the tooltip fields inline
#[derive(Debug, Clone, Serialize)]
pub struct MapFeature {
    pub id: String,
    pub title: String,
    pub category: String,
    pub phq_attendance: u64,
    pub phq_attendance_formatted: String,
    pub rank: Option<u32>,
    pub local_rank: Option<u32>,
    pub fill_color: [u8; 3],
    pub geometry: serde_json::Value,
}

/// The full map view model
#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    /// Map center, `[latitude, longitude]`
    pub center: [f64; 2],
    /// Radius circle around the center, in meters
    pub radius_meters: f64,
    /// Point-geometry event overlays
    pub points: Vec<MapFeature>,
    /// Polygon (and other non-point) event overlays
    pub polygons: Vec<MapFeature>,
}

/// Convert a radius to meters, the only unit the map layer accepts
#[must_use]
pub fn radius_to_meters(value: f64, unit: RadiusUnit) -> f64 {
    value * unit.meters_per_unit()
}

/// Build the map view model from already-fetched events
#[must_use]
pub fn build_map_view(ctx: &ViewContext, events: &[Event]) -> MapView {
    let mut points = Vec::new();
    let mut polygons = Vec::new();

    for event in events {
        let Some(geometry) = event
            .geo
            .as_ref()
            .and_then(|geo| geo.geometry.clone())
        else {
            continue;
        };

        let attendance = event.phq_attendance.unwrap_or(0);
        let feature = MapFeature {
            id: event.id.clone(),
            title: event.title.clone(),
            category: event.category.clone(),
            phq_attendance: attendance,
            phq_attendance_formatted: format_whole(attendance as f64),
            rank: event.rank,
            local_rank: event.local_rank,
            fill_color: rank_to_color_tier(event.local_rank, &BREAKS, &COLOR_RANGE),
            geometry,
        };

        let is_point = feature
            .geometry
            .get("type")
            .and_then(|t| t.as_str())
            .is_some_and(|t| t == "Point");

        if is_point {
            points.push(feature);
        } else {
            polygons.push(feature);
        }
    }

    MapView {
        center: [ctx.location.latitude, ctx.location.longitude],
        radius_meters: radius_to_meters(ctx.radius, ctx.radius_unit),
        points,
        polygons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventGeo, Location};
    use rstest::rstest;

    fn event(id: &str, local_rank: Option<u32>, geometry: Option<serde_json::Value>) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {id}"),
            category: "concerts".to_string(),
            phq_attendance: Some(1500),
            rank: Some(50),
            local_rank,
            timezone: Some("America/New_York".to_string()),
            start: "2024-01-01T00:00:00Z".parse().unwrap(),
            end: "2024-01-01T02:00:00Z".parse().unwrap(),
            predicted_end: None,
            entities: vec![],
            geo: geometry.map(|g| EventGeo {
                geometry: Some(g),
                placekey: None,
            }),
        }
    }

    fn ctx() -> ViewContext {
        ViewContext {
            location: Location::by_id("new-york").unwrap(),
            date_from: "2024-01-01".parse().unwrap(),
            date_to: "2024-01-08".parse().unwrap(),
            radius: 2.0,
            radius_unit: RadiusUnit::Mi,
            suggested_radius: 2.0,
        }
    }

    #[rstest]
    #[case(1.0, RadiusUnit::Mi, 1609.0)]
    #[case(2.0, RadiusUnit::Km, 2000.0)]
    #[case(100.0, RadiusUnit::Ft, 30.48)]
    #[case(500.0, RadiusUnit::M, 500.0)]
    fn test_radius_to_meters(#[case] value: f64, #[case] unit: RadiusUnit, #[case] expected: f64) {
        assert!((radius_to_meters(value, unit) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_point_polygon_split_and_skipped_geometry() {
        let events = vec![
            event(
                "p1",
                Some(15),
                Some(serde_json::json!({"type": "Point", "coordinates": [-74.0, 40.7]})),
            ),
            event(
                "g1",
                Some(85),
                Some(serde_json::json!({"type": "Polygon", "coordinates": [[[0.0, 0.0]]]})),
            ),
            event("no-geo", Some(50), None),
        ];

        let view = build_map_view(&ctx(), &events);
        assert_eq!(view.points.len(), 1);
        assert_eq!(view.polygons.len(), 1);

        // local_rank 15 → first tier; 85 → fifth breakpoint window (85 < 100)
        assert_eq!(view.points[0].fill_color, COLOR_RANGE[0]);
        assert_eq!(view.polygons[0].fill_color, COLOR_RANGE[4]);
        assert_eq!(view.points[0].phq_attendance_formatted, "1,500");
    }

    #[test]
    fn test_center_and_radius() {
        let view = build_map_view(&ctx(), &[]);
        assert_eq!(view.center, [40.71714, -74.00969]);
        assert!((view.radius_meters - 3218.0).abs() < 1e-9);
        assert!(view.points.is_empty() && view.polygons.is_empty());
    }
}
