//! The six summary tiles at the top of every dashboard page.
//!
//! Current and previous periods are fetched concurrently; each tile except
//! the suggested radius carries a period-over-period percentage delta.

use crate::aggregate::{percentage_delta, sum_of_event_counts, sum_of_features};
use crate::context::ViewContext;
use crate::models::{ATTENDED_CATEGORIES, NON_ATTENDED_CATEGORIES, PHQ_ATTENDANCE_FEATURES};
use crate::phq::PhqClient;
use crate::{Result, models::RadiusUnit};
use serde::Serialize;
use tracing::instrument;

/// One summary tile
#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub label: String,
    pub value: String,
    /// Period-over-period delta; `None` on tiles without a comparison
    pub delta_pct: Option<f64>,
}

/// The full tile row
#[derive(Debug, Clone, Serialize)]
pub struct MetricsPanel {
    pub tiles: Vec<Tile>,
}

/// Raw numbers feeding the tile row, separated out so assembly stays
/// testable without network access
#[derive(Debug, Clone)]
pub struct MetricInputs {
    pub attendance: f64,
    pub previous_attendance: f64,
    pub attended_events: u64,
    pub previous_attended_events: u64,
    pub non_attended_events: u64,
    pub previous_non_attended_events: u64,
    pub surge_count: usize,
    pub previous_surge_count: usize,
    pub days: i64,
}

/// Fetch everything the tile row needs and assemble it
#[instrument(skip(client, ctx), fields(location = %ctx.location.id))]
pub async fn build_metrics(client: &PhqClient, ctx: &ViewContext) -> Result<MetricsPanel> {
    let (prev_from, prev_to) = ctx.previous_period();
    let prev_ctx = ctx.with_range(prev_from, prev_to);

    let (features, prev_features, counts, prev_counts, surges, prev_surges) = tokio::try_join!(
        client.features(ctx, PHQ_ATTENDANCE_FEATURES),
        client.features(&prev_ctx, PHQ_ATTENDANCE_FEATURES),
        client.event_counts(ctx),
        client.event_counts(&prev_ctx),
        client.demand_surges(ctx),
        client.demand_surges(&prev_ctx),
    )?;

    let inputs = MetricInputs {
        attendance: sum_of_features(&features, PHQ_ATTENDANCE_FEATURES),
        previous_attendance: sum_of_features(&prev_features, PHQ_ATTENDANCE_FEATURES),
        attended_events: sum_of_event_counts(&counts, ATTENDED_CATEGORIES),
        previous_attended_events: sum_of_event_counts(&prev_counts, ATTENDED_CATEGORIES),
        non_attended_events: sum_of_event_counts(&counts, NON_ATTENDED_CATEGORIES),
        previous_non_attended_events: sum_of_event_counts(&prev_counts, NON_ATTENDED_CATEGORIES),
        surge_count: surges.len(),
        previous_surge_count: prev_surges.len(),
        days: ctx.days(),
    };

    Ok(assemble_tiles(
        ctx.suggested_radius,
        ctx.radius_unit,
        &inputs,
    ))
}

/// Turn raw metric numbers into the six display tiles
#[must_use]
pub fn assemble_tiles(
    suggested_radius: f64,
    radius_unit: RadiusUnit,
    inputs: &MetricInputs,
) -> MetricsPanel {
    let days = inputs.days.max(1) as f64;
    let average_daily = inputs.attendance / days;
    let previous_average_daily = inputs.previous_attendance / days;

    let tiles = vec![
        Tile {
            label: "Suggested Radius".to_string(),
            value: format!("{suggested_radius}{radius_unit}"),
            delta_pct: None,
        },
        Tile {
            label: "Predicted Attendance".to_string(),
            value: format_whole(inputs.attendance),
            delta_pct: Some(percentage_delta(
                inputs.attendance,
                inputs.previous_attendance,
            )),
        },
        Tile {
            label: "Avg Daily Attendance".to_string(),
            value: format_whole(average_daily),
            delta_pct: Some(percentage_delta(average_daily, previous_average_daily)),
        },
        Tile {
            label: "Attended Events".to_string(),
            value: format_whole(inputs.attended_events as f64),
            delta_pct: Some(percentage_delta(
                inputs.attended_events as f64,
                inputs.previous_attended_events as f64,
            )),
        },
        Tile {
            label: "Non-Attended Events".to_string(),
            value: format_whole(inputs.non_attended_events as f64),
            delta_pct: Some(percentage_delta(
                inputs.non_attended_events as f64,
                inputs.previous_non_attended_events as f64,
            )),
        },
        Tile {
            label: "Demand Surges".to_string(),
            value: format_whole(inputs.surge_count as f64),
            delta_pct: Some(percentage_delta(
                inputs.surge_count as f64,
                inputs.previous_surge_count as f64,
            )),
        },
    ];

    MetricsPanel { tiles }
}

/// Round to a whole number and group thousands with commas
#[must_use]
pub fn format_whole(value: f64) -> String {
    let negative = value < 0.0;
    let mut n = value.abs().round() as u64;
    let mut groups = Vec::new();

    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }

    groups.reverse();
    let joined = groups.join(",");
    if negative {
        format!("-{joined}")
    } else {
        joined
    }
}
