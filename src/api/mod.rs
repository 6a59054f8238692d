//! HTTP handlers for the dashboard frontend.
//!
//! Every data route resolves the operator's selections into a request-scoped
//! `ViewContext`, fetches through the shared client, and returns a view
//! model. Failures map to a warning payload per panel: a missing token is a
//! 503 so the frontend shows its one-line configuration warning, fetch
//! failures are a 502, bad selections a 400.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::charts::{DailyAttendanceChart, FeatureAttendanceChart, daily_attendance_chart, feature_attendance_chart};
use crate::config::SurgeboardConfig;
use crate::context::ViewContext;
use crate::export::{EventRow, event_rows, to_csv};
use crate::map::{MapView, build_map_view};
use crate::metrics::{MetricsPanel, build_metrics};
use crate::models::{
    ATTENDED_CATEGORIES, DateRangePreset, Location, PHQ_ATTENDANCE_FEATURES,
};
use crate::phq::PhqClient;
use crate::{Result, SurgeboardError};

/// Shared state behind all handlers
pub struct AppState {
    pub client: PhqClient,
    pub config: SurgeboardConfig,
}

/// Selections common to every dashboard route
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Location id; defaults to the first roster entry
    pub location: Option<String>,
    /// Date-range preset id; defaults to the first preset
    pub daterange: Option<String>,
    /// Radius override; defaults to the suggested radius
    pub radius: Option<f64>,
    /// Comma-separated category filter (event search/map only)
    pub categories: Option<String>,
}

/// Warning payload returned on any failed panel
#[derive(Debug, Serialize)]
pub struct ApiWarning {
    pub warning: String,
}

/// Configuration status for the frontend's warning banner
#[derive(Debug, Serialize)]
pub struct ApiStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

type ApiFailure = (StatusCode, Json<ApiWarning>);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/locations", get(locations))
        .route("/dateranges", get(dateranges))
        .route("/metrics", get(metrics))
        .route("/map", get(map_view))
        .route("/charts/daily", get(chart_daily))
        .route("/charts/by-feature", get(chart_by_feature))
        .route("/events", get(events))
        .route("/events.csv", get(events_csv))
        .with_state(state)
}

fn failure(err: SurgeboardError) -> ApiFailure {
    let status = match &err {
        SurgeboardError::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SurgeboardError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        SurgeboardError::Validation { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %err, "panel render failed");
    (
        status,
        Json(ApiWarning {
            warning: err.user_message(),
        }),
    )
}

/// Resolve query selections into a request-scoped context. Fetches the
/// suggested radius, which doubles as the default radius.
async fn resolve_context(state: &AppState, query: &DashboardQuery) -> Result<ViewContext> {
    let location = match &query.location {
        Some(id) => Location::by_id(id)
            .ok_or_else(|| SurgeboardError::validation(format!("unknown location '{id}'")))?,
        None => Location::roster().swap_remove(0),
    };

    let preset_id = query.daterange.as_deref().unwrap_or("next-7-days");
    let preset = DateRangePreset::by_id(preset_id)
        .ok_or_else(|| SurgeboardError::validation(format!("unknown date range '{preset_id}'")))?;

    let today = Utc::now().with_timezone(&location.tz()).date_naive();
    let (date_from, date_to) = preset.resolve(today);

    let suggested = state
        .client
        .suggested_radius(
            location.latitude,
            location.longitude,
            location.units.radius_unit(),
            "restaurants",
        )
        .await?;

    let radius = query.radius.unwrap_or(suggested.radius);
    if !(radius.is_finite() && radius >= 0.0) {
        return Err(SurgeboardError::validation(format!(
            "radius must be a non-negative number, got {radius}"
        )));
    }

    Ok(ViewContext {
        location,
        date_from,
        date_to,
        radius,
        radius_unit: suggested.radius_unit,
        suggested_radius: suggested.radius,
    })
}

fn selected_categories(query: &DashboardQuery) -> Vec<String> {
    match query.categories.as_deref() {
        Some(list) if !list.is_empty() => list.split(',').map(str::to_string).collect(),
        _ => ATTENDED_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
    }
}

async fn status(State(state): State<Arc<AppState>>) -> Json<ApiStatus> {
    let configured = state.config.has_token();
    Json(ApiStatus {
        configured,
        warning: (!configured)
            .then(|| SurgeboardError::config("no token").user_message()),
    })
}

async fn locations() -> Json<Vec<Location>> {
    Json(Location::roster())
}

async fn dateranges() -> Json<Vec<DateRangePreset>> {
    Json(DateRangePreset::all())
}

async fn metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Json<MetricsPanel>, ApiFailure> {
    let ctx = resolve_context(&state, &query).await.map_err(failure)?;
    let panel = build_metrics(&state.client, &ctx).await.map_err(failure)?;
    Ok(Json(panel))
}

async fn map_view(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Json<MapView>, ApiFailure> {
    let ctx = resolve_context(&state, &query).await.map_err(failure)?;
    let categories = selected_categories(&query);
    let events = state
        .client
        .search_events(&ctx, &categories)
        .await
        .map_err(failure)?;
    Ok(Json(build_map_view(&ctx, &events)))
}

async fn chart_daily(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Json<DailyAttendanceChart>, ApiFailure> {
    let ctx = resolve_context(&state, &query).await.map_err(failure)?;
    let (records, surges) = tokio::try_join!(
        state.client.features(&ctx, PHQ_ATTENDANCE_FEATURES),
        state.client.demand_surges(&ctx),
    )
    .map_err(failure)?;
    Ok(Json(daily_attendance_chart(
        &records,
        PHQ_ATTENDANCE_FEATURES,
        &surges,
    )))
}

async fn chart_by_feature(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Json<FeatureAttendanceChart>, ApiFailure> {
    let ctx = resolve_context(&state, &query).await.map_err(failure)?;
    let (records, surges) = tokio::try_join!(
        state.client.features(&ctx, PHQ_ATTENDANCE_FEATURES),
        state.client.demand_surges(&ctx),
    )
    .map_err(failure)?;
    Ok(Json(feature_attendance_chart(
        &records,
        PHQ_ATTENDANCE_FEATURES,
        &surges,
    )))
}

async fn events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<Json<Vec<EventRow>>, ApiFailure> {
    let ctx = resolve_context(&state, &query).await.map_err(failure)?;
    let categories = selected_categories(&query);
    let events = state
        .client
        .search_events(&ctx, &categories)
        .await
        .map_err(failure)?;
    Ok(Json(event_rows(&events)))
}

async fn events_csv(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> std::result::Result<impl IntoResponse, ApiFailure> {
    let ctx = resolve_context(&state, &query).await.map_err(failure)?;
    let categories = selected_categories(&query);
    let events = state
        .client
        .search_events(&ctx, &categories)
        .await
        .map_err(failure)?;

    let csv = to_csv(&event_rows(&events)).map_err(failure)?;
    let filename = format!(
        "events-{}-{}-to-{}.csv",
        ctx.location.id, ctx.date_from, ctx.date_to
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}
