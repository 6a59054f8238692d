//! Typed client for the events-prediction API.
//!
//! Wraps the five read-only operations the dashboard uses: event search,
//! event counts, feature aggregates, demand-surge dates, and suggested
//! radius. Requests carry a bearer token and a short timeout; transport,
//! HTTP-status, and parse failures all collapse into a single `Fetch`
//! error so the presentation layer can show one warning per panel.
//! Responses are memoized per exact argument tuple.

use crate::config::SurgeboardConfig;
use crate::context::ViewContext;
use crate::models::{
    DemandSurgeDate, Event, EventCounts, FeatureRecord, RadiusUnit, SuggestedRadius,
};
use crate::{MemoCache, Result, SurgeboardError};
use chrono::{Duration as ChronoDuration, NaiveDate};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// The demand-surge endpoint always evaluates a fixed window of this many
/// days from `date_from`; results for longer ranges are silently truncated.
const SURGE_WINDOW_DAYS: i64 = 90;

/// Minimum surge intensity requested from the demand-surge endpoint
const MIN_SURGE_INTENSITY: &str = "m";

#[derive(Debug, Default, Deserialize, Serialize)]
struct EventsResponse {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    results: Vec<Event>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct FeaturesResponse {
    #[serde(default)]
    results: Vec<FeatureRecord>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct SurgeResponse {
    #[serde(default)]
    surge_dates: Vec<DemandSurgeDate>,
}

/// Events API client
pub struct PhqClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    cache: MemoCache,
}

impl PhqClient {
    /// Create a new client from configuration
    pub fn new(config: &SurgeboardConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_seconds))
            .user_agent(concat!("surgeboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SurgeboardError::general(format!("Failed to create HTTP client: {e}")))?;

        let cache = MemoCache::new(
            Duration::from_secs(config.cache.ttl_seconds),
            config.cache.max_entries,
        );

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            token: config.api.token.clone().filter(|t| !t.is_empty()),
            cache,
        })
    }

    /// True when a bearer token is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| SurgeboardError::config("No events API token configured"))
    }

    /// Search events around the context's location over its active range.
    ///
    /// The endpoint takes the range timezone but always returns UTC
    /// instants; callers convert to local time for display. Results are
    /// capped at 200, sorted by predicted attendance.
    #[instrument(skip(self, ctx), fields(location = %ctx.location.id))]
    pub async fn search_events(&self, ctx: &ViewContext, categories: &[String]) -> Result<Vec<Event>> {
        let key = format!(
            "events:{}:{}{}:{}:{}:{}:{}",
            ctx.location.id,
            ctx.radius,
            ctx.radius_unit,
            ctx.location.timezone,
            ctx.date_from,
            ctx.date_to,
            categories.join("+"),
        );
        if let Some(hit) = self.cache.get::<EventsResponse>(&key) {
            return Ok(hit.results);
        }

        let mut query = vec![
            ("within".to_string(), self.within(ctx)),
            ("active.gte".to_string(), ctx.date_from.to_string()),
            ("active.lte".to_string(), ctx.date_to.to_string()),
            ("active.tz".to_string(), ctx.location.timezone.clone()),
            ("state".to_string(), "active".to_string()),
            ("limit".to_string(), "200".to_string()),
            ("sort".to_string(), "phq_attendance".to_string()),
        ];
        if !categories.is_empty() {
            query.push(("category".to_string(), categories.join(",")));
        }

        let response: EventsResponse = self.get_json("/v1/events/", &query).await?;
        debug!(count = response.count, "event search returned");
        self.cache.put(&key, &response);
        Ok(response.results)
    }

    /// Event counts by category over the context's active range
    #[instrument(skip(self, ctx), fields(location = %ctx.location.id))]
    pub async fn event_counts(&self, ctx: &ViewContext) -> Result<EventCounts> {
        let key = format!(
            "counts:{}:{}{}:{}:{}:{}",
            ctx.location.id,
            ctx.radius,
            ctx.radius_unit,
            ctx.location.timezone,
            ctx.date_from,
            ctx.date_to,
        );
        if let Some(hit) = self.cache.get::<EventCounts>(&key) {
            return Ok(hit);
        }

        let query = vec![
            ("within".to_string(), self.within(ctx)),
            ("active.gte".to_string(), ctx.date_from.to_string()),
            ("active.lte".to_string(), ctx.date_to.to_string()),
            ("active.tz".to_string(), ctx.location.timezone.clone()),
            ("state".to_string(), "active".to_string()),
        ];

        let counts: EventCounts = self.get_json("/v1/events/count/", &query).await?;
        self.cache.put(&key, &counts);
        Ok(counts)
    }

    /// Per-date aggregates for the named features.
    ///
    /// The features endpoint works in local time, so the context's range is
    /// sent without a timezone qualifier.
    #[instrument(skip(self, ctx, feature_names), fields(location = %ctx.location.id))]
    pub async fn features(
        &self,
        ctx: &ViewContext,
        feature_names: &[&str],
    ) -> Result<Vec<FeatureRecord>> {
        let key = format!(
            "features:{}:{}{}:{}:{}:{}",
            ctx.location.id,
            ctx.radius,
            ctx.radius_unit,
            ctx.date_from,
            ctx.date_to,
            feature_names.join("+"),
        );
        if let Some(hit) = self.cache.get::<FeaturesResponse>(&key) {
            return Ok(hit.results);
        }

        let mut body = serde_json::json!({
            "active": {
                "gte": ctx.date_from,
                "lte": ctx.date_to,
            },
            "location": {
                "geo": {
                    "lat": ctx.location.latitude,
                    "lon": ctx.location.longitude,
                    "radius": format!("{}{}", ctx.radius, ctx.radius_unit),
                },
            },
        });
        for feature in feature_names {
            body[*feature] = serde_json::json!(true);
        }

        let response: FeaturesResponse = self.post_json("/v1/features", &body).await?;
        self.cache.put(&key, &response);
        Ok(response.results)
    }

    /// Demand-surge dates within the context's active range.
    ///
    /// The endpoint evaluates a fixed 90-day window from `date_from`
    /// regardless of the requested end date, so the response is filtered
    /// down to the sub-range the caller actually asked for.
    #[instrument(skip(self, ctx), fields(location = %ctx.location.id))]
    pub async fn demand_surges(&self, ctx: &ViewContext) -> Result<Vec<DemandSurgeDate>> {
        let key = format!(
            "surges:{}:{}{}:{}:{}",
            ctx.location.id, ctx.radius, ctx.radius_unit, ctx.date_from, ctx.date_to,
        );
        if let Some(hit) = self.cache.get::<Vec<DemandSurgeDate>>(&key) {
            return Ok(hit);
        }

        let window_end = ctx.date_from + ChronoDuration::days(SURGE_WINDOW_DAYS);
        if ctx.date_to > window_end {
            warn!(
                date_to = %ctx.date_to,
                window_end = %window_end,
                "surge range exceeds the server window; results truncated"
            );
        }

        let query = vec![
            (
                "location.origin".to_string(),
                format!("{},{}", ctx.location.latitude, ctx.location.longitude),
            ),
            (
                "location.radius".to_string(),
                format!("{}{}", ctx.radius, ctx.radius_unit),
            ),
            ("date_from".to_string(), ctx.date_from.to_string()),
            ("date_to".to_string(), window_end.to_string()),
            (
                "min_surge_intensity".to_string(),
                MIN_SURGE_INTENSITY.to_string(),
            ),
        ];

        let response: SurgeResponse = self.get_json("/v1/demand-surge", &query).await?;
        let surges = filter_surges(response.surge_dates, ctx.date_from, ctx.date_to);
        self.cache.put(&key, &surges);
        Ok(surges)
    }

    /// Suggested catchment radius for a location/industry pair
    #[instrument(skip(self))]
    pub async fn suggested_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_unit: RadiusUnit,
        industry: &str,
    ) -> Result<SuggestedRadius> {
        let key = format!("radius:{latitude}:{longitude}:{radius_unit}:{industry}");
        if let Some(hit) = self.cache.get::<SuggestedRadius>(&key) {
            return Ok(hit);
        }

        let query = vec![
            (
                "location.origin".to_string(),
                format!("{latitude},{longitude}"),
            ),
            ("radius_unit".to_string(), radius_unit.to_string()),
            ("industry".to_string(), industry.to_string()),
        ];

        let suggested: SuggestedRadius = self.get_json("/v1/suggested-radius", &query).await?;
        self.cache.put(&key, &suggested);
        Ok(suggested)
    }

    fn within(&self, ctx: &ViewContext) -> String {
        format!(
            "{}{}@{},{}",
            ctx.radius, ctx.radius_unit, ctx.location.latitude, ctx.location.longitude
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let token = self.require_token()?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| SurgeboardError::fetch(format!("request to {path} failed: {e}")))?;

        Self::parse_response(path, response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let token = self.require_token()?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| SurgeboardError::fetch(format!("request to {path} failed: {e}")))?;

        Self::parse_response(path, response).await
    }

    async fn parse_response<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(SurgeboardError::fetch(format!(
                "{path} returned HTTP {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SurgeboardError::fetch(format!("malformed response from {path}: {e}")))
    }
}

/// Keep only surge dates inside the requested sub-range (inclusive bounds)
fn filter_surges(
    surges: Vec<DemandSurgeDate>,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Vec<DemandSurgeDate> {
    surges
        .into_iter()
        .filter(|surge| surge.date >= date_from && surge.date <= date_to)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn unconfigured_client() -> PhqClient {
        let mut config = SurgeboardConfig::default();
        // Unroutable: proves the config check fires before any network I/O
        config.api.base_url = "http://127.0.0.1:9".to_string();
        config.api.token = None;
        PhqClient::new(&config).unwrap()
    }

    fn ctx() -> ViewContext {
        ViewContext {
            location: Location::by_id("san-francisco").unwrap(),
            date_from: "2024-03-01".parse().unwrap(),
            date_to: "2024-03-08".parse().unwrap(),
            radius: 2.0,
            radius_unit: RadiusUnit::Mi,
            suggested_radius: 2.0,
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_config_error_not_fetch() {
        let client = unconfigured_client();
        assert!(!client.is_configured());

        let err = client.search_events(&ctx(), &[]).await.unwrap_err();
        assert!(matches!(err, SurgeboardError::Config { .. }));

        let err = client.event_counts(&ctx()).await.unwrap_err();
        assert!(matches!(err, SurgeboardError::Config { .. }));

        let err = client
            .features(&ctx(), crate::models::PHQ_ATTENDANCE_FEATURES)
            .await
            .unwrap_err();
        assert!(matches!(err, SurgeboardError::Config { .. }));

        let err = client.demand_surges(&ctx()).await.unwrap_err();
        assert!(matches!(err, SurgeboardError::Config { .. }));

        let err = client
            .suggested_radius(37.79, -122.39, RadiusUnit::Mi, "restaurants")
            .await
            .unwrap_err();
        assert!(matches!(err, SurgeboardError::Config { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let mut config = SurgeboardConfig::default();
        config.api.base_url = "http://127.0.0.1:9".to_string();
        config.api.token = Some("test-token".to_string());
        let client = PhqClient::new(&config).unwrap();

        let err = client.event_counts(&ctx()).await.unwrap_err();
        assert!(matches!(err, SurgeboardError::Fetch { .. }));
    }

    #[test]
    fn test_filter_surges_inclusive_bounds() {
        let surges: Vec<DemandSurgeDate> = ["2024-02-29", "2024-03-01", "2024-03-08", "2024-03-09"]
            .iter()
            .map(|d| DemandSurgeDate {
                date: d.parse().unwrap(),
                surge_intensity: Some("m".to_string()),
            })
            .collect();

        let kept = filter_surges(
            surges,
            "2024-03-01".parse().unwrap(),
            "2024-03-08".parse().unwrap(),
        );
        let dates: Vec<String> = kept.iter().map(|s| s.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-08"]);
    }
}
