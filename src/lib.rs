//! Surgeboard - restaurant demand dashboard over an events-prediction API
//!
//! This library provides a typed client for the external events API, the
//! aggregation routines behind the dashboard metrics, and the view models
//! served to the frontend (tiles, map overlays, chart series, CSV export).

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod charts;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod map;
pub mod metrics;
pub mod models;
pub mod phq;
pub mod web;

// Re-export core types for public API
pub use cache::MemoCache;
pub use config::SurgeboardConfig;
pub use context::ViewContext;
pub use error::SurgeboardError;
pub use models::{
    ATTENDED_CATEGORIES, DateRangePreset, DemandSurgeDate, Event, EventCounts, FeatureRecord,
    Location, NON_ATTENDED_CATEGORIES, PHQ_ATTENDANCE_FEATURES, RadiusUnit, SuggestedRadius,
    UNSCHEDULED_CATEGORIES,
};
pub use phq::PhqClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SurgeboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
