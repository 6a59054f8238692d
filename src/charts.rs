//! Chart series for the demand-surge page: total daily attendance and
//! per-feature daily bars, each annotated with surge-date markers.

use crate::aggregate::{DailyAttendance, FeatureDailyAttendance, daily_sum_of_features, per_feature_daily_sum};
use crate::models::{DemandSurgeDate, FeatureRecord};
use chrono::NaiveDate;
use serde::Serialize;

/// Total daily attendance across all tracked features
#[derive(Debug, Clone, Serialize)]
pub struct DailyAttendanceChart {
    pub rows: Vec<DailyAttendance>,
    /// Dates to draw vertical surge markers on
    pub surge_dates: Vec<NaiveDate>,
}

/// Daily attendance broken down by feature
#[derive(Debug, Clone, Serialize)]
pub struct FeatureAttendanceChart {
    pub rows: Vec<FeatureDailyAttendance>,
    pub surge_dates: Vec<NaiveDate>,
}

/// Build the total-daily-attendance chart
#[must_use]
pub fn daily_attendance_chart(
    records: &[FeatureRecord],
    feature_names: &[&str],
    surges: &[DemandSurgeDate],
) -> DailyAttendanceChart {
    DailyAttendanceChart {
        rows: daily_sum_of_features(records, feature_names),
        surge_dates: surge_marker_dates(surges),
    }
}

/// Build the per-feature daily bars chart
#[must_use]
pub fn feature_attendance_chart(
    records: &[FeatureRecord],
    feature_names: &[&str],
    surges: &[DemandSurgeDate],
) -> FeatureAttendanceChart {
    FeatureAttendanceChart {
        rows: per_feature_daily_sum(records, feature_names),
        surge_dates: surge_marker_dates(surges),
    }
}

fn surge_marker_dates(surges: &[DemandSurgeDate]) -> Vec<NaiveDate> {
    surges.iter().map(|surge| surge.date).collect()
}
