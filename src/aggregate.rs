//! Aggregation routines behind the dashboard metrics and charts.
//!
//! Everything here is plain arithmetic over the typed records the API
//! client returns: feature sums, per-date groupings, period-over-period
//! deltas, and rank-to-color bucketing for the map.

use crate::models::{EventCounts, FeatureRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// One row of the total-daily-attendance series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAttendance {
    pub date: NaiveDate,
    pub attendance_sum: f64,
}

/// One row of the per-feature daily series, used for stacked/grouped bars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDailyAttendance {
    pub date: NaiveDate,
    pub feature: String,
    pub attendance_sum: f64,
}

/// Total of the `sum` stat across all records, restricted to the named
/// features. Unknown or absent feature keys contribute nothing.
#[must_use]
pub fn sum_of_features(records: &[FeatureRecord], feature_names: &[&str]) -> f64 {
    records
        .iter()
        .flat_map(|record| record.features.iter())
        .filter(|(name, _)| feature_names.contains(&name.as_str()))
        .map(|(_, value)| value.stats.sum)
        .sum()
}

/// Same sum grouped by date: one row per distinct date present in the
/// input, in first-seen order.
#[must_use]
pub fn daily_sum_of_features(
    records: &[FeatureRecord],
    feature_names: &[&str],
) -> Vec<DailyAttendance> {
    let mut rows: Vec<DailyAttendance> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for record in records {
        let day_sum: f64 = record
            .features
            .iter()
            .filter(|(name, _)| feature_names.contains(&name.as_str()))
            .map(|(_, value)| value.stats.sum)
            .sum();

        match index.get(&record.date) {
            Some(&i) => rows[i].attendance_sum += day_sum,
            None => {
                index.insert(record.date, rows.len());
                rows.push(DailyAttendance {
                    date: record.date,
                    attendance_sum: day_sum,
                });
            }
        }
    }

    rows
}

/// One row per (date, feature) pair carrying that feature's sum. Feature
/// order within a date follows `feature_names` so chart series stay stable.
#[must_use]
pub fn per_feature_daily_sum(
    records: &[FeatureRecord],
    feature_names: &[&str],
) -> Vec<FeatureDailyAttendance> {
    let mut rows = Vec::new();

    for record in records {
        for name in feature_names {
            if let Some(value) = record.features.get(*name) {
                rows.push(FeatureDailyAttendance {
                    date: record.date,
                    feature: (*name).to_string(),
                    attendance_sum: value.stats.sum,
                });
            }
        }
    }

    rows
}

/// Sum event counts restricted to a category subset
#[must_use]
pub fn sum_of_event_counts(counts: &EventCounts, wanted_categories: &[&str]) -> u64 {
    counts
        .categories
        .iter()
        .filter(|(category, _)| wanted_categories.contains(&category.as_str()))
        .map(|(_, count)| count)
        .sum()
}

/// Period-over-period percentage delta.
///
/// Defined as `0` when `previous <= 0` to avoid division by zero. This
/// masks true zero-to-N growth; the dashboard shows "0%" there instead of
/// an infinity, matching the upstream product.
#[must_use]
pub fn percentage_delta(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

/// Bucket a rank into a color tier.
///
/// The first breakpoint the rank is strictly less than wins; a rank equal
/// to a breakpoint falls into the next tier. Ranks beyond every breakpoint
/// take the last palette entry, and an absent rank counts as 0. `palette`
/// must be non-empty.
#[must_use]
pub fn rank_to_color_tier(rank: Option<u32>, breakpoints: &[u32], palette: &[[u8; 3]]) -> [u8; 3] {
    let rank = rank.unwrap_or(0);
    for (i, breakpoint) in breakpoints.iter().enumerate() {
        if rank < *breakpoint {
            return palette[i.min(palette.len() - 1)];
        }
    }
    palette[palette.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeatureStats, FeatureValue};
    use rstest::rstest;

    fn record(date: &str, pairs: &[(&str, f64)]) -> FeatureRecord {
        FeatureRecord {
            date: date.parse().unwrap(),
            features: pairs
                .iter()
                .map(|(name, sum)| {
                    (
                        (*name).to_string(),
                        FeatureValue {
                            stats: FeatureStats { sum: *sum },
                        },
                    )
                })
                .collect(),
        }
    }

    const PALETTE: [[u8; 3]; 5] = [
        [255, 174, 0],
        [255, 138, 25],
        [255, 104, 49],
        [255, 69, 74],
        [255, 35, 100],
    ];
    const BREAKS: [u32; 5] = [20, 40, 60, 80, 100];

    #[rstest]
    #[case(150.0, 100.0, 50.0)]
    #[case(50.0, 100.0, -50.0)]
    #[case(100.0, 100.0, 0.0)]
    #[case(42.0, 0.0, 0.0)]
    #[case(0.0, 0.0, 0.0)]
    #[case(7.0, -3.0, 0.0)]
    fn test_percentage_delta(#[case] current: f64, #[case] previous: f64, #[case] expected: f64) {
        assert_eq!(percentage_delta(current, previous), expected);
    }

    #[test]
    fn test_sum_ignores_untracked_features() {
        let records = vec![
            record(
                "2024-01-01",
                &[
                    ("phq_attendance_sports", 100.0),
                    ("phq_attendance_concerts", 50.0),
                    ("phq_viewership_sports", 9999.0),
                ],
            ),
            record("2024-01-02", &[("phq_attendance_sports", 25.0)]),
        ];

        let tracked = ["phq_attendance_sports", "phq_attendance_concerts"];
        assert_eq!(sum_of_features(&records, &tracked), 175.0);
    }

    #[test]
    fn test_daily_sum_one_row_per_date() {
        let records = vec![
            record(
                "2024-01-01",
                &[
                    ("phq_attendance_sports", 100.0),
                    ("phq_attendance_concerts", 40.0),
                ],
            ),
            record("2024-01-02", &[("phq_attendance_sports", 60.0)]),
            record("2024-01-03", &[("phq_attendance_expos", 5.0)]),
        ];
        let tracked = ["phq_attendance_sports", "phq_attendance_concerts"];

        let rows = daily_sum_of_features(&records, &tracked);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].attendance_sum, 140.0);
        assert_eq!(rows[1].attendance_sum, 60.0);
        // Only an untracked feature on the third date
        assert_eq!(rows[2].attendance_sum, 0.0);

        let manual: f64 = rows.iter().map(|r| r.attendance_sum).sum();
        assert_eq!(manual, sum_of_features(&records, &tracked));
    }

    #[test]
    fn test_per_feature_daily_rows() {
        let records = vec![record(
            "2024-01-01",
            &[
                ("phq_attendance_sports", 100.0),
                ("phq_attendance_concerts", 40.0),
                ("phq_viewership_sports", 1.0),
            ],
        )];
        let tracked = ["phq_attendance_sports", "phq_attendance_concerts"];

        let rows = per_feature_daily_sum(&records, &tracked);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].feature, "phq_attendance_sports");
        assert_eq!(rows[0].attendance_sum, 100.0);
        assert_eq!(rows[1].feature, "phq_attendance_concerts");
    }

    #[test]
    fn test_sum_of_event_counts_subset() {
        let counts = EventCounts {
            count: 20,
            categories: [
                ("concerts".to_string(), 7u64),
                ("sports".to_string(), 3),
                ("public-holidays".to_string(), 10),
            ]
            .into_iter()
            .collect(),
        };

        assert_eq!(sum_of_event_counts(&counts, &["concerts", "sports"]), 10);
        assert_eq!(sum_of_event_counts(&counts, &["public-holidays"]), 10);
        assert_eq!(sum_of_event_counts(&counts, &["disasters"]), 0);
    }

    #[rstest]
    #[case(Some(15), 0)]
    #[case(Some(19), 0)]
    #[case(Some(20), 1)] // breakpoint-equal falls into the next tier
    #[case(Some(55), 2)]
    #[case(Some(99), 4)]
    #[case(Some(100), 4)] // beyond every breakpoint: last tier
    #[case(None, 0)] // absent rank defaults to 0
    fn test_rank_to_color_tier(#[case] rank: Option<u32>, #[case] expected_tier: usize) {
        assert_eq!(
            rank_to_color_tier(rank, &BREAKS, &PALETTE),
            PALETTE[expected_tier]
        );
    }
}
