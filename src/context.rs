//! Request-scoped view context.
//!
//! Every render starts from an explicit `ViewContext` built from the
//! operator's selections: location, resolved date range, and radius. It
//! replaces any notion of ambient session state; components receive it as
//! an argument and never reach for globals.

use crate::models::{Location, RadiusUnit};
use chrono::NaiveDate;

/// The selections driving one dashboard render
#[derive(Debug, Clone)]
pub struct ViewContext {
    /// Selected restaurant location
    pub location: Location,
    /// Start of the active date range (inclusive)
    pub date_from: NaiveDate,
    /// End of the active date range (inclusive)
    pub date_to: NaiveDate,
    /// Effective catchment radius (operator override or suggested)
    pub radius: f64,
    /// Unit for `radius` and `suggested_radius`
    pub radius_unit: RadiusUnit,
    /// The radius the external service suggested for this location
    pub suggested_radius: f64,
}

impl ViewContext {
    /// The comparison period: equal in length, immediately preceding the
    /// active range.
    #[must_use]
    pub fn previous_period(&self) -> (NaiveDate, NaiveDate) {
        let span = self.date_to - self.date_from;
        (self.date_from - span, self.date_from)
    }

    /// Number of days in the active range, never below 1
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.date_to - self.date_from).num_days().max(1)
    }

    /// A copy of this context over a different date range
    #[must_use]
    pub fn with_range(&self, date_from: NaiveDate, date_to: NaiveDate) -> ViewContext {
        ViewContext {
            date_from,
            date_to,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(from: &str, to: &str) -> ViewContext {
        ViewContext {
            location: Location::by_id("new-york").unwrap(),
            date_from: from.parse().unwrap(),
            date_to: to.parse().unwrap(),
            radius: 2.0,
            radius_unit: RadiusUnit::Mi,
            suggested_radius: 2.0,
        }
    }

    #[test]
    fn test_previous_period_same_length() {
        let ctx = ctx("2024-03-01", "2024-03-31");
        let (prev_from, prev_to) = ctx.previous_period();
        assert_eq!(prev_from, "2024-01-31".parse::<NaiveDate>().unwrap());
        assert_eq!(prev_to, ctx.date_from);
        assert_eq!(prev_to - prev_from, ctx.date_to - ctx.date_from);
    }

    #[test]
    fn test_days_never_zero() {
        assert_eq!(ctx("2024-03-01", "2024-03-08").days(), 7);
        assert_eq!(ctx("2024-03-01", "2024-03-01").days(), 1);
    }

    #[test]
    fn test_with_range_keeps_selections() {
        let base = ctx("2024-03-01", "2024-03-08");
        let (prev_from, prev_to) = base.previous_period();
        let prev = base.with_range(prev_from, prev_to);
        assert_eq!(prev.location.id, base.location.id);
        assert_eq!(prev.radius, base.radius);
        assert_eq!(prev.date_to, base.date_from);
    }
}
