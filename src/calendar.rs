//! Per-day cycle markers for calendar views
//!
//! Only the classification of days lives here; drawing a grid is left to
//! whatever front end consumes the markers.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::dates;
use crate::error::{CycleFemError, Result};
use crate::models::{ActivityRecord, CycleRecord, Predictions};

/// Bleeding days assumed after the start of a cycle with no end date
pub const ASSUMED_PERIOD_DAYS: i64 = 5;

/// What happens on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayMarkers {
    pub date: NaiveDate,
    pub period: bool,
    pub ovulation: bool,
    /// Never set on the ovulation day itself
    pub fertile: bool,
    pub activity: bool,
}

impl DayMarkers {
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.period {
            labels.push("period");
        }
        if self.ovulation {
            labels.push("ovulation");
        }
        if self.fertile {
            labels.push("fertile");
        }
        if self.activity {
            labels.push("activity");
        }
        labels
    }

    pub fn is_empty(&self) -> bool {
        !(self.period || self.ovulation || self.fertile || self.activity)
    }
}

fn is_period_day(date: NaiveDate, cycle: &CycleRecord) -> bool {
    let last_day = cycle
        .end_date
        .or_else(|| dates::shift(cycle.start_date, ASSUMED_PERIOD_DAYS))
        .unwrap_or(cycle.start_date);
    date >= cycle.start_date && date <= last_day
}

/// Markers for a single day
pub fn day_markers(
    date: NaiveDate,
    cycles: &[CycleRecord],
    predictions: Option<&Predictions>,
    activities: &[ActivityRecord],
) -> DayMarkers {
    let ovulation = predictions.is_some_and(|p| p.ovulation == date);
    let fertile = !ovulation && predictions.is_some_and(|p| p.fertile_window.contains(date));

    DayMarkers {
        date,
        period: cycles.iter().any(|cycle| is_period_day(date, cycle)),
        ovulation,
        fertile,
        activity: activities.iter().any(|activity| activity.date == date),
    }
}

/// Markers for every day of `month` in `year`
pub fn month_markers(
    year: i32,
    month: u32,
    cycles: &[CycleRecord],
    predictions: Option<&Predictions>,
    activities: &[ActivityRecord],
) -> Result<Vec<DayMarkers>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        CycleFemError::Validation(format!("Invalid month: {}-{:02}", year, month))
    })?;

    Ok(first
        .iter_days()
        .take_while(|date| date.month() == month)
        .map(|date| day_markers(date, cycles, predictions, activities))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::prediction::predict;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn activity(on: NaiveDate) -> ActivityRecord {
        ActivityRecord {
            id: "a1".to_string(),
            date: on,
            protection: false,
            pregnancy_risk: RiskLevel::Low,
            created_at: None,
        }
    }

    #[test]
    fn test_open_cycle_assumes_five_extra_days() {
        let cycles = vec![CycleRecord::new("c1", date(2024, 1, 1))];

        assert!(day_markers(date(2024, 1, 1), &cycles, None, &[]).period);
        assert!(day_markers(date(2024, 1, 6), &cycles, None, &[]).period);
        assert!(!day_markers(date(2024, 1, 7), &cycles, None, &[]).period);
    }

    #[test]
    fn test_closed_cycle_uses_end_date() {
        let cycles = vec![CycleRecord::new("c1", date(2024, 1, 1)).with_end_date(date(2024, 1, 3))];

        assert!(day_markers(date(2024, 1, 3), &cycles, None, &[]).period);
        assert!(!day_markers(date(2024, 1, 4), &cycles, None, &[]).period);
    }

    #[test]
    fn test_ovulation_takes_precedence_over_fertile() {
        let cycles = vec![CycleRecord::new("c1", date(2024, 1, 1))];
        let predictions = predict(&cycles);

        // ovulation 2024-01-15, window 2024-01-10..=2024-01-16
        let ovulation_day = day_markers(date(2024, 1, 15), &cycles, predictions.as_ref(), &[]);
        assert!(ovulation_day.ovulation);
        assert!(!ovulation_day.fertile);

        let fertile_day = day_markers(date(2024, 1, 10), &cycles, predictions.as_ref(), &[]);
        assert!(fertile_day.fertile);
        assert!(!fertile_day.ovulation);

        assert!(day_markers(date(2024, 1, 17), &cycles, predictions.as_ref(), &[]).is_empty());
    }

    #[test]
    fn test_month_markers_cover_whole_month() {
        let cycles = vec![CycleRecord::new("c1", date(2024, 2, 1))];
        let activities = vec![activity(date(2024, 2, 20))];
        let predictions = predict(&cycles);

        let markers = month_markers(2024, 2, &cycles, predictions.as_ref(), &activities).unwrap();
        assert_eq!(markers.len(), 29);
        assert_eq!(markers[0].labels(), vec!["period"]);
        assert_eq!(markers[14].labels(), vec!["ovulation"]);
        assert_eq!(markers[19].labels(), vec!["activity"]);
    }

    #[test]
    fn test_invalid_month_is_rejected() {
        assert!(month_markers(2024, 13, &[], None, &[]).is_err());
    }
}
