use chrono::NaiveDate;

use crate::dates;
use crate::models::{Predictions, RiskLevel};

/// Days from ovulation still counted as peak fertility
const PEAK_DISTANCE_DAYS: i64 = 1;

/// Classify conception risk for an event on `event_date`.
///
/// Outside the fertile window the risk is `Low`. Inside it, days within one
/// day of ovulation are `High` and the rest of the window is `Medium`.
/// Without predictions the risk is `Unknown`.
pub fn classify(event_date: NaiveDate, predictions: Option<&Predictions>) -> RiskLevel {
    let Some(predictions) = predictions else {
        return RiskLevel::Unknown;
    };

    if !predictions.fertile_window.contains(event_date) {
        return RiskLevel::Low;
    }

    let distance = dates::days_between(predictions.ovulation, event_date).abs();
    if distance <= PEAK_DISTANCE_DAYS {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    }
}
