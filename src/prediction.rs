use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dates;
use crate::models::{chronological, CycleRecord, FertileWindow, Predictions};

/// Prediction constants. The defaults are the fixed values the forecasts are
/// defined by; changing them changes the meaning of every prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Length assumed for an open cycle with no usable declared length
    pub default_cycle_length: i64,

    /// Days between ovulation and the next period (fixed luteal phase)
    pub luteal_phase_days: i64,

    /// Fertile days before ovulation
    pub fertile_days_before_ovulation: i64,

    /// Fertile days after ovulation
    pub fertile_days_after_ovulation: i64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        PredictionConfig {
            default_cycle_length: 28,
            luteal_phase_days: 14,
            fertile_days_before_ovulation: 5,
            fertile_days_after_ovulation: 1,
        }
    }
}

/// Forecasts the next cycle from a user's cycle history
#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    config: PredictionConfig,
}

impl PredictionEngine {
    /// Create new prediction engine with default configuration
    pub fn new() -> Self {
        PredictionEngine {
            config: PredictionConfig::default(),
        }
    }

    /// Create new prediction engine with custom configuration
    pub fn with_config(config: PredictionConfig) -> Self {
        PredictionEngine { config }
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Length attributed to one cycle for averaging.
    ///
    /// Closed cycles use their inclusive start-to-end span. Open cycles fall
    /// back to the declared length, then to the configured default.
    pub fn effective_length(&self, cycle: &CycleRecord) -> i64 {
        if let Some(end_date) = cycle.end_date {
            return dates::inclusive_span(cycle.start_date, end_date);
        }

        if let Some(days) = cycle.declared_length() {
            return days;
        }
        if let Some(days) = cycle.custom_cycle_length {
            warn!(
                cycle_id = %cycle.id,
                custom_cycle_length = days,
                "Ignoring non-positive custom cycle length"
            );
        }
        self.config.default_cycle_length
    }

    /// Predict the next period, ovulation day and fertile window.
    ///
    /// The input is sorted defensively; the cycle with the latest start date
    /// is the current one. Returns `None` for an empty history, and also when
    /// a projected date would fall outside the range `NaiveDate` can represent
    /// (a start date within a few weeks of `NaiveDate::MAX`).
    pub fn predict(&self, history: &[CycleRecord]) -> Option<Predictions> {
        let ordered = chronological(history);
        let current = *ordered.last()?;

        let lengths: Vec<i64> = ordered
            .iter()
            .map(|cycle| self.effective_length(cycle))
            .collect();
        let avg_cycle_length = dates::round_half_up_days(dates::mean(&lengths)?);

        let next_period = dates::shift(current.start_date, avg_cycle_length)?;
        let ovulation = dates::shift(next_period, -self.config.luteal_phase_days)?;
        let fertile_window = FertileWindow {
            start: dates::shift(ovulation, -self.config.fertile_days_before_ovulation)?,
            end: dates::shift(ovulation, self.config.fertile_days_after_ovulation)?,
        };

        debug!(
            cycles = ordered.len(),
            avg_cycle_length,
            %next_period,
            %ovulation,
            "Calculated cycle predictions"
        );

        Some(Predictions {
            next_period,
            ovulation,
            fertile_window,
            avg_cycle_length,
        })
    }
}

/// Predict with the default configuration
pub fn predict(history: &[CycleRecord]) -> Option<Predictions> {
    PredictionEngine::new().predict(history)
}
