use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dates;
use crate::models::{chronological, CycleRecord, Statistics};

/// Statistics settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// A gap counts as regular when within this many days of the mean
    pub regularity_tolerance_days: i64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        StatisticsConfig {
            regularity_tolerance_days: 2,
        }
    }
}

/// Computes backward-looking aggregates over a cycle history
#[derive(Debug, Clone, Default)]
pub struct StatisticsEngine {
    config: StatisticsConfig,
}

impl StatisticsEngine {
    pub fn new() -> Self {
        StatisticsEngine {
            config: StatisticsConfig::default(),
        }
    }

    pub fn with_config(config: StatisticsConfig) -> Self {
        StatisticsEngine { config }
    }

    /// Gaps in days between consecutive start dates.
    ///
    /// This is not the effective length used for predictions: it measures
    /// onset to onset and ignores end dates entirely.
    pub fn cycle_length_samples(&self, history: &[CycleRecord]) -> Vec<i64> {
        chronological(history)
            .windows(2)
            .map(|pair| dates::days_between(pair[0].start_date, pair[1].start_date))
            .collect()
    }

    /// Inclusive bleeding span of every cycle with a known end date
    pub fn period_length_samples(&self, history: &[CycleRecord]) -> Vec<i64> {
        chronological(history)
            .iter()
            .filter_map(|cycle| {
                cycle
                    .end_date
                    .map(|end_date| dates::inclusive_span(cycle.start_date, end_date))
            })
            .collect()
    }

    /// Integer percentage of gaps within tolerance of the unrounded mean
    pub fn regularity(&self, cycle_lengths: &[i64]) -> u32 {
        let Some(mean) = dates::mean(cycle_lengths) else {
            return 0;
        };

        let tolerance = Decimal::from(self.config.regularity_tolerance_days);
        let regular = cycle_lengths
            .iter()
            .filter(|length| (Decimal::from(**length) - mean).abs() <= tolerance)
            .count();

        let percentage =
            Decimal::from(regular as u64 * 100) / Decimal::from(cycle_lengths.len() as u64);
        dates::round_half_up_days(percentage) as u32
    }

    pub fn summarize(&self, history: &[CycleRecord]) -> Statistics {
        if history.is_empty() {
            return Statistics::default();
        }

        let cycle_lengths = self.cycle_length_samples(history);
        let period_lengths = self.period_length_samples(history);

        let average_cycle_length = dates::mean(&cycle_lengths)
            .map(|mean| dates::round_half_up(mean, 1))
            .unwrap_or(Decimal::ZERO);
        let average_period_length = dates::mean(&period_lengths)
            .map(|mean| dates::round_half_up(mean, 1))
            .unwrap_or(Decimal::ZERO);

        let statistics = Statistics {
            total_cycles: history.len(),
            average_cycle_length,
            average_period_length,
            regularity: self.regularity(&cycle_lengths),
        };

        debug!(
            total_cycles = statistics.total_cycles,
            gaps = cycle_lengths.len(),
            closed_cycles = period_lengths.len(),
            regularity = statistics.regularity,
            "Summarized cycle history"
        );

        statistics
    }
}

/// Summarize with the default configuration
pub fn summarize(history: &[CycleRecord]) -> Statistics {
    StatisticsEngine::new().summarize(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn starts(start_dates: &[NaiveDate]) -> Vec<CycleRecord> {
        start_dates
            .iter()
            .enumerate()
            .map(|(i, start)| CycleRecord::new(format!("c{}", i), *start))
            .collect()
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        let stats = summarize(&[]);
        assert_eq!(stats.total_cycles, 0);
        assert_eq!(stats.average_cycle_length, Decimal::ZERO);
        assert_eq!(stats.average_period_length, Decimal::ZERO);
        assert_eq!(stats.regularity, 0);
    }

    #[test]
    fn test_single_cycle_has_no_gaps() {
        let history = vec![CycleRecord::new("c1", date(2024, 1, 1)).with_end_date(date(2024, 1, 5))];

        let stats = summarize(&history);
        assert_eq!(stats.total_cycles, 1);
        assert_eq!(stats.average_cycle_length, Decimal::ZERO);
        assert_eq!(stats.average_period_length, dec!(5.0));
        assert_eq!(stats.regularity, 0);
    }

    #[test]
    fn test_two_open_cycles_28_days_apart() {
        let history = starts(&[date(2024, 1, 1), date(2024, 1, 29)]);

        let stats = summarize(&history);
        assert_eq!(stats.total_cycles, 2);
        assert_eq!(stats.average_cycle_length, dec!(28.0));
        assert_eq!(stats.average_period_length, Decimal::ZERO);
        assert_eq!(stats.regularity, 100);
    }

    #[test]
    fn test_gaps_use_start_dates_not_end_dates() {
        let history = vec![
            CycleRecord::new("c1", date(2024, 1, 1)).with_end_date(date(2024, 1, 7)),
            CycleRecord::new("c2", date(2024, 1, 31)).with_end_date(date(2024, 2, 3)),
        ];

        let engine = StatisticsEngine::new();
        assert_eq!(engine.cycle_length_samples(&history), vec![30]);
        assert_eq!(engine.period_length_samples(&history), vec![7, 4]);

        let stats = engine.summarize(&history);
        assert_eq!(stats.average_cycle_length, dec!(30.0));
        assert_eq!(stats.average_period_length, dec!(5.5));
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let history = starts(&[date(2024, 2, 28), date(2024, 1, 1), date(2024, 1, 30)]);

        let engine = StatisticsEngine::new();
        assert_eq!(engine.cycle_length_samples(&history), vec![29, 29]);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        // gaps 28, 29, 29 -> 28.666..
        let history = starts(&[
            date(2024, 1, 1),
            date(2024, 1, 29),
            date(2024, 2, 27),
            date(2024, 3, 27),
        ]);

        let stats = summarize(&history);
        assert_eq!(stats.average_cycle_length, dec!(28.7));
        assert_eq!(stats.regularity, 100);
    }

    #[test]
    fn test_regularity_against_unrounded_mean() {
        let engine = StatisticsEngine::new();

        // mean 30: 26 and 34 are outside, 28 and 32 sit on the boundary
        assert_eq!(engine.regularity(&[26, 28, 32, 34]), 50);
        // mean 29: every gap within two days
        assert_eq!(engine.regularity(&[27, 29, 31]), 100);
        // mean 29.333..: 26 is 3.33 away
        assert_eq!(engine.regularity(&[26, 31, 31]), 67);
        assert_eq!(engine.regularity(&[]), 0);
    }

    #[test]
    fn test_regularity_rounds_half_up() {
        let engine = StatisticsEngine::new();
        // mean 27.875: 20 is irregular, the other seven are regular -> 87.5%
        assert_eq!(engine.regularity(&[20, 29, 29, 29, 29, 29, 29, 29]), 88);
    }

    #[test]
    fn test_custom_tolerance() {
        let engine = StatisticsEngine::with_config(StatisticsConfig {
            regularity_tolerance_days: 0,
        });
        assert_eq!(engine.regularity(&[28, 28, 30]), 0);
        assert_eq!(engine.regularity(&[28, 28]), 100);
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let history = starts(&[date(2024, 1, 1), date(2024, 1, 27), date(2024, 2, 25)]);
        assert_eq!(summarize(&history), summarize(&history));
    }
}
