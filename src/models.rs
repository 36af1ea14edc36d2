use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Menstrual flow intensity (informational only, never used in calculations)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Spotting,
    Light,
    Medium,
    Heavy,
}

impl Default for Flow {
    fn default() -> Self {
        Flow::Medium
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Spotting => write!(f, "spotting"),
            Flow::Light => write!(f, "light"),
            Flow::Medium => write!(f, "medium"),
            Flow::Heavy => write!(f, "heavy"),
        }
    }
}

impl std::str::FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spotting" => Ok(Flow::Spotting),
            "light" | "low" => Ok(Flow::Light),
            "medium" | "moderate" | "normal" => Ok(Flow::Medium),
            "heavy" | "high" => Ok(Flow::Heavy),
            _ => Err(format!("Invalid flow: {}", s)),
        }
    }
}

/// One observed or logged menstrual cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRecord {
    /// Caller-assigned opaque identifier; empty until the record is stored
    #[serde(default)]
    pub id: String,

    /// First day of bleeding
    pub start_date: NaiveDate,

    /// Last day of bleeding; `None` while ongoing or unknown
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default)]
    pub flow: Flow,

    #[serde(default)]
    pub symptoms: BTreeSet<String>,

    /// User-declared fallback length in days, used while `end_date` is unknown.
    /// Non-positive values are treated as absent.
    #[serde(default)]
    pub custom_cycle_length: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CycleRecord {
    pub fn new(id: impl Into<String>, start_date: NaiveDate) -> Self {
        CycleRecord {
            id: id.into(),
            start_date,
            end_date: None,
            flow: Flow::default(),
            symptoms: BTreeSet::new(),
            custom_cycle_length: None,
            created_at: None,
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_custom_cycle_length(mut self, days: i64) -> Self {
        self.custom_cycle_length = Some(days);
        self
    }

    /// Declared cycle length, if it is usable
    pub fn declared_length(&self) -> Option<i64> {
        self.custom_cycle_length.filter(|days| *days > 0)
    }
}

/// Order a history by ascending start date.
///
/// The sort is stable, so records sharing a start date keep their input order.
pub fn chronological(history: &[CycleRecord]) -> Vec<&CycleRecord> {
    let mut ordered: Vec<&CycleRecord> = history.iter().collect();
    ordered.sort_by_key(|cycle| cycle.start_date);
    ordered
}

/// Conception-risk classification for a single logged event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Unknown,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Unknown => write!(f, "unknown"),
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// One logged event, classified against the cycle history at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: String,

    pub date: NaiveDate,

    /// Informational; does not affect classification
    #[serde(default)]
    pub protection: bool,

    /// Snapshot taken when the record was written. Never recomputed.
    pub pregnancy_risk: RiskLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Inclusive date range considered to carry elevated conception probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FertileWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FertileWindow {
    /// Whether `date` lies in the window, bounds included
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Forecast for the next cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predictions {
    pub next_period: NaiveDate,
    pub ovulation: NaiveDate,
    pub fertile_window: FertileWindow,

    /// Mean effective cycle length, rounded half-up to whole days
    pub avg_cycle_length: i64,
}

/// Historical aggregates over a full cycle history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_cycles: usize,

    /// Mean gap between consecutive start dates, one decimal place
    #[serde(with = "rust_decimal::serde::float")]
    pub average_cycle_length: Decimal,

    /// Mean inclusive bleeding span of closed cycles, one decimal place
    #[serde(with = "rust_decimal::serde::float")]
    pub average_period_length: Decimal,

    /// Share of gaps within tolerance of the mean, integer percent 0-100
    pub regularity: u32,
}

impl Default for Statistics {
    fn default() -> Self {
        Statistics {
            total_cycles: 0,
            average_cycle_length: Decimal::ZERO,
            average_period_length: Decimal::ZERO,
            regularity: 0,
        }
    }
}
