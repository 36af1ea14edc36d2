use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{CycleFemError, ImportExportError, Result};
use crate::models::{Predictions, RiskLevel, Statistics};
use crate::records::UserRecords;

pub mod csv;
pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl std::str::FromStr for ExportFormat {
    type Err = CycleFemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }
            .into()),
        }
    }
}

/// First and last recorded cycle start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// How many logged activities fell into each risk class when recorded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub unknown: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskBreakdown {
    fn record(&mut self, risk: RiskLevel) {
        match risk {
            RiskLevel::Unknown => self.unknown += 1,
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
        }
    }
}

/// Snapshot of predictions and statistics for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub generated_at: DateTime<Utc>,
    pub user: Option<String>,
    pub date_range: DateRange,
    pub predictions: Option<Predictions>,
    pub statistics: Statistics,
    pub total_activities: usize,
    pub activity_risk: RiskBreakdown,
}

impl CycleReport {
    pub fn from_records(records: &UserRecords) -> Self {
        let cycles = records.cycles();
        let mut activity_risk = RiskBreakdown::default();
        for activity in records.activities() {
            activity_risk.record(activity.pregnancy_risk);
        }

        let name = &records.profile().name;

        CycleReport {
            generated_at: Utc::now(),
            user: (!name.is_empty()).then(|| name.clone()),
            date_range: DateRange {
                start: cycles.iter().map(|cycle| cycle.start_date).min(),
                end: cycles.iter().map(|cycle| cycle.start_date).max(),
            },
            predictions: records.predictions(),
            statistics: records.statistics(),
            total_activities: records.activities().len(),
            activity_risk,
        }
    }
}

/// Write `records` to `output_path` in `format`.
///
/// JSON and text produce a report; CSV produces the raw cycle history.
pub fn export_records<P: AsRef<Path>>(
    records: &UserRecords,
    format: ExportFormat,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    match format {
        ExportFormat::Json => json::export_report(&CycleReport::from_records(records), output_path)?,
        ExportFormat::Text => text::export_report(&CycleReport::from_records(records), output_path)?,
        ExportFormat::Csv => csv::export_cycles(records.cycles(), output_path)?,
    }

    info!(path = %output_path.display(), ?format, "Export completed");
    Ok(())
}

/// Write the activity log of `records` to `output_path` in `format`
pub fn export_activity_log<P: AsRef<Path>>(
    records: &UserRecords,
    format: ExportFormat,
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let activities = records.activities();
    match format {
        ExportFormat::Json => json::export_json(&activities, output_path)?,
        ExportFormat::Text => text::export_activities(activities, output_path)?,
        ExportFormat::Csv => csv::export_activities(activities, output_path)?,
    }

    info!(path = %output_path.display(), ?format, count = activities.len(), "Activity export completed");
    Ok(())
}

pub(crate) fn export_failed(path: &Path, reason: impl ToString) -> CycleFemError {
    ImportExportError::ExportFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
    .into()
}
