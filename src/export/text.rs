use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::CycleReport;
use crate::error::Result;
use crate::models::{ActivityRecord, CycleRecord, Predictions, Statistics};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Tabled)]
struct CycleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Flow")]
    flow: String,
    #[tabled(rename = "Symptoms")]
    symptoms: String,
}

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Protected")]
    protection: String,
    #[tabled(rename = "Risk")]
    risk: String,
}

/// Render a cycle history as a terminal table
pub fn cycles_table(cycles: &[CycleRecord]) -> String {
    let rows = cycles.iter().map(|cycle| CycleRow {
        id: cycle.id.clone(),
        start: cycle.start_date.format(DATE_FORMAT).to_string(),
        end: cycle
            .end_date
            .map_or_else(|| "ongoing".to_string(), |d| d.format(DATE_FORMAT).to_string()),
        flow: cycle.flow.to_string(),
        symptoms: cycle.symptoms.iter().cloned().collect::<Vec<_>>().join(", "),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render an activity log as a terminal table
pub fn activities_table(activities: &[ActivityRecord]) -> String {
    let rows = activities.iter().map(|activity| ActivityRow {
        id: activity.id.clone(),
        date: activity.date.format(DATE_FORMAT).to_string(),
        protection: if activity.protection { "yes" } else { "no" }.to_string(),
        risk: activity.pregnancy_risk.to_string(),
    });

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn predictions_summary(predictions: Option<&Predictions>) -> String {
    let Some(predictions) = predictions else {
        return "No predictions yet: record at least one cycle.\n".to_string();
    };

    format!(
        "Next period:        {}\n\
         Ovulation:          {}\n\
         Fertile window:     {} to {}\n\
         Avg cycle length:   {} days\n",
        predictions.next_period.format(DATE_FORMAT),
        predictions.ovulation.format(DATE_FORMAT),
        predictions.fertile_window.start.format(DATE_FORMAT),
        predictions.fertile_window.end.format(DATE_FORMAT),
        predictions.avg_cycle_length
    )
}

pub fn statistics_summary(statistics: &Statistics) -> String {
    format!(
        "Total cycles:          {}\n\
         Average cycle length:  {} days\n\
         Average period length: {} days\n\
         Regularity:            {}%\n",
        statistics.total_cycles,
        statistics.average_cycle_length,
        statistics.average_period_length,
        statistics.regularity
    )
}

/// Write a plain-text report to `writer`
pub fn write_report<W: Write>(writer: &mut W, report: &CycleReport) -> Result<()> {
    writeln!(writer, "CYCLE REPORT")?;
    writeln!(writer, "============")?;
    if let Some(user) = &report.user {
        writeln!(writer, "User: {}", user)?;
    }
    writeln!(
        writer,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    if let (Some(start), Some(end)) = (report.date_range.start, report.date_range.end) {
        writeln!(writer, "History: {} to {}", start.format(DATE_FORMAT), end.format(DATE_FORMAT))?;
    }
    writeln!(writer)?;

    writeln!(writer, "PREDICTIONS")?;
    writeln!(writer, "-----------")?;
    write!(writer, "{}", predictions_summary(report.predictions.as_ref()))?;
    writeln!(writer)?;

    writeln!(writer, "STATISTICS")?;
    writeln!(writer, "----------")?;
    write!(writer, "{}", statistics_summary(&report.statistics))?;
    writeln!(writer)?;

    writeln!(writer, "ACTIVITIES")?;
    writeln!(writer, "----------")?;
    writeln!(writer, "Total logged: {}", report.total_activities)?;
    let risk = &report.activity_risk;
    writeln!(
        writer,
        "Risk at logging time: high {}, medium {}, low {}, unknown {}",
        risk.high, risk.medium, risk.low, risk.unknown
    )?;

    Ok(())
}

/// Export a cycle report to human-readable text format
pub fn export_report<P: AsRef<Path>>(report: &CycleReport, output_path: P) -> Result<()> {
    let mut file = BufWriter::new(File::create(output_path)?);
    write_report(&mut file, report)?;
    file.flush()?;
    Ok(())
}

/// Export an activity log as a text table
pub fn export_activities<P: AsRef<Path>>(activities: &[ActivityRecord], output_path: P) -> Result<()> {
    let mut file = File::create(output_path)?;
    writeln!(file, "{}", activities_table(activities))?;
    Ok(())
}
