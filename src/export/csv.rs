use csv::Writer;
use std::path::Path;

use super::export_failed;
use crate::error::Result;
use crate::models::{ActivityRecord, CycleRecord};

/// Export a cycle history to CSV in the column layout the importer reads back
pub fn export_cycles<P: AsRef<Path>>(cycles: &[CycleRecord], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    let mut writer = Writer::from_path(output_path).map_err(|e| export_failed(output_path, e))?;

    writer
        .write_record(["id", "start_date", "end_date", "flow", "symptoms", "custom_cycle_length"])
        .map_err(|e| export_failed(output_path, e))?;

    for cycle in cycles {
        let symptoms: Vec<&str> = cycle.symptoms.iter().map(String::as_str).collect();
        writer
            .write_record([
                cycle.id.clone(),
                cycle.start_date.format("%Y-%m-%d").to_string(),
                cycle
                    .end_date
                    .map_or(String::new(), |d| d.format("%Y-%m-%d").to_string()),
                cycle.flow.to_string(),
                symptoms.join(";"),
                cycle
                    .custom_cycle_length
                    .map_or(String::new(), |days| days.to_string()),
            ])
            .map_err(|e| export_failed(output_path, e))?;
    }

    writer.flush()?;
    Ok(())
}

/// Export an activity log to CSV
pub fn export_activities<P: AsRef<Path>>(
    activities: &[ActivityRecord],
    output_path: P,
) -> Result<()> {
    let output_path = output_path.as_ref();
    let mut writer = Writer::from_path(output_path).map_err(|e| export_failed(output_path, e))?;

    writer
        .write_record(["id", "date", "protection", "pregnancy_risk"])
        .map_err(|e| export_failed(output_path, e))?;

    for activity in activities {
        writer
            .write_record([
                activity.id.clone(),
                activity.date.format("%Y-%m-%d").to_string(),
                activity.protection.to_string(),
                activity.pregnancy_risk.to_string(),
            ])
            .map_err(|e| export_failed(output_path, e))?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::csv::CsvImporter;
    use crate::import::ImportFormat;
    use crate::models::{Flow, RiskLevel};
    use chrono::NaiveDate;
    use tempfile::Builder;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exported_cycles_can_be_reimported() {
        let mut first = CycleRecord::new("c1", date(2024, 1, 1)).with_end_date(date(2024, 1, 5));
        first.flow = Flow::Heavy;
        first.symptoms.insert("cramps".to_string());
        first.symptoms.insert("headache".to_string());
        let second = CycleRecord::new("c2", date(2024, 1, 29)).with_custom_cycle_length(30);
        let cycles = vec![first, second];

        let file = Builder::new().suffix(".csv").tempfile().unwrap();
        export_cycles(&cycles, file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("id,start_date,end_date,flow,symptoms,custom_cycle_length"));
        assert!(content.contains("c1,2024-01-01,2024-01-05,heavy,cramps;headache,"));

        let reimported = CsvImporter::new().import_file(file.path()).unwrap();
        assert_eq!(reimported, cycles);
    }

    #[test]
    fn test_export_activities() {
        let activities = vec![ActivityRecord {
            id: "a1".to_string(),
            date: date(2024, 1, 15),
            protection: true,
            pregnancy_risk: RiskLevel::High,
            created_at: None,
        }];

        let file = Builder::new().suffix(".csv").tempfile().unwrap();
        export_activities(&activities, file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("a1,2024-01-15,true,high"));
    }
}
