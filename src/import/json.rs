use std::fs;
use std::path::Path;

use super::{has_extension, ImportFormat};
use crate::error::{ImportExportError, Result};
use crate::models::CycleRecord;

/// Imports a JSON array of cycle records in the API's field layout
pub struct JsonImporter;

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<CycleRecord>> {
        let content = fs::read_to_string(file_path)?;
        let cycles: Vec<CycleRecord> =
            serde_json::from_str(&content).map_err(|e| ImportExportError::ParseError {
                format: "json".to_string(),
                line: e.line(),
                reason: e.to_string(),
            })?;
        Ok(cycles)
    }

    fn get_format_name(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_import_json_array() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"id": "a", "startDate": "2024-01-01", "endDate": "2024-01-05", "flow": "light"}},
                {{"id": "b", "startDate": "2024-01-29", "customCycleLength": 30}}
            ]"#
        )
        .unwrap();

        let cycles = JsonImporter.import_file(file.path()).unwrap();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].end_date, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(cycles[1].custom_cycle_length, Some(30));
    }

    #[test]
    fn test_import_records_without_ids() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"startDate": "2024-01-01"}}]"#).unwrap();

        let cycles = JsonImporter.import_file(file.path()).unwrap();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].id.is_empty());
        assert_eq!(cycles[0].start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let mut records = crate::records::UserRecords::default();
        records.extend_cycles(cycles).unwrap();
        assert!(!records.cycles()[0].id.is_empty());
    }

    #[test]
    fn test_malformed_json_reports_line() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[\n{{\"id\": \"a\", \"startDate\": \"not a date\"}}\n]").unwrap();

        let err = JsonImporter.import_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
