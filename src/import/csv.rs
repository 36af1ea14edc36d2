use csv::{ReaderBuilder, StringRecord};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::warn;

use super::{has_extension, ImportFormat};
use crate::dates::parse_date;
use crate::error::{ImportExportError, Result};
use crate::models::{CycleRecord, Flow};

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(&mut column_mapping, "id", &["id", "cycle_id", "uuid"]);
        Self::add_mapping(
            &mut column_mapping,
            "start_date",
            &["start_date", "startdate", "start", "period_start", "date"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "end_date",
            &["end_date", "enddate", "end", "period_end"],
        );
        Self::add_mapping(&mut column_mapping, "flow", &["flow", "intensity"]);
        Self::add_mapping(
            &mut column_mapping,
            "symptoms",
            &["symptoms", "symptom", "tags"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "custom_cycle_length",
            &[
                "custom_cycle_length",
                "customcyclelength",
                "cycle_length",
                "length",
            ],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_symptoms(value: &str) -> BTreeSet<String> {
        value
            .split([';', '|'])
            .map(str::trim)
            .filter(|symptom| !symptom.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Build one record from a row; `Err` carries the reason the row is unusable
    fn parse_row(
        &self,
        record: &StringRecord,
        header_mapping: &HashMap<usize, String>,
    ) -> std::result::Result<CycleRecord, String> {
        let mut id = String::new();
        let mut start_date = None;
        let mut end_date = None;
        let mut flow = Flow::default();
        let mut symptoms = BTreeSet::new();
        let mut custom_cycle_length = None;

        for (i, value) in record.iter().enumerate() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let Some(column_name) = header_mapping.get(&i) else {
                continue;
            };

            match column_name.as_str() {
                "id" => id = value.to_string(),
                "start_date" => {
                    start_date = Some(parse_date(value).map_err(|e| e.to_string())?);
                }
                "end_date" => {
                    end_date = Some(parse_date(value).map_err(|e| e.to_string())?);
                }
                "flow" => match value.parse::<Flow>() {
                    Ok(parsed) => flow = parsed,
                    Err(reason) => warn!(%reason, "Unknown flow value, using default"),
                },
                "symptoms" => symptoms = Self::parse_symptoms(value),
                "custom_cycle_length" => {
                    custom_cycle_length = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| format!("Invalid cycle length: {}", value))?,
                    );
                }
                _ => {} // Ignore unknown columns
            }
        }

        let start_date = start_date.ok_or_else(|| "missing start date".to_string())?;
        if let Some(end) = end_date {
            if end < start_date {
                return Err(format!("end date {} is before start date {}", end, start_date));
            }
        }

        Ok(CycleRecord {
            id,
            start_date,
            end_date,
            flow,
            symptoms,
            custom_cycle_length,
            created_at: None,
        })
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<CycleRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(file_path)
            .map_err(ImportExportError::from)?;

        let headers = reader.headers().map_err(ImportExportError::from)?.clone();

        // Map headers to standard names
        let header_mapping: HashMap<usize, String> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (i, self.normalize_column_name(header)))
            .collect();

        if !header_mapping.values().any(|name| name == "start_date") {
            return Err(ImportExportError::MissingData {
                field: "start_date column".to_string(),
            }
            .into());
        }

        let mut cycles = Vec::new();
        for result in reader.records() {
            let record = result.map_err(ImportExportError::from)?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();

            match self.parse_row(&record, &header_mapping) {
                Ok(cycle) => cycles.push(cycle),
                Err(reason) => warn!(line, %reason, "Skipping CSV row"),
            }
        }

        Ok(cycles)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}
