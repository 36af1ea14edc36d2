use std::path::Path;
use tracing::info;

use crate::error::{ImportExportError, Result};
use crate::models::CycleRecord;

pub mod csv;
pub mod json;

/// Trait for importing cycle history from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import cycle records from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<CycleRecord>>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Picks the importer matching a file's extension
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(json::JsonImporter),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<CycleRecord>> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportExportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            })?;

        let cycles = importer.import_file(file_path)?;
        info!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            cycles = cycles.len(),
            "Imported cycles"
        );
        Ok(cycles)
    }

    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn has_extension(file_path: &Path, expected: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}
