use std::path::Path;

use super::{export_failed, CycleReport};
use crate::error::Result;

/// Export a cycle report to JSON format
pub fn export_report<P: AsRef<Path>>(report: &CycleReport, output_path: P) -> Result<()> {
    export_json(report, output_path)
}

/// Export any serializable data structure to JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<()>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let output_path = output_path.as_ref();
    let json_data =
        serde_json::to_string_pretty(data).map_err(|e| export_failed(output_path, e))?;

    std::fs::write(output_path, json_data)?;
    Ok(())
}
