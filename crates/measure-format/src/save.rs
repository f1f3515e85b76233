use serde::Serialize;

use crate::errors::ExportError;
use crate::preset::MeasurePreset;

/// Format identifier of preset files.
pub const FORMAT_ID: &str = "partgen-measures";

/// Current preset file version.
///
/// Version 1 carried a single `tolerance` number (the boolean overlap
/// slack) instead of the full `settings` block.
pub const FORMAT_VERSION: u32 = 2;

#[derive(Serialize)]
struct PresetFile<'a> {
    format: &'static str,
    version: u32,
    part: &'a str,
    preset: &'a crate::metadata::PresetMetadata,
    settings: &'a part_types::KernelTolerance,
    measures: &'a part_types::MeasureNode,
}

/// Serialize a preset to pretty-printed JSON in the current version.
pub fn save_preset(preset: &MeasurePreset) -> Result<String, ExportError> {
    let file = PresetFile {
        format: FORMAT_ID,
        version: FORMAT_VERSION,
        part: &preset.part,
        preset: &preset.metadata,
        settings: &preset.settings,
        measures: &preset.measures,
    };
    serde_json::to_string_pretty(&file).map_err(|e| ExportError::Serialize(e.to_string()))
}
