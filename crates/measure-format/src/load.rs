use std::path::Path;

use part_types::{KernelTolerance, MeasureNode};
use serde::Deserialize;
use tracing::debug;

use crate::errors::LoadError;
use crate::metadata::PresetMetadata;
use crate::migrate::migrate;
use crate::preset::MeasurePreset;
use crate::save::{FORMAT_ID, FORMAT_VERSION};

#[derive(Deserialize)]
struct Header {
    format: String,
    version: u32,
}

/// The preset file structure as found on disk, any supported version.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PresetFileRaw {
    pub version: u32,
    pub part: String,
    pub preset: PresetMetadata,
    #[serde(default)]
    pub settings: Option<KernelTolerance>,
    /// Version 1 only.
    #[serde(default)]
    pub tolerance: Option<f64>,
    pub measures: MeasureNode,
}

/// Deserialize a preset from a JSON string.
///
/// Validates the format identifier and version, then migrates older files.
pub fn load_preset(json: &str) -> Result<MeasurePreset, LoadError> {
    let header: Header = serde_json::from_str(json).map_err(|e| LoadError::ParseError(e.to_string()))?;
    if header.format != FORMAT_ID {
        return Err(LoadError::UnknownFormat(header.format));
    }
    if header.version > FORMAT_VERSION {
        return Err(LoadError::FutureVersion {
            file_version: header.version,
            supported_version: FORMAT_VERSION,
        });
    }

    let raw: PresetFileRaw = serde_json::from_str(json).map_err(|e| LoadError::ParseError(e.to_string()))?;
    let preset = migrate(raw, FORMAT_VERSION)?;
    preset.settings.validate().map_err(LoadError::InvalidSettings)?;
    debug!(part = %preset.part, preset = %preset.name(), "preset loaded");
    Ok(preset)
}

/// Read and parse a preset file.
pub fn load_preset_file(path: &Path) -> Result<MeasurePreset, LoadError> {
    let json = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    load_preset(&json)
}
