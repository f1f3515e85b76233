//! Preset discovery in a directory of `*.json` files.

use std::path::Path;

use tracing::debug;

use crate::errors::LoadError;
use crate::load::load_preset_file;
use crate::preset::MeasurePreset;

/// Load every `*.json` preset directly inside `dir`, sorted by part and
/// preset name. A file that fails to load fails the whole discovery.
pub fn discover_presets(dir: &Path) -> Result<Vec<MeasurePreset>, LoadError> {
    let io = |e: std::io::Error| LoadError::Io {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut presets = paths
        .iter()
        .map(|p| load_preset_file(p))
        .collect::<Result<Vec<_>, _>>()?;
    presets.sort_by(|a, b| (a.part.as_str(), a.name()).cmp(&(b.part.as_str(), b.name())));
    debug!(dir = %dir.display(), count = presets.len(), "presets discovered");
    Ok(presets)
}

/// The preset of `part` called `name`.
pub fn find_preset<'a>(presets: &'a [MeasurePreset], part: &str, name: &str) -> Result<&'a MeasurePreset, LoadError> {
    presets
        .iter()
        .find(|p| p.part == part && p.name() == name)
        .ok_or_else(|| LoadError::PresetNotFound {
            part: part.to_string(),
            name: name.to_string(),
        })
}
