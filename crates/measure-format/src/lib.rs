//! Measure preset files and mesh export.

pub mod discover;
pub mod errors;
pub mod load;
pub mod metadata;
mod migrate;
pub mod preset;
pub mod save;
pub mod stl;

pub use discover::{discover_presets, find_preset};
pub use errors::{ExportError, LoadError};
pub use load::{load_preset, load_preset_file};
pub use metadata::PresetMetadata;
pub use preset::MeasurePreset;
pub use save::{save_preset, FORMAT_ID, FORMAT_VERSION};
pub use stl::{export_stl, StlFormat};
