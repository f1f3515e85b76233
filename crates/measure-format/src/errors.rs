use std::path::PathBuf;

/// Errors while reading a measure preset.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse preset: {0}")]
    ParseError(String),

    #[error("unknown preset format: {0}")]
    UnknownFormat(String),

    #[error("preset version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },

    #[error("migration failed from version {from} to {to}: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },

    #[error("invalid kernel settings: {0}")]
    InvalidSettings(String),

    #[error("cannot read {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("no preset named `{name}` for {part}")]
    PresetNotFound { part: String, name: String },
}

/// Errors while writing presets or meshes.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("tessellation failed: {0}")]
    Tessellation(#[from] kernel_bridge::KernelError),

    #[error("no solid available for export")]
    NoSolid,
}
