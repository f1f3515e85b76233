//! Presets shipped with the library, compiled into the binary.

use measure_format::{load_preset, LoadError, MeasurePreset};

const BUNDLED: &[(&str, &str)] = &[
    ("box_lid_fixation.json", include_str!("../presets/box_lid_fixation.json")),
    ("foot_block_toilet_seat.json", include_str!("../presets/foot_block_toilet_seat.json")),
    ("foot_block_mitraset.json", include_str!("../presets/foot_block_mitraset.json")),
    ("xmount_plug.json", include_str!("../presets/xmount_plug.json")),
    ("wall_mount.json", include_str!("../presets/wall_mount.json")),
];

/// Parse every bundled preset, in a fixed order.
pub fn bundled_presets() -> Result<Vec<MeasurePreset>, LoadError> {
    BUNDLED
        .iter()
        .map(|(file, json)| {
            load_preset(json).map_err(|e| {
                tracing::warn!(file, error = %e, "bundled preset does not load");
                e
            })
        })
        .collect()
}

/// File names of the bundled presets, for listings.
pub fn bundled_files() -> impl Iterator<Item = &'static str> {
    BUNDLED.iter().map(|(file, _)| *file)
}
