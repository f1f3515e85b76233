//! Error type and the small geometric helpers the checks share.

use kernel_bridge::{KernelError, KernelIntrospect, KernelSolidHandle};
use measure_format::ExportError;
use modeling_ops::FaceSelector;
use part_engine::BuildError;

// ── Error Type ──────────────────────────────────────────────────────────────

/// Unified error type for the test harness.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("nothing built yet")]
    NotBuilt,

    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },
}

// ── Geometry ────────────────────────────────────────────────────────────────

/// Summed area of the faces `selector` picks on `solid`.
pub fn face_area(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    selector: &FaceSelector,
    tolerance: f64,
) -> f64 {
    let picked = selector.select(introspect, solid, tolerance);
    FaceSelector::enumerate(introspect, solid)
        .into_iter()
        .filter(|info| picked.contains(&info.id))
        .filter_map(|info| info.size)
        .sum()
}

/// Area a rectangle loses when its four corners are rounded with `radius`.
pub fn rounded_corner_loss(radius: f64) -> f64 {
    4.0 * (1.0 - std::f64::consts::FRAC_PI_4) * radius * radius
}

/// Volume of a straight cylinder.
pub fn cylinder_volume(diameter: f64, height: f64) -> f64 {
    std::f64::consts::PI * diameter * diameter / 4.0 * height
}

pub fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}
