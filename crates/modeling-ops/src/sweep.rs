use kernel_bridge::{KernelSolidHandle, KernelWireHandle};
use tracing::debug;

use crate::geom;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Sweep a closed profile along an open path.
///
/// The profile must be orthogonal to the path at its start.
pub fn execute_sweep(
    kb: &mut dyn KernelBundle,
    profile: &KernelWireHandle,
    path: &KernelWireHandle,
    angular_tolerance: f64,
) -> Result<KernelSolidHandle, OpError> {
    let path_points = kb.wire_points(path)?;
    let tangent = match path_points.as_slice() {
        [a, b, ..] => geom::normalize(geom::sub(*b, *a)),
        _ => None,
    }
    .ok_or_else(|| OpError::InvalidParameter {
        reason: "sweep path has no direction at its start".to_string(),
    })?;
    let plane = kb.wire_plane(profile, f64::INFINITY)?;
    let alignment = geom::dot(plane.normal, tangent).abs();
    if alignment < 1.0 - angular_tolerance {
        return Err(OpError::InvalidParameter {
            reason: format!(
                "profile is not orthogonal to the path start (cos = {alignment:.6})"
            ),
        });
    }
    debug!(path_points = path_points.len(), "sweep");
    Ok(kb.sweep_wire(profile, path)?)
}
