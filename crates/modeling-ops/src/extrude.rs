use kernel_bridge::{KernelSolidHandle, KernelWireHandle, RigidMotion};
use tracing::debug;

use crate::geom;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Extrude coplanar wires (outer boundary first, then holes) along
/// `direction` by `depth`. A negative depth extrudes the other way.
pub fn execute_extrude(
    kb: &mut dyn KernelBundle,
    wires: &[KernelWireHandle],
    direction: [f64; 3],
    depth: f64,
) -> Result<KernelSolidHandle, OpError> {
    if wires.is_empty() {
        return Err(OpError::NoProfiles);
    }
    if !depth.is_finite() || depth == 0.0 {
        return Err(OpError::InvalidParameter {
            reason: format!("extrusion depth must be non-zero, got {depth}"),
        });
    }
    debug!(wires = wires.len(), depth, "extrude");
    Ok(kb.extrude_wires(wires, direction, depth)?)
}

/// Extrude by `depth` in total, half on each side of the wire plane.
pub fn execute_symmetric_extrude(
    kb: &mut dyn KernelBundle,
    wires: &[KernelWireHandle],
    direction: [f64; 3],
    depth: f64,
) -> Result<KernelSolidHandle, OpError> {
    let unit = geom::normalize(direction).ok_or_else(|| OpError::InvalidParameter {
        reason: "extrude direction has zero length".to_string(),
    })?;
    let solid = execute_extrude(kb, wires, unit, depth)?;
    let back = RigidMotion::translation(geom::scale(unit, -depth / 2.0));
    Ok(kb.transform_solid(&solid, &back)?)
}
