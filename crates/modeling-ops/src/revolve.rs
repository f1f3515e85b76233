use std::f64::consts::TAU;

use kernel_bridge::{KernelSolidHandle, KernelWireHandle};
use tracing::debug;

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Revolve a closed planar profile about an axis in its plane.
/// `angle` is in degrees, in (0, 360].
pub fn execute_revolve(
    kb: &mut dyn KernelBundle,
    profile: &KernelWireHandle,
    axis_origin: [f64; 3],
    axis_direction: [f64; 3],
    angle: f64,
) -> Result<KernelSolidHandle, OpError> {
    if !(angle > 0.0 && angle <= 360.0) {
        return Err(OpError::InvalidParameter {
            reason: format!("revolve angle must be in (0, 360] degrees, got {angle}"),
        });
    }
    let radians = (angle.to_radians()).min(TAU);
    debug!(angle, "revolve");
    Ok(kb.revolve_wire(profile, axis_origin, axis_direction, radians)?)
}
