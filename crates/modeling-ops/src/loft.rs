use kernel_bridge::{KernelSolidHandle, KernelWireHandle};
use tracing::debug;

use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Ruled solid between two closed planar wires with matching vertex counts.
pub fn execute_loft(
    kb: &mut dyn KernelBundle,
    bottom: &KernelWireHandle,
    top: &KernelWireHandle,
) -> Result<KernelSolidHandle, OpError> {
    let (nb, nt) = (kb.wire_points(bottom)?.len(), kb.wire_points(top)?.len());
    if nb < 3 || nt < 3 {
        return Err(OpError::InvalidParameter {
            reason: format!("loft sections need at least 3 points, got {nb} and {nt}"),
        });
    }
    debug!(bottom = nb, top = nt, "loft");
    Ok(kb.loft_wires(bottom, top)?)
}
