use kernel_bridge::{KernelId, KernelSolidHandle};
use tracing::{debug, instrument};

use crate::fillet::check_material;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Bevel the given edges of a solid by `distance` on each side.
///
/// The same material limit as for fillets applies.
#[instrument(skip(kb, edges), fields(edges = edges.len()))]
pub fn execute_chamfer(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
    distance: f64,
) -> Result<KernelSolidHandle, OpError> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(OpError::InvalidParameter {
            reason: "chamfer distance must be positive".to_string(),
        });
    }
    check_material(kb.as_introspect(), solid, edges, distance)?;
    let handle = kb.chamfer_edges(solid, edges, distance)?;
    debug!("chamfer applied");
    Ok(handle)
}
