use std::collections::HashMap;

use kernel_bridge::{KernelId, KernelIntrospect, KernelSolidHandle, TopoKind, TopoSignature};
use tracing::{debug, instrument};

use crate::geom;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// Relative slack when comparing a radius against the material limit, so
/// that exactly half of the shortest adjacent edge is accepted.
const LIMIT_SLACK: f64 = 1e-9;

/// Round the given edges of a solid.
///
/// The radius must be positive and may not exceed half the length of the
/// shortest straight edge meeting a selected edge at a sharp corner.
/// Oversized radii fail with [`OpError::ExceedsMaterial`] and are never
/// clamped.
#[instrument(skip(kb, edges), fields(edges = edges.len()))]
pub fn execute_fillet(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
    radius: f64,
) -> Result<KernelSolidHandle, OpError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(OpError::InvalidParameter {
            reason: "fillet radius must be positive".to_string(),
        });
    }
    check_material(kb.as_introspect(), solid, edges, radius)?;
    let handle = kb.fillet_edges(solid, edges, radius)?;
    debug!("fillet applied");
    Ok(handle)
}

/// Fail when `size` is larger than the room left next to any selected edge.
pub(crate) fn check_material(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
    size: f64,
) -> Result<(), OpError> {
    if edges.is_empty() {
        return Err(OpError::EmptySelection {
            selector: "edges to treat".to_string(),
        });
    }
    if let Some((limit, edge)) = material_limit(introspect, solid, edges) {
        if size > limit * (1.0 + LIMIT_SLACK) {
            return Err(OpError::ExceedsMaterial {
                radius: size,
                limit,
                edge,
            });
        }
    }
    Ok(())
}

/// Half the length of the shortest straight edge that meets one of `edges`
/// at a sharp corner, with the selected edge it meets.
pub fn material_limit(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
) -> Option<(f64, KernelId)> {
    let sigs: HashMap<KernelId, TopoSignature> = introspect
        .compute_all_signatures(solid, TopoKind::Edge)
        .into_iter()
        .collect();
    let mut at_vertex: HashMap<KernelId, Vec<KernelId>> = HashMap::new();
    for &e in sigs.keys() {
        let (a, b) = introspect.edge_vertices(e);
        for v in [a, b] {
            if v != KernelId::NONE {
                at_vertex.entry(v).or_default().push(e);
            }
        }
    }

    let mut best: Option<(f64, KernelId)> = None;
    for &selected in edges {
        let Some(sig) = sigs.get(&selected) else {
            continue;
        };
        let (a, b) = introspect.edge_vertices(selected);
        for v in [a, b] {
            let Some(neighbours) = at_vertex.get(&v) else {
                continue;
            };
            for n in neighbours.iter().filter(|n| **n != selected) {
                let Some(nsig) = sigs.get(n) else {
                    continue;
                };
                if !nsig.is_line() || !is_sharp(sig, nsig) {
                    continue;
                }
                let Some(length) = nsig.length else {
                    continue;
                };
                let half = length / 2.0;
                if best.map_or(true, |(l, _)| half < l) {
                    best = Some((half, selected));
                }
            }
        }
    }
    best
}

/// Two straight edges meeting at a vertex form a sharp corner unless they
/// are collinear. Curved edges come from rounded corners and join their
/// neighbours tangentially.
fn is_sharp(a: &TopoSignature, b: &TopoSignature) -> bool {
    match (a.direction, b.direction) {
        (Some(da), Some(db)) => geom::dot(da, db).abs() < 1.0 - 1e-9,
        _ => false,
    }
}
