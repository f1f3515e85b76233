use kernel_bridge::KernelSolidHandle;
use part_types::Frame;
use tracing::debug;

use crate::geom;
use crate::kernel_ext::KernelBundle;
use crate::sketch::Sketch;
use crate::types::OpError;

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanKind {
    Union,
    Subtract,
    Intersect,
}

/// Execute a boolean operation between two solids.
pub fn execute_boolean(
    kb: &mut dyn KernelBundle,
    body_a: &KernelSolidHandle,
    body_b: &KernelSolidHandle,
    kind: BooleanKind,
) -> Result<KernelSolidHandle, OpError> {
    debug!(?kind, "boolean");
    let handle = match kind {
        BooleanKind::Union => kb.boolean_union(body_a, body_b)?,
        BooleanKind::Subtract => kb.boolean_subtract(body_a, body_b)?,
        BooleanKind::Intersect => kb.boolean_intersect(body_a, body_b)?,
    };
    Ok(handle)
}

/// Which side of a split plane to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKeep {
    /// The side the plane normal points to.
    Above,
    Below,
    Both,
}

/// Cut a solid with the plane of `frame`.
///
/// Returns the kept halves, the upper one first when both are kept.
pub fn execute_split(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    frame: &Frame,
    keep: SplitKeep,
) -> Result<Vec<KernelSolidHandle>, OpError> {
    let bbox = kb.bounding_box(solid)?;
    let reach = geom::norm(geom::sub(bbox.center(), frame.origin())) + bbox.diagonal() + 1.0;
    let sides: &[f64] = match keep {
        SplitKeep::Above => &[1.0],
        SplitKeep::Below => &[-1.0],
        SplitKeep::Both => &[1.0, -1.0],
    };
    let mut halves = Vec::with_capacity(sides.len());
    for &side in sides {
        let wire = Sketch::on(*frame).rect(kb, 2.0 * reach, 2.0 * reach, (true, true))?;
        let half_space = kb.extrude_wires(&[wire], frame.normal(), side * reach)?;
        halves.push(kb.boolean_intersect(solid, &half_space)?);
    }
    debug!(?keep, halves = halves.len(), "split");
    Ok(halves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_bridge::{Kernel, KernelIntrospect, MockKernel};

    fn cube(kernel: &mut MockKernel) -> KernelSolidHandle {
        let wire = Sketch::on(Frame::xy()).rect(kernel, 2.0, 2.0, (false, false)).unwrap();
        kernel.extrude_wires(&[wire], [0.0, 0.0, 1.0], 2.0).unwrap()
    }

    #[test]
    fn test_split_halves_share_the_volume() {
        let mut kernel = MockKernel::new();
        let solid = cube(&mut kernel);
        let plane = Frame::yz().offset(0.5);
        let halves = execute_split(&mut kernel, &solid, &plane, SplitKeep::Both).unwrap();
        assert_eq!(halves.len(), 2);
        let above = kernel.volume(&halves[0]).unwrap();
        let below = kernel.volume(&halves[1]).unwrap();
        assert!((above - 6.0).abs() < 0.1, "above {above}");
        assert!((below - 2.0).abs() < 0.1, "below {below}");
        assert!(kernel.contains_point(&halves[0], [1.5, 1.0, 1.0]).unwrap());
        assert!(!kernel.contains_point(&halves[0], [0.2, 1.0, 1.0]).unwrap());
    }

    #[test]
    fn test_subtract_removes_material() {
        let mut kernel = MockKernel::new();
        let solid = cube(&mut kernel);
        let tool = kernel.make_cylinder([1.0, 1.0, -1.0], [0.0, 0.0, 1.0], 0.5, 4.0).unwrap();
        let cut = execute_boolean(&mut kernel, &solid, &tool, BooleanKind::Subtract).unwrap();
        assert!(!kernel.contains_point(&cut, [1.0, 1.0, 1.0]).unwrap());
        assert!(kernel.contains_point(&cut, [0.2, 0.2, 1.0]).unwrap());
    }
}
