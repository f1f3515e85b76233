//! Counterbored and countersunk holes drilled against a frame normal.
//!
//! Cutters start `slack` above the surface so that the cut never leaves a
//! skin on coincident faces. The recess and the bore are cut one after the
//! other; their shared axis makes a union of the two degenerate for the
//! B-rep kernel. A hole without a depth goes through all.

use kernel_bridge::{KernelId, KernelSolidHandle, TopoKind};
use part_types::Frame;
use tracing::{debug, instrument};

use crate::geom;
use crate::kernel_ext::KernelBundle;
use crate::types::OpError;

/// A plain hole with a cylindrical recess at its mouth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counterbore {
    pub diameter: f64,
    pub cbore_diameter: f64,
    pub cbore_depth: f64,
    /// `None` drills through the whole solid.
    pub depth: Option<f64>,
}

/// A plain hole with a conical recess at its mouth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countersink {
    pub diameter: f64,
    pub csk_diameter: f64,
    /// Included cone angle in degrees.
    pub csk_angle: f64,
    /// `None` drills through the whole solid.
    pub depth: Option<f64>,
}

impl Counterbore {
    fn validate(&self) -> Result<(), OpError> {
        positive("hole diameter", self.diameter)?;
        positive("counterbore depth", self.cbore_depth)?;
        if self.cbore_diameter <= self.diameter {
            return Err(OpError::InvalidParameter {
                reason: format!(
                    "counterbore diameter {} must exceed the hole diameter {}",
                    self.cbore_diameter, self.diameter
                ),
            });
        }
        self.depth.map_or(Ok(()), |d| positive("hole depth", d))
    }
}

impl Countersink {
    fn validate(&self) -> Result<(), OpError> {
        positive("hole diameter", self.diameter)?;
        if self.csk_diameter <= self.diameter {
            return Err(OpError::InvalidParameter {
                reason: format!(
                    "countersink diameter {} must exceed the hole diameter {}",
                    self.csk_diameter, self.diameter
                ),
            });
        }
        if !(self.csk_angle > 0.0 && self.csk_angle < 180.0) {
            return Err(OpError::InvalidParameter {
                reason: format!("countersink angle {} is not in (0, 180)", self.csk_angle),
            });
        }
        self.depth.map_or(Ok(()), |d| positive("hole depth", d))
    }

    /// Depth of the cone from the surface down to the hole diameter.
    pub fn cone_depth(&self) -> f64 {
        let half = (self.csk_angle / 2.0).to_radians();
        (self.csk_diameter - self.diameter) / 2.0 / half.tan()
    }
}

fn positive(what: &str, value: f64) -> Result<(), OpError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(OpError::InvalidParameter {
            reason: format!("{what} must be positive, got {value}"),
        })
    }
}

/// Depth from the frame plane to the far side of the solid, against the
/// frame normal.
fn through_depth(kb: &dyn KernelBundle, solid: &KernelSolidHandle, frame: &Frame) -> Result<f64, OpError> {
    let bbox = kb.bounding_box(solid)?;
    let n = frame.normal();
    let o = frame.origin();
    let far = bbox
        .corners()
        .iter()
        .map(|c| -geom::dot(geom::sub(*c, o), n))
        .fold(0.0_f64, f64::max);
    Ok(far)
}

/// Drill counterbored holes at local `points` of `frame`.
#[instrument(skip(kb, frame, points), fields(holes = points.len()))]
pub fn cbore_hole(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    frame: &Frame,
    points: &[[f64; 2]],
    spec: &Counterbore,
    slack: f64,
) -> Result<KernelSolidHandle, OpError> {
    spec.validate()?;
    let depth = match spec.depth {
        Some(d) => d,
        None => through_depth(kb, solid, frame)? + slack,
    };
    let down = geom::scale(frame.normal(), -1.0);
    let mut result = solid.clone();
    for p in points {
        let mouth = geom::add(frame.to_world(*p), geom::scale(frame.normal(), slack));
        let hole = kb.make_cylinder(mouth, down, spec.diameter / 2.0, depth + slack)?;
        let recess = kb.make_cylinder(mouth, down, spec.cbore_diameter / 2.0, spec.cbore_depth + slack)?;
        result = kb.boolean_subtract(&result, &recess)?;
        result = kb.boolean_subtract(&result, &hole)?;
    }
    debug!(depth, "counterbores drilled");
    Ok(result)
}

/// Drill countersunk holes at local `points` of `frame`.
#[instrument(skip(kb, frame, points), fields(holes = points.len()))]
pub fn csk_hole(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    frame: &Frame,
    points: &[[f64; 2]],
    spec: &Countersink,
    slack: f64,
) -> Result<KernelSolidHandle, OpError> {
    spec.validate()?;
    let depth = match spec.depth {
        Some(d) => d,
        None => through_depth(kb, solid, frame)? + slack,
    };
    let down = geom::scale(frame.normal(), -1.0);
    let half = (spec.csk_angle / 2.0).to_radians();
    let mut result = solid.clone();
    for p in points {
        let mouth = geom::add(frame.to_world(*p), geom::scale(frame.normal(), slack));
        let hole = kb.make_cylinder(mouth, down, spec.diameter / 2.0, depth + slack)?;
        // widen the cone above the surface so its slope still meets csk_diameter there
        let top_radius = spec.csk_diameter / 2.0 + slack * half.tan();
        let cone = kb.make_cone(mouth, down, top_radius, spec.diameter / 2.0, spec.cone_depth() + slack)?;
        result = kb.boolean_subtract(&result, &cone)?;
        result = kb.boolean_subtract(&result, &hole)?;
    }
    debug!(depth, "countersinks drilled");
    Ok(result)
}

/// The drilling frame of a planar face: origin at its centroid, normal
/// along the face normal. The x direction is +X for a face looking up,
/// −X for one looking down, and Z × normal otherwise.
pub fn face_frame(kb: &dyn KernelBundle, face: KernelId, tolerance: f64) -> Result<Frame, OpError> {
    let sig = kb.compute_signature(face, TopoKind::Face);
    let (Some(centroid), Some(normal)) = (sig.centroid, sig.normal) else {
        return Err(OpError::InvalidParameter {
            reason: format!("face {face:?} is not planar"),
        });
    };
    let x_dir = if normal[2] >= 1.0 - tolerance {
        [1.0, 0.0, 0.0]
    } else if normal[2] <= -1.0 + tolerance {
        [-1.0, 0.0, 0.0]
    } else {
        geom::cross([0.0, 0.0, 1.0], normal)
    };
    Frame::new(centroid, x_dir, normal).map_err(|e| OpError::InvalidParameter {
        reason: e.to_string(),
    })
}

/// One countersunk hole per face, at the offset paired with it in the
/// face's drilling frame. Every frame is taken from `solid` before the
/// first hole is drilled.
pub fn csk_face_hole(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    holes: &[(KernelId, [f64; 2])],
    spec: &Countersink,
    slack: f64,
    tolerance: f64,
) -> Result<KernelSolidHandle, OpError> {
    if holes.is_empty() {
        return Err(OpError::EmptySelection {
            selector: "faces for countersunk holes".to_string(),
        });
    }
    let targets = holes
        .iter()
        .map(|(face, offset)| face_frame(kb, *face, tolerance).map(|frame| (frame, *offset)))
        .collect::<Result<Vec<_>, _>>()?;
    let mut result = solid.clone();
    for (frame, offset) in targets {
        debug!(origin = ?frame.origin(), normal = ?frame.normal(), "face hole");
        result = csk_hole(kb, &result, &frame, &[offset], spec, slack)?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::Sketch;
    use kernel_bridge::{Kernel, KernelIntrospect, MockKernel};

    fn plate(kernel: &mut MockKernel) -> KernelSolidHandle {
        let wire = Sketch::on(Frame::xy()).rect(kernel, 20.0, 10.0, (true, true)).unwrap();
        kernel.extrude_wires(&[wire], [0.0, 0.0, 1.0], 6.0).unwrap()
    }

    #[test]
    fn test_counterbore_profile() {
        let mut kernel = MockKernel::new();
        let solid = plate(&mut kernel);
        let top = Frame::xy().offset(6.0);
        let spec = Counterbore {
            diameter: 2.0,
            cbore_diameter: 4.0,
            cbore_depth: 2.0,
            depth: None,
        };
        let drilled = cbore_hole(&mut kernel, &solid, &top, &[[0.0, 0.0]], &spec, 0.01).unwrap();
        let inside = |k: &MockKernel, p| k.contains_point(&drilled, p).unwrap();
        assert!(!inside(&kernel, [0.0, 0.0, 0.5]), "through hole reaches the bottom");
        assert!(inside(&kernel, [1.5, 0.0, 1.0]), "below the recess the wall is at r = 1");
        assert!(!inside(&kernel, [1.5, 0.0, 5.0]), "recess is r = 2 near the top");
        assert!(inside(&kernel, [2.5, 0.0, 5.0]));
    }

    #[test]
    fn test_countersink_cone() {
        let spec = Countersink {
            diameter: 2.0,
            csk_diameter: 6.0,
            csk_angle: 90.0,
            depth: Some(4.0),
        };
        assert!((spec.cone_depth() - 2.0).abs() < 1e-12);

        let mut kernel = MockKernel::new();
        let solid = plate(&mut kernel);
        let top = Frame::xy().offset(6.0);
        let drilled = csk_hole(&mut kernel, &solid, &top, &[[0.0, 0.0]], &spec, 0.01).unwrap();
        // at z = 5 the cone radius is 2
        assert!(!kernel.contains_point(&drilled, [1.9, 0.0, 5.0]).unwrap());
        assert!(kernel.contains_point(&drilled, [2.1, 0.0, 5.0]).unwrap());
        // blind hole stops at z = 2
        assert!(kernel.contains_point(&drilled, [0.0, 0.0, 1.5]).unwrap());
    }

    #[test]
    fn test_face_frame_x_direction_rule() {
        let mut kernel = MockKernel::new();
        let solid = plate(&mut kernel);
        for (id, sig) in kernel.compute_all_signatures(&solid, TopoKind::Face) {
            let n = sig.normal.unwrap();
            let f = face_frame(&kernel, id, 1e-6).unwrap();
            let x = f.x_dir();
            if n[2] > 0.5 {
                assert!((x[0] - 1.0).abs() < 1e-9);
            } else if n[2] < -0.5 {
                assert!((x[0] + 1.0).abs() < 1e-9);
            } else {
                let expected = geom::cross([0.0, 0.0, 1.0], n);
                assert!(geom::norm(geom::sub(x, expected)) < 1e-9);
            }
        }
    }

    #[test]
    fn test_face_hole_on_a_sloped_face() {
        let mut kernel = MockKernel::new();
        // right triangle in the XZ plane, run along +Y
        let wire = kernel
            .make_polyline_wire(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 0.0, 4.0]], true)
            .unwrap();
        let wedge = kernel.extrude_wires(&[wire], [0.0, 1.0, 0.0], 6.0).unwrap();
        let a = std::f64::consts::FRAC_1_SQRT_2;
        let (slope, _) = kernel
            .compute_all_signatures(&wedge, TopoKind::Face)
            .into_iter()
            .find(|(_, s)| s.normal.is_some_and(|n| geom::norm(geom::sub(n, [a, 0.0, a])) < 1e-9))
            .unwrap();

        let frame = face_frame(&kernel, slope, 1e-6).unwrap();
        assert!(geom::norm(geom::sub(frame.x_dir(), [0.0, 1.0, 0.0])) < 1e-9, "Z x normal");
        assert!(geom::norm(geom::sub(frame.origin(), [2.0, 3.0, 2.0])) < 1e-9);

        let spec = Countersink {
            diameter: 1.0,
            csk_diameter: 2.0,
            csk_angle: 90.0,
            depth: Some(1.5),
        };
        let drilled = csk_face_hole(&mut kernel, &wedge, &[(slope, [2.0, 0.0])], &spec, 0.01, 1e-6).unwrap();
        let below = |p: [f64; 3]| geom::sub(p, [0.3 * a, 0.0, 0.3 * a]);
        assert!(!kernel.contains_point(&drilled, below([2.0, 5.0, 2.0])).unwrap(), "hole at the offset");
        assert!(kernel.contains_point(&drilled, below([2.0, 3.0, 2.0])).unwrap(), "centroid stays solid");
    }

    #[test]
    fn test_face_hole_needs_faces() {
        let mut kernel = MockKernel::new();
        let solid = plate(&mut kernel);
        let spec = Countersink {
            diameter: 1.0,
            csk_diameter: 2.0,
            csk_angle: 90.0,
            depth: None,
        };
        assert!(matches!(
            csk_face_hole(&mut kernel, &solid, &[], &spec, 0.01, 1e-6),
            Err(OpError::EmptySelection { .. })
        ));
    }

    #[test]
    fn test_invalid_counterbore_rejected() {
        let mut kernel = MockKernel::new();
        let solid = plate(&mut kernel);
        let spec = Counterbore {
            diameter: 4.0,
            cbore_diameter: 3.0,
            cbore_depth: 1.0,
            depth: None,
        };
        assert!(matches!(
            cbore_hole(&mut kernel, &solid, &Frame::xy(), &[[0.0, 0.0]], &spec, 0.01),
            Err(OpError::InvalidParameter { .. })
        ));
    }
}
