//! Wall mount for mobile devices: a lofted base screwed to the wall, with
//! an X-Mount plug on its tilted front face.

use kernel_bridge::KernelSolidHandle;
use modeling_ops::{execute_loft, Countersink, EdgeSelector, FaceSelector};
use part_engine::{derive_for, BuildContext, BuildError, DeriveMeasures, PartBuilder, StepContext, Workplane};
use part_types::{Color, DisplayOptions, Frame, MeasureError, MeasureNode, MeasureValue};
use tracing::debug;

use crate::xmount_plug::XMountPlug;

pub const NAME: &str = "WallMount";

/// Tag of the front face frame the plug is mounted on.
pub const PLUG_INTERFACE: &str = "xmount_plug_interface";

#[derive(Debug, Clone, Copy, Default)]
pub struct WallMount;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoltHoles {
    /// Offset from the face center towards the wall.
    pub upper_offset: f64,
    pub lower_offset: f64,
    pub spec: Countersink,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WallMountMeasures {
    pub depth: f64,
    pub chamfer: Option<f64>,
    pub back_width: f64,
    pub back_height: f64,
    pub front_width: f64,
    pub front_height: f64,
    /// Tilt of the front face in degrees, positive when it looks up.
    pub front_angle: f64,
    /// Vertical offset of the front face center from the back face center.
    pub front_offset: f64,
    pub bolt_holes: Option<BoltHoles>,
    /// Measures handed to the plug.
    pub plug: MeasureNode,
}

impl WallMountMeasures {
    /// The front face frame, relative to the wall frame.
    pub fn interface(&self, wall: &Frame) -> Frame {
        wall.offset(self.depth)
            .transformed([0.0, self.front_offset, 0.0], [-self.front_angle, 0.0, 0.0])
    }
}

impl DeriveMeasures for WallMount {
    type Derived = WallMountMeasures;

    fn derive(measures: &MeasureNode) -> Result<WallMountMeasures, MeasureError> {
        let v = measures.view();
        let plug = v.child("plug")?;
        // The base follows the plug unless told otherwise.
        let plate_width = plug.child("plate")?.positive("width")?;
        let stem_depth = plug.child("stem")?.positive("depth")?;

        let b = v.child("base")?;
        let back = b.child("back")?;
        let front = b.child("front")?;
        let m = WallMountMeasures {
            depth: b.positive("depth")?,
            chamfer: b.optional_length("chamfer")?.filter(|c| *c > 0.0),
            back_width: back.optional_length("width")?.unwrap_or(plate_width),
            back_height: back.positive("height")?,
            front_width: front.optional_length("width")?.unwrap_or(plate_width),
            front_height: front.optional_length("height")?.unwrap_or(stem_depth),
            front_angle: front.angle("angle")?,
            front_offset: front.optional_number("height_pos_offset")?.unwrap_or(0.0),
            bolt_holes: b
                .optional_child("bolt_holes")?
                .map(|h| -> Result<BoltHoles, MeasureError> {
                    Ok(BoltHoles {
                        upper_offset: h.number("upper_hole_offset")?,
                        lower_offset: h.number("lower_hole_offset")?,
                        spec: Countersink {
                            diameter: h.positive("hole_size")?,
                            csk_diameter: h.positive("head_size")?,
                            csk_angle: h.angle("head_angle")?,
                            depth: None,
                        },
                    })
                })
                .transpose()?,
            plug: plug.node().clone(),
        };

        for (view, key, value) in [(&back, "width", m.back_width), (&front, "width", m.front_width)] {
            if value <= 0.0 {
                return Err(view.out_of_range(key, format!("{value} must be greater than zero")));
            }
        }
        if m.front_height <= 0.0 {
            return Err(front.out_of_range("height", format!("{} must be greater than zero", m.front_height)));
        }
        if m.front_angle.abs() >= 90.0 {
            return Err(front.out_of_range("angle", "the front face would turn towards the wall"));
        }
        if m.front_height > m.back_height {
            return Err(front.inconsistent("height", "the front face is taller than the back"));
        }
        Ok(m)
    }
}

/// The two sloped faces carrying the bolt holes: not the side faces, not
/// the back or front, and then the highest or lowest of what remains.
fn bolt_face(wall: &Frame, upper: bool) -> FaceSelector {
    FaceSelector::parallel_to(wall.normal())
        .not()
        .and(FaceSelector::parallel_to(wall.x_dir()).not())
        .within(FaceSelector::extreme(wall.y_dir(), upper))
}

impl PartBuilder for WallMount {
    fn build(
        &self,
        ctx: &mut BuildContext<'_>,
        frame: &Frame,
        measures: &MeasureNode,
    ) -> Result<KernelSolidHandle, BuildError> {
        let m = derive_for::<WallMount>(NAME, measures)?;
        debug!(angle = m.front_angle, depth = m.depth, "wall mount");

        let mut wp = Workplane::new(*frame);
        let back = wp
            .sketch()
            .rect(ctx.kernel(), m.back_width, m.back_height, (true, true))
            .step_with("back outline", "base.back")?;
        wp.set_frame(m.interface(frame)).tag(PLUG_INTERFACE);
        let front = wp
            .sketch()
            .rect(ctx.kernel(), m.front_width, m.front_height, (true, true))
            .step_with("front outline", "base.front")?;
        let base = execute_loft(ctx.kernel(), &back, &front).step_with("base", "base")?;
        wp.add(ctx, base, "base")?;

        if let Some(size) = m.chamfer {
            // The four edges running from the wall to the front face.
            let runs = EdgeSelector::parallel_to(frame.x_dir()).not().within(
                EdgeSelector::extreme(frame.normal(), true)
                    .not()
                    .and(EdgeSelector::extreme(frame.normal(), false).not()),
            );
            wp.chamfer(ctx, &runs, size, "chamfer base", "base.chamfer")?;
        }

        if let Some(holes) = &m.bolt_holes {
            let faces = [
                (bolt_face(frame, true), [0.0, holes.upper_offset]),
                (bolt_face(frame, false), [0.0, holes.lower_offset]),
            ];
            wp.csk_face_holes(ctx, &faces, &holes.spec, "bolt holes", "base.bolt_holes")?;
        }
        let interface = wp.workplane_from_tagged(PLUG_INTERFACE)?;
        let base = wp.finish()?;
        ctx.show_debug("base", base.clone());

        // A fresh composition: the drilled base is plain material to it.
        let mut mount = Workplane::new(*frame);
        mount.add(ctx, base, "base")?;
        mount.set_frame(interface);
        mount.part(ctx, &XMountPlug, &m.plug)?;
        mount.finish()
    }

    fn name(&self) -> &str {
        NAME
    }

    fn display(&self) -> DisplayOptions {
        DisplayOptions::opaque(Color::named("lightgray"))
    }

    /// Built on the wall: x to the right, y up, normal pointing away from it.
    fn build_frame(&self) -> Frame {
        Frame::xz()
    }

    fn default_measures(&self) -> MeasureNode {
        MeasureNode::new()
            .with("debug", false)
            .with(
                "base",
                MeasureNode::new()
                    .with("depth", 15.0)
                    .with("chamfer", 0.8)
                    .with("back", MeasureNode::new().with("width", MeasureValue::Absent).with("height", 75.0))
                    .with(
                        "front",
                        MeasureNode::new()
                            .with("width", MeasureValue::Absent)
                            .with("height", MeasureValue::Absent)
                            .with("angle", -14.0)
                            .with("height_pos_offset", 0.0),
                    )
                    .with(
                        "bolt_holes",
                        MeasureNode::new()
                            .with("upper_hole_offset", 5.0)
                            .with("lower_hole_offset", 0.0)
                            .with("hole_size", 4.5)
                            .with("head_size", 8.6)
                            .with("head_angle", 90.0),
                    ),
            )
            .with("plug", crate::xmount_plug::plug_measures())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use kernel_bridge::{KernelIntrospect, MockKernel};
    use part_engine::assemble;
    use part_types::KernelTolerance;

    #[test]
    fn test_base_sizes_follow_the_plug() {
        let m = WallMount::derive(&WallMount.default_measures()).unwrap();
        assert_abs_diff_eq!(m.back_width, 20.4, epsilon = 1e-12);
        assert_abs_diff_eq!(m.front_width, 20.4, epsilon = 1e-12);
        assert_abs_diff_eq!(m.front_height, 15.5, epsilon = 1e-12);
        assert!(m.bolt_holes.is_some());
    }

    #[test]
    fn test_front_face_tilts_down_for_negative_angles() {
        let m = WallMount::derive(&WallMount.default_measures()).unwrap();
        let interface = m.interface(&Frame::xz());
        let n = interface.normal();
        assert_abs_diff_eq!(interface.origin()[1], -15.0, epsilon = 1e-12);
        assert!(n[1] < 0.0, "faces away from the wall");
        assert_abs_diff_eq!(n[2], -(14.0_f64.to_radians().sin()), epsilon = 1e-12);
    }

    #[test]
    fn test_bolt_holes_run_square_to_the_sloped_faces() {
        let measures = WallMount.default_measures();
        let m = WallMount::derive(&measures).unwrap();
        let holes = m.bolt_holes.unwrap();
        let wall = Frame::xz();
        let interface = m.interface(&wall);
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let part = assemble(&mut ctx, &WallMount, &wall, &measures).unwrap();
        let solid = &part.solids[0];
        let inside = |p| ctx.introspect().contains_point(solid, p).unwrap();

        for (sign, offset) in [(1.0, holes.upper_offset), (-1.0, holes.lower_offset)] {
            let back = wall.to_world3([0.0, sign * m.back_height / 2.0, 0.0]);
            let front = interface.to_world3([0.0, sign * m.front_height / 2.0, 0.0]);
            let run = [0.0, front[1] - back[1], front[2] - back[2]];
            // outward normal; the face frame keeps x along the wall
            let normal = [0.0, sign * run[2], -sign * run[1]];
            let center = [0.0, (back[1] + front[1]) / 2.0, (back[2] + front[2]) / 2.0];
            let face = Frame::new(center, [1.0, 0.0, 0.0], normal).unwrap();
            assert!(!inside(face.to_world3([0.0, offset, -2.0])), "bore at {offset}");
            assert!(inside(face.to_world3([4.0, offset, -2.0])), "beside the bore");
            assert!(inside(face.to_world3([0.0, offset - 4.5, -2.0])), "below the bore");
        }
    }

    #[test]
    fn test_plug_sits_on_the_front_face() {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let measures = WallMount.default_measures();
        let part = assemble(&mut ctx, &WallMount, &Frame::xz(), &measures).unwrap();
        let m = WallMount::derive(&measures).unwrap();
        let interface = m.interface(&Frame::xz());
        let solid = &part.solids[0];
        let inside = |p| ctx.introspect().contains_point(solid, p).unwrap();
        assert!(inside(interface.to_world3([0.0, 0.0, 1.0])), "plug stem");
        assert!(inside(interface.to_world3([0.0, 0.0, -1.0])), "base behind the front face");
        assert!(!inside(interface.to_world3([9.0, 0.0, 1.0])), "beside the stem");
        assert!(inside([0.0, -1.0, 30.0]), "base near the wall");
    }
}
