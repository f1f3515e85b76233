//! Plug for the X-Mount Type-M mounting system.
//!
//! The plug is built with its origin at the center of the plate's top face
//! and delivered with its origin at the center of the stem's bottom face,
//! which is where dependent parts attach it.

use kernel_bridge::{KernelSolidHandle, KernelWireHandle};
use modeling_ops::{
    execute_chamfer, execute_extrude, execute_fillet, execute_symmetric_extrude, union_wires, EdgeSelector, Sketch,
};
use part_engine::{derive_for, BuildContext, BuildError, DeriveMeasures, PartBuilder, StepContext, Workplane};
use part_types::{Color, DisplayOptions, Frame, MeasureError, MeasureNode, MeasureView};
use tracing::debug;

pub const NAME: &str = "XMountPlug";

#[derive(Debug, Clone, Copy, Default)]
pub struct XMountPlug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plate {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub corner_radius: Option<f64>,
    pub chamfer: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stem {
    /// Distance of the stem's front face from the plate's front edge.
    pub depth_pos: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub corner_radius: Option<f64>,
}

/// Trapezoid notch at the plate front, also cut into the stem top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutout {
    /// Width at the plate front.
    pub width_1: f64,
    /// Width at the back end of the notch.
    pub width_2: f64,
    pub depth: f64,
    pub height: f64,
    pub corner_radius: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    pub width: f64,
    pub thickness: f64,
    pub chamfer: Option<f64>,
    /// Measured down from the plate's lower face.
    pub step_height: f64,
    pub step_depth: f64,
    pub lever_length: f64,
    /// Degrees the lever is swung down from the step.
    pub lever_angle: f64,
    pub ridge_height: f64,
    pub ridge_depth: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XMountPlugMeasures {
    pub plate: Plate,
    pub stem: Stem,
    pub cutout: Cutout,
    pub clip: Clip,
    /// Offset of the plate top center from the stem bottom center, along
    /// the part's y axis and normal.
    pub plate_offset: [f64; 2],
}

impl XMountPlugMeasures {
    /// The plate top frame, given the frame the stem bottom sits on.
    pub fn plate_top(&self, frame: &Frame) -> Frame {
        frame.transformed([0.0, self.plate_offset[0], self.plate_offset[1]], [0.0, 0.0, 0.0])
    }
}

fn optional_size(v: &MeasureView<'_>, key: &str) -> Result<Option<f64>, MeasureError> {
    Ok(v.optional_length(key)?.filter(|s| *s > 0.0))
}

impl DeriveMeasures for XMountPlug {
    type Derived = XMountPlugMeasures;

    fn derive(measures: &MeasureNode) -> Result<XMountPlugMeasures, MeasureError> {
        let v = measures.view();
        let p = v.child("plate")?;
        let plate = Plate {
            width: p.positive("width")?,
            depth: p.positive("depth")?,
            height: p.positive("height")?,
            corner_radius: optional_size(&p, "corner_radius")?,
            chamfer: optional_size(&p, "chamfer")?,
        };
        let s = v.child("stem")?;
        let stem = Stem {
            depth_pos: s.length("depth_pos")?,
            width: s.positive("width")?,
            depth: s.positive("depth")?,
            height: s.positive("height")?,
            corner_radius: optional_size(&s, "corner_radius")?,
        };
        let c = v.child("cutout")?;
        let cutout = Cutout {
            width_1: c.positive("width_1")?,
            width_2: c.positive("width_2")?,
            depth: c.positive("depth")?,
            height: c.positive("height")?,
            corner_radius: optional_size(&c, "corner_radius")?,
        };
        let k = v.child("clip")?;
        let clip = Clip {
            width: k.positive("width")?,
            thickness: k.positive("thickness")?,
            chamfer: optional_size(&k, "chamfer")?,
            step_height: k.positive("step_height")?,
            step_depth: k.positive("step_depth")?,
            lever_length: k.positive("lever_length")?,
            lever_angle: k.angle("lever_angle")?,
            ridge_height: k.positive("ridge_height")?,
            ridge_depth: k.positive("ridge_depth")?,
        };

        if stem.depth_pos + stem.depth > plate.depth {
            return Err(s.inconsistent("depth", "the stem reaches past the back of the plate"));
        }
        if stem.width > plate.width {
            return Err(s.inconsistent("width", "the stem is wider than the plate"));
        }
        if cutout.width_1 >= plate.width || cutout.width_2 >= plate.width {
            return Err(c.inconsistent("width_1", "the cutout is as wide as the plate"));
        }
        if cutout.depth >= plate.depth {
            return Err(c.inconsistent("depth", "the cutout splits the plate"));
        }
        if cutout.height >= plate.height + stem.height {
            return Err(c.inconsistent("height", "the cutout would cut through the stem"));
        }
        if clip.thickness >= clip.step_height {
            return Err(k.inconsistent("thickness", "the clip is thicker than its step"));
        }
        if clip.step_height >= stem.height {
            return Err(k.inconsistent("step_height", "the clip step reaches below the stem"));
        }
        if clip.ridge_depth >= clip.step_depth {
            return Err(k.inconsistent("ridge_depth", "the ridge is deeper than the clip step"));
        }
        if !(0.0..90.0).contains(&clip.lever_angle) {
            return Err(k.out_of_range("lever_angle", format!("{} is not in [0, 90)", clip.lever_angle)));
        }

        let plate_offset = [
            0.5 * plate.depth - stem.depth_pos - 0.5 * stem.depth,
            plate.height + stem.height,
        ];
        Ok(XMountPlugMeasures {
            plate,
            stem,
            cutout,
            clip,
            plate_offset,
        })
    }
}

/// Plate outline with the notch at its front, in plate top coordinates.
fn notch_outline(plate: &Plate, cutout: &Cutout) -> Vec<[f64; 2]> {
    let (w, d) = (plate.width, plate.depth);
    let corner = |x: f64, y: f64| [x - 0.5 * w, y - 0.5 * d];
    vec![
        corner(0.0, 0.0),
        corner(0.5 * (w - cutout.width_1), 0.0),
        corner(0.5 * (w - cutout.width_2), cutout.depth),
        corner(0.5 * (w + cutout.width_2), cutout.depth),
        corner(0.5 * (w + cutout.width_1), 0.0),
        corner(w, 0.0),
        corner(w, d),
        corner(0.0, d),
    ]
}

/// The notch alone, used to cut the same shape into the stem.
fn cutout_outline(plate: &Plate, cutout: &Cutout) -> Vec<[f64; 2]> {
    notch_outline(plate, cutout)[1..5].to_vec()
}

fn stem(ctx: &mut BuildContext<'_>, top: &Frame, m: &XMountPlugMeasures) -> Result<KernelSolidHandle, BuildError> {
    let tol = *ctx.tolerance();
    let (p, s) = (&m.plate, &m.stem);
    let bottom = top.offset(-(p.height + s.height)).shifted(0.0, -0.5 * p.depth + s.depth_pos);
    let outline = Sketch::on(bottom)
        .rect(ctx.kernel(), s.width, s.depth, (true, false))
        .step_with("stem", "stem")?;
    // reaches into the plate so the two fuse
    let mut solid = execute_extrude(ctx.kernel(), &[outline], bottom.normal(), s.height + tol.overlap_slack)
        .step_with("stem", "stem.height")?;
    if let Some(radius) = s.corner_radius {
        let ids = EdgeSelector::parallel_to(top.normal())
            .select_required(ctx.introspect(), &solid, tol.selection)
            .step("round stem corners")?;
        solid = execute_fillet(ctx.kernel(), &solid, &ids, radius).step_with("round stem corners", "stem.corner_radius")?;
    }
    Ok(solid)
}

fn lever_outline(pivot: [f64; 2], clip: &Clip) -> Vec<[f64; 2]> {
    let (sin, cos) = clip.lever_angle.to_radians().sin_cos();
    let (t, l) = (clip.thickness, clip.lever_length);
    [[0.0, 0.0], [t, 0.0], [t, l], [0.0, l]]
        .iter()
        .map(|[dx, dy]| [pivot[0] + dx * cos + dy * sin, pivot[1] - dx * sin + dy * cos])
        .collect()
}

/// Cross-section of the clip in its center plane: the step, the swung-down
/// lever and the ridge, composed into one outline.
fn clip_outline(
    ctx: &mut BuildContext<'_>,
    plane: &Frame,
    clip: &Clip,
) -> Result<Vec<KernelWireHandle>, BuildError> {
    let composer = ctx.composer();
    let slack = composer.overlap_slack;
    let (t, sh, sd) = (clip.thickness, clip.step_height, clip.step_depth);
    let bar_top = sh - t;
    let sketch = Sketch::on(*plane);

    // Starts inside the plate so the clip fuses with it.
    let step = Sketch::on(plane.shifted(-slack, 0.0))
        .rect(ctx.kernel(), composer.nudge(sh), t, (false, false))
        .step("clip step")?;
    let bar = sketch
        .polyline(ctx.kernel(), &[[bar_top, 0.0], [sh, 0.0], [sh, sd], [bar_top, sd]], true)
        .step("clip step")?;
    let lever = sketch
        .polyline(ctx.kernel(), &lever_outline([bar_top, sd], clip), true)
        .step_with("clip lever", "clip.lever_angle")?;
    // The ridge overlaps the bar instead of resting on it.
    let ridge = sketch
        .polyline(
            ctx.kernel(),
            &[
                [bar_top, sd],
                [bar_top - clip.ridge_height, sd - clip.ridge_depth],
                [bar_top + 0.5 * t, sd - clip.ridge_depth],
                [bar_top + 0.5 * t, sd],
            ],
            true,
        )
        .step("clip ridge")?;

    let composed = union_wires(ctx.kernel(), &[step, bar, lever, ridge], &composer).step("clip outline")?;
    let outline = composed.single().step("clip outline")?;
    Ok(outline.wires())
}

fn clip(ctx: &mut BuildContext<'_>, top: &Frame, m: &XMountPlugMeasures) -> Result<KernelSolidHandle, BuildError> {
    let tol = *ctx.tolerance();
    let c = &m.clip;
    // x runs down from the plate's lower face, y towards the back.
    let plane = top
        .rotated([0.0, 90.0, 0.0])
        .shifted(m.plate.height, 0.5 * m.plate.depth - c.thickness);
    let wires = clip_outline(ctx, &plane, c)?;
    let mut solid =
        execute_symmetric_extrude(ctx.kernel(), &wires, plane.normal(), c.width).step_with("clip", "clip.width")?;
    if let Some(size) = c.chamfer {
        for max in [true, false] {
            let ids = EdgeSelector::extreme(plane.normal(), max)
                .select_required(ctx.introspect(), &solid, tol.selection)
                .step("chamfer clip")?;
            solid = execute_chamfer(ctx.kernel(), &solid, &ids, size).step_with("chamfer clip", "clip.chamfer")?;
        }
    }
    Ok(solid)
}

fn cutter(ctx: &mut BuildContext<'_>, top: &Frame, m: &XMountPlugMeasures) -> Result<KernelSolidHandle, BuildError> {
    let tol = *ctx.tolerance();
    let outline = Sketch::on(*top)
        .polyline(ctx.kernel(), &cutout_outline(&m.plate, &m.cutout), true)
        .step_with("cutout", "cutout")?;
    let mut solid =
        execute_extrude(ctx.kernel(), &[outline], top.normal(), -m.cutout.height).step_with("cutout", "cutout.height")?;
    if let Some(radius) = m.cutout.corner_radius {
        let ids = EdgeSelector::parallel_to(top.normal())
            .and(EdgeSelector::extreme(top.y_dir(), true))
            .select_required(ctx.introspect(), &solid, tol.selection)
            .step("round cutout")?;
        solid = execute_fillet(ctx.kernel(), &solid, &ids, radius).step_with("round cutout", "cutout.corner_radius")?;
    }
    Ok(solid)
}

impl PartBuilder for XMountPlug {
    fn build(
        &self,
        ctx: &mut BuildContext<'_>,
        frame: &Frame,
        measures: &MeasureNode,
    ) -> Result<KernelSolidHandle, BuildError> {
        let m = derive_for::<XMountPlug>(NAME, measures)?;
        let top = m.plate_top(frame);
        debug!(offset = ?m.plate_offset, "plate top");

        let mut wp = Workplane::new(top);
        let outline = wp
            .sketch()
            .polyline(ctx.kernel(), &notch_outline(&m.plate, &m.cutout), true)
            .step_with("plate outline", "plate")?;
        wp.extrude(ctx, &[outline], -m.plate.height, "plate")?;

        let n = top.normal();
        if let Some(radius) = m.cutout.corner_radius {
            let notch_end = EdgeSelector::parallel_to(n)
                .and(EdgeSelector::extreme(top.y_dir(), false).not())
                .and(EdgeSelector::extreme(top.y_dir(), true).not());
            wp.fillet(ctx, &notch_end, radius, "round notch", "cutout.corner_radius")?;
        }
        if let Some(radius) = m.plate.corner_radius {
            let sides = EdgeSelector::extreme(top.x_dir(), false).or(EdgeSelector::extreme(top.x_dir(), true));
            wp.fillet(ctx, &EdgeSelector::parallel_to(n).and(sides), radius, "round plate", "plate.corner_radius")?;
        }
        if let Some(size) = m.plate.chamfer {
            wp.chamfer(ctx, &EdgeSelector::extreme(n, true), size, "chamfer plate", "plate.chamfer")?;
        }

        let stem = stem(ctx, &top, &m)?;
        ctx.show_debug("stem", stem.clone());
        wp.add(ctx, stem, "stem")?;
        let clip = clip(ctx, &top, &m)?;
        ctx.show_debug("clip", clip.clone());
        wp.add(ctx, clip, "clip")?;

        let cutter = cutter(ctx, &top, &m)?;
        ctx.show_debug("cutout", cutter.clone());
        wp.cut(ctx, &cutter, "cutout")?;
        wp.finish()
    }

    fn name(&self) -> &str {
        NAME
    }

    fn display(&self) -> DisplayOptions {
        DisplayOptions::opaque(Color::named("lightgray"))
    }

    fn default_measures(&self) -> MeasureNode {
        plug_measures().with("debug", false)
    }
}

/// The plug's measures for the Type-M socket, without the debug switch, for
/// parts that carry a plug.
pub fn plug_measures() -> MeasureNode {
    MeasureNode::new()
        .with(
            "plate",
            MeasureNode::new()
                .with("width", 20.4)
                .with("depth", 22.4)
                .with("height", 2.0)
                .with("corner_radius", 2.5)
                .with("chamfer", 0.6),
        )
        .with(
            "stem",
            MeasureNode::new()
                .with("depth_pos", 1.2)
                .with("width", 13.85)
                .with("depth", 15.5)
                .with("height", 9.0)
                .with("corner_radius", 2.8),
        )
        .with(
            "cutout",
            MeasureNode::new()
                .with("width_1", 10.0)
                .with("width_2", 7.4)
                .with("depth", 9.7)
                .with("height", 3.75)
                .with("corner_radius", 2.8),
        )
        .with(
            "clip",
            MeasureNode::new()
                .with("width", 12.7)
                .with("thickness", 2.5)
                .with("chamfer", 0.8)
                .with("step_height", 5.1)
                .with("step_depth", 9.5)
                .with("lever_length", 15.0)
                .with("lever_angle", 45.0)
                .with("ridge_height", 2.2)
                .with("ridge_depth", 2.4),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use kernel_bridge::{KernelIntrospect, MockKernel};
    use part_engine::assemble;
    use part_types::KernelTolerance;

    #[test]
    fn test_plate_offset_puts_the_stem_at_the_origin() {
        let m = XMountPlug::derive(&XMountPlug.default_measures()).unwrap();
        assert_abs_diff_eq!(m.plate_offset[0], 11.2 - 1.2 - 7.75, epsilon = 1e-12);
        assert_abs_diff_eq!(m.plate_offset[1], 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_step_below_the_stem_is_inconsistent() {
        let mut m = XMountPlug.default_measures();
        if let Some(part_types::MeasureValue::Node(clip)) = m.get("clip").cloned() {
            m = m.with("clip", clip.with("step_height", 9.5));
        }
        let err = XMountPlug::derive(&m).unwrap_err();
        assert_eq!(err.path().to_string(), "clip.step_height");
    }

    #[test]
    fn test_lever_swings_down_and_back() {
        let clip = XMountPlug::derive(&XMountPlug.default_measures()).unwrap().clip;
        let pts = lever_outline([2.6, 9.5], &clip);
        assert_abs_diff_eq!(pts[0][0], 2.6, epsilon = 1e-12);
        let far = pts[3];
        let reach = 15.0 * 45.0_f64.to_radians().sin();
        assert_abs_diff_eq!(far[0], 2.6 + reach, epsilon = 1e-9);
        assert_abs_diff_eq!(far[1], 9.5 + reach, epsilon = 1e-9);
    }

    #[test]
    fn test_default_plug_builds_around_the_stem() {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let part = assemble(&mut ctx, &XMountPlug, &Frame::xy(), &XMountPlug.default_measures()).unwrap();
        let solid = &part.solids[0];
        let inside = |p| ctx.introspect().contains_point(solid, p).unwrap();
        assert!(inside([0.0, 0.0, 0.5]), "stem bottom center");
        assert!(inside([0.0, 7.75 - 1.0, 10.0]), "plate above the stem back");
        assert!(!inside([0.0, -8.5, 10.0]), "notch in the plate front");
        assert!(!inside([0.0, -5.0, 8.0]), "notch cut into the stem");
        assert!(inside([0.0, -5.0, 6.0]), "stem below the notch");
        let bbox = part.bounding_box(ctx.introspect()).unwrap();
        assert_abs_diff_eq!(bbox.max[2], 11.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bbox.max[0], 10.2, epsilon = 1e-6);
    }
}
