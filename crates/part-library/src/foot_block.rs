//! Foot block / spacer block: a loft from a floor rectangle to a possibly
//! sloped and wider top rectangle.
//!
//! The block can be rounded at its front and back corners and along its
//! lower outline, drilled from below for countersunk wood screws, recessed
//! from the top to fit around another foot, and delivered as front or back
//! half for printers too small for the whole block.

use kernel_bridge::{KernelSolidHandle, KernelWireHandle};
use modeling_ops::{
    execute_boolean, execute_extrude, execute_fillet, execute_loft, BooleanKind, Countersink, EdgeSelector, OpError,
    Sketch, SplitKeep,
};
use part_engine::{
    derive_for, split_pieces, BuildContext, BuildError, DeriveMeasures, MeasureContext, PartBuilder, StepContext,
    Workplane,
};
use part_types::{Color, DisplayOptions, Frame, MeasureError, MeasureNode, MeasureValue, MeasureView};
use tracing::debug;

pub const NAME: &str = "FootBlock";

#[derive(Debug, Clone, Copy, Default)]
pub struct FootBlock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub lower_width: f64,
    pub upper_width: f64,
    pub lower_depth: f64,
    /// Measured along the sloped top, not along the floor.
    pub upper_depth: f64,
    pub front_height: f64,
    pub back_height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrewHole {
    /// Measure group the hole came from (`hole_1`, `hole_2`).
    pub key: String,
    /// Distance from the front of the block.
    pub position: f64,
    pub spec: Countersink,
}

/// A section in the middle of the recess that is left shallower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backfill {
    pub height: f64,
    pub depth: f64,
    pub edge_radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recess {
    pub upper_width: f64,
    pub lower_width: f64,
    pub upper_depth: f64,
    pub lower_depth: f64,
    pub height: f64,
    pub corner_radius: Option<f64>,
    pub lower_edge_radius: Option<f64>,
    pub backfill: Option<Backfill>,
}

/// Which pieces of the block to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pieces {
    All,
    FrontHalf,
    BackHalf,
}

impl Pieces {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "all" => Some(Pieces::All),
            "front half" => Some(Pieces::FrontHalf),
            "back half" => Some(Pieces::BackHalf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FootBlockMeasures {
    pub block: Block,
    /// Tilt of the top about the x axis, in degrees; positive when the back
    /// is higher than the front.
    pub slope_deg: f64,
    pub corner_radius_front: f64,
    pub corner_radius_back: f64,
    pub lower_edge_radius: f64,
    pub holes: Vec<ScrewHole>,
    pub recess: Option<Recess>,
    pub pieces: Pieces,
}

impl FootBlockMeasures {
    /// Floor offset of each rectangle so that the shorter one is centered
    /// front to back under or over the longer one.
    fn lower_offset(&self) -> f64 {
        ((self.block.upper_depth - self.block.lower_depth) / 2.0).max(0.0)
    }

    fn upper_offset(&self) -> f64 {
        ((self.block.lower_depth - self.block.upper_depth) / 2.0).max(0.0)
    }

    /// Position of the plane separating the front from the back half.
    pub fn split_position(&self) -> f64 {
        self.block.lower_depth.max(self.block.upper_depth) / 2.0
    }
}

fn read_recess(r: &MeasureView<'_>, block: &Block) -> Result<Recess, MeasureError> {
    let recess = Recess {
        upper_width: r.positive("upper_width")?,
        lower_width: r.positive("lower_width")?,
        upper_depth: r.positive("upper_depth")?,
        lower_depth: r.positive("lower_depth")?,
        height: r.positive("height")?,
        corner_radius: r.optional_length("corner_radius")?.filter(|v| *v > 0.0),
        lower_edge_radius: r.optional_length("lower_edge_radius")?.filter(|v| *v > 0.0),
        backfill: match r.optional_length("backfill_section_height")? {
            Some(height) if height > 0.0 => Some(Backfill {
                height,
                depth: r.positive("backfill_section_depth")?,
                edge_radius: r.optional_length("backfill_edge_radius")?.filter(|v| *v > 0.0),
            }),
            _ => None,
        },
    };
    if recess.height >= block.front_height.min(block.back_height) {
        return Err(r.inconsistent("height", "the recess would cut through the block"));
    }
    if recess.upper_width >= block.upper_width || recess.upper_depth >= block.upper_depth {
        return Err(r.inconsistent("upper_width", "the recess does not fit inside the top of the block"));
    }
    if let Some(b) = &recess.backfill {
        if b.height >= recess.height {
            return Err(r.inconsistent("backfill_section_height", "the backfill would fill the whole recess"));
        }
    }
    Ok(recess)
}

impl DeriveMeasures for FootBlock {
    type Derived = FootBlockMeasures;

    fn derive(measures: &MeasureNode) -> Result<FootBlockMeasures, MeasureError> {
        let v = measures.view();
        let b = v.child("block")?;
        let block = Block {
            lower_width: b.positive("lower_width")?,
            upper_width: b.positive("upper_width")?,
            lower_depth: b.positive("lower_depth")?,
            upper_depth: b.positive("upper_depth")?,
            front_height: b.positive("front_height")?,
            back_height: b.positive("back_height")?,
        };

        // The upper depth runs along the slope, hence asin and not atan.
        let rise = (block.back_height - block.front_height) / block.upper_depth;
        if rise.abs() >= 1.0 {
            return Err(b.inconsistent(
                "back_height",
                format!(
                    "height difference {} is not less than the upper depth {}",
                    block.back_height - block.front_height,
                    block.upper_depth
                ),
            ));
        }
        let slope_deg = rise.asin().to_degrees();

        let default_radius = (block.lower_width.min(block.upper_width) - 0.5) / 2.0;
        let corner_radius_front = b.optional_length("corner_radius_front")?.unwrap_or(default_radius);
        let corner_radius_back = b.optional_length("corner_radius_back")?.unwrap_or(default_radius);
        let lower_edge_radius = b.optional_length("lower_edge_radius")?.unwrap_or(0.0);

        let mut holes = Vec::new();
        for key in ["hole_1", "hole_2"] {
            let Some(h) = v.optional_child(key)? else {
                continue;
            };
            holes.push(ScrewHole {
                key: key.to_string(),
                position: h.number("position")?,
                spec: Countersink {
                    diameter: h.positive("hole_size")?,
                    csk_diameter: h.positive("head_size")?,
                    csk_angle: h.angle("head_angle")?,
                    depth: None,
                },
            });
        }

        let recess = v.optional_child("recess")?.map(|r| read_recess(&r, &block)).transpose()?;

        let pieces = match v.optional_text("parts")? {
            None => Pieces::All,
            Some(label) => Pieces::parse(label).ok_or_else(|| {
                v.out_of_range("parts", format!("`{label}` is not one of \"all\", \"front half\", \"back half\""))
            })?,
        };

        Ok(FootBlockMeasures {
            block,
            slope_deg,
            corner_radius_front,
            corner_radius_back,
            lower_edge_radius,
            holes,
            recess,
            pieces,
        })
    }
}

/// The (near) vertical edges of a loft whose caps are parallel to the
/// frame's x and y axes.
fn wall_edges(frame: &Frame) -> EdgeSelector {
    EdgeSelector::parallel_to(frame.x_dir())
        .not()
        .and(EdgeSelector::parallel_to(frame.y_dir()).not())
}

fn rect_on(
    ctx: &mut BuildContext<'_>,
    frame: &Frame,
    width: f64,
    depth: f64,
    step: &str,
) -> Result<KernelWireHandle, BuildError> {
    Sketch::on(*frame).rect(ctx.kernel(), width, depth, (true, false)).step(step)
}

/// Cutter for the recess: a loft hanging from the top face, rounded at its
/// corners and floor, minus the backfill section.
fn recess_cutter(
    ctx: &mut BuildContext<'_>,
    top: &Frame,
    m: &FootBlockMeasures,
    r: &Recess,
) -> Result<KernelSolidHandle, BuildError> {
    let tol = *ctx.tolerance();
    let slack = tol.overlap_slack;
    let center = m.upper_offset() + m.block.upper_depth / 2.0;
    let floor = top.offset(-r.height).shifted(0.0, center - r.lower_depth / 2.0);
    let mouth = top.offset(slack).shifted(0.0, center - r.upper_depth / 2.0);
    let lower = rect_on(ctx, &floor, r.lower_width, r.lower_depth, "recess outline")?;
    let upper = rect_on(ctx, &mouth, r.upper_width, r.upper_depth, "recess outline")?;
    let mut cutter = execute_loft(ctx.kernel(), &lower, &upper).step_with("recess", "recess")?;

    if let Some(radius) = r.corner_radius {
        let ids = wall_edges(top)
            .select_required(ctx.introspect(), &cutter, tol.selection)
            .step("round recess corners")?;
        cutter = execute_fillet(ctx.kernel(), &cutter, &ids, radius)
            .step_with("round recess corners", "recess.corner_radius")?;
    }
    if let Some(radius) = r.lower_edge_radius {
        let ids = EdgeSelector::extreme(top.normal(), false)
            .select_required(ctx.introspect(), &cutter, tol.selection)
            .step("round recess floor")?;
        cutter = execute_fillet(ctx.kernel(), &cutter, &ids, radius)
            .step_with("round recess floor", "recess.lower_edge_radius")?;
    }

    if let Some(backfill) = &r.backfill {
        let width = m.block.upper_width.max(m.block.lower_width) + 2.0 * slack;
        let origin = top.to_world3([-width / 2.0, center, -r.height - slack]);
        let section = Frame::new(origin, top.y_dir(), top.x_dir())
            .map_err(|e| OpError::InvalidParameter { reason: e.to_string() })
            .step("backfill")?;
        let outline = Sketch::on(section)
            .rect(ctx.kernel(), backfill.depth, backfill.height + slack, (true, false))
            .step_with("backfill", "recess.backfill_section_depth")?;
        let mut fill = execute_extrude(ctx.kernel(), &[outline], top.x_dir(), width).step("backfill")?;
        if let Some(radius) = backfill.edge_radius {
            let ids = EdgeSelector::parallel_to(top.x_dir())
                .within(EdgeSelector::extreme(top.normal(), true))
                .select_required(ctx.introspect(), &fill, tol.selection)
                .step("round backfill edges")?;
            fill = execute_fillet(ctx.kernel(), &fill, &ids, radius)
                .step_with("round backfill edges", "recess.backfill_edge_radius")?;
        }
        ctx.show_debug("backfill", fill.clone());
        cutter = execute_boolean(ctx.kernel(), &cutter, &fill, BooleanKind::Subtract).step("backfill")?;
    }
    Ok(cutter)
}

impl PartBuilder for FootBlock {
    fn build(
        &self,
        ctx: &mut BuildContext<'_>,
        frame: &Frame,
        measures: &MeasureNode,
    ) -> Result<KernelSolidHandle, BuildError> {
        let m = derive_for::<FootBlock>(NAME, measures)?;
        let b = m.block;
        debug!(slope = m.slope_deg, front = m.corner_radius_front, back = m.corner_radius_back, "foot block");

        // The floor rectangle always rests flat; the top one carries the slope.
        let mut wp = Workplane::new(*frame);
        let floor = frame.shifted(0.0, m.lower_offset());
        let lower = rect_on(ctx, &floor, b.lower_width, b.lower_depth, "floor outline")?;
        wp.transformed([0.0, 0.0, b.front_height], [m.slope_deg, 0.0, 0.0]).tag("top");
        let top = *wp.frame();
        let upper = rect_on(ctx, &top.shifted(0.0, m.upper_offset()), b.upper_width, b.upper_depth, "top outline")?;
        let body = execute_loft(ctx.kernel(), &lower, &upper).step_with("loft", "block")?;
        wp.add(ctx, body, "loft")?;

        let walls = wall_edges(frame);
        let front = walls.clone().within(EdgeSelector::extreme(frame.y_dir(), false));
        let back = walls.within(EdgeSelector::extreme(frame.y_dir(), true));
        wp.fillet(ctx, &front, m.corner_radius_front, "round front corners", "block.corner_radius_front")?;
        wp.fillet(ctx, &back, m.corner_radius_back, "round back corners", "block.corner_radius_back")?;
        if m.lower_edge_radius > 0.0 {
            wp.fillet(
                ctx,
                &EdgeSelector::extreme(frame.normal(), false),
                m.lower_edge_radius,
                "round lower edges",
                "block.lower_edge_radius",
            )?;
        }
        if let Some(solid) = wp.solid() {
            ctx.show_debug("block", solid.clone());
        }

        // Drilled upwards from the floor, so the plane is flipped and the
        // hole positions change sign.
        for hole in &m.holes {
            wp.set_frame(frame.inverted()).push_points(&[[0.0, -hole.position]]);
            wp.csk_holes(ctx, &hole.spec, &format!("drill {}", hole.key), hole.key.as_str())?;
        }

        if let Some(recess) = &m.recess {
            let top = wp.workplane_from_tagged("top")?;
            let cutter = recess_cutter(ctx, &top, &m, recess)?;
            ctx.show_debug("recess", cutter.clone());
            wp.cut(ctx, &cutter, "recess")?;
        }
        wp.finish()
    }

    fn name(&self) -> &str {
        NAME
    }

    fn display(&self) -> DisplayOptions {
        DisplayOptions::opaque(Color::named("lightgray"))
    }

    fn default_measures(&self) -> MeasureNode {
        let hole = |position: f64| {
            MeasureNode::new()
                .with("position", position)
                .with("hole_size", 5.4)
                .with("head_size", 10.0)
                .with("head_angle", 90.0)
        };
        MeasureNode::new()
            .with("debug", false)
            .with(
                "block",
                MeasureNode::new()
                    .with("lower_width", 15.0)
                    .with("upper_width", 19.0)
                    .with("lower_depth", 94.0)
                    .with("upper_depth", 94.0)
                    .with("front_height", 16.6)
                    .with("back_height", 19.1)
                    .with("lower_edge_radius", 3.0),
            )
            .with("hole_1", hole(23.5))
            .with("hole_2", hole(70.5))
            .with("recess", MeasureValue::Absent)
            .with("parts", "all")
    }

    fn separate(
        &self,
        ctx: &mut BuildContext<'_>,
        solid: KernelSolidHandle,
        measures: &MeasureNode,
    ) -> Result<Vec<KernelSolidHandle>, BuildError> {
        let m = derive_for::<FootBlock>(NAME, measures)?;
        let plane = Frame::zx().offset(m.split_position());
        match m.pieces {
            Pieces::All => Ok(vec![solid]),
            Pieces::FrontHalf => split_pieces(ctx, &solid, &plane, SplitKeep::Below, "split front half"),
            Pieces::BackHalf => split_pieces(ctx, &solid, &plane, SplitKeep::Above, "split back half"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use kernel_bridge::{KernelIntrospect, MockKernel};
    use part_engine::assemble;
    use part_types::KernelTolerance;

    fn block(front: f64, back: f64) -> MeasureNode {
        MeasureNode::new()
            .with("lower_width", 15.0)
            .with("upper_width", 19.0)
            .with("lower_depth", 94.0)
            .with("upper_depth", 94.0)
            .with("front_height", front)
            .with("back_height", back)
    }

    #[test]
    fn test_derived_slope_uses_the_sloped_depth() {
        let m = FootBlock::derive(&FootBlock.default_measures()).unwrap();
        assert_abs_diff_eq!(m.slope_deg, (2.5_f64 / 94.0).asin().to_degrees(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.corner_radius_front, 7.25, epsilon = 1e-12);
        assert_abs_diff_eq!(m.corner_radius_back, 7.25, epsilon = 1e-12);
        assert_eq!(m.holes.len(), 2);
        assert_eq!(m.holes[1].key, "hole_2");
        assert_eq!(m.pieces, Pieces::All);
        assert!(m.recess.is_none());
    }

    #[test]
    fn test_impossible_slope_is_inconsistent() {
        let measures = MeasureNode::new().with("block", block(1.0, 200.0));
        let err = FootBlock::derive(&measures).unwrap_err();
        assert!(matches!(err, MeasureError::Inconsistent { .. }));
        assert_eq!(err.path().to_string(), "block.back_height");
    }

    #[test]
    fn test_unknown_pieces_label() {
        let measures = MeasureNode::new().with("block", block(10.0, 10.0)).with("parts", "left half");
        let err = FootBlock::derive(&measures).unwrap_err();
        assert_eq!(err.path().to_string(), "parts");
    }

    #[test]
    fn test_holes_go_through_from_below() {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let part = assemble(&mut ctx, &FootBlock, &Frame::xy(), &FootBlock.default_measures()).unwrap();
        let solid = &part.solids[0];
        let inside = |p| ctx.introspect().contains_point(solid, p).unwrap();
        assert!(!inside([0.0, 23.5, 10.0]), "bore");
        assert!(inside([0.0, 27.5, 10.0]), "material beside the bore");
        assert!(!inside([0.0, 27.5, 0.5]), "countersink opens at the floor");
        assert!(!inside([0.0, 70.5, 15.0]));
    }

    #[test]
    fn test_recess_is_centered_on_a_shorter_top() {
        let measures = FootBlock
            .default_measures()
            .with(
                "block",
                block(12.0, 12.0).with("lower_depth", 100.0).with("upper_depth", 80.0),
            )
            .with("hole_1", MeasureValue::Absent)
            .with("hole_2", MeasureValue::Absent)
            .with(
                "recess",
                MeasureNode::new()
                    .with("upper_width", 10.0)
                    .with("lower_width", 10.0)
                    .with("upper_depth", 60.0)
                    .with("lower_depth", 60.0)
                    .with("height", 5.0),
            );
        let m = FootBlock::derive(&measures).unwrap();
        assert_abs_diff_eq!(m.upper_offset(), 10.0, epsilon = 1e-12);

        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let part = assemble(&mut ctx, &FootBlock, &Frame::xy(), &measures).unwrap();
        let solid = &part.solids[0];
        let inside = |p| ctx.introspect().contains_point(solid, p).unwrap();
        // the top runs from y = 10 to 90, so the recess spans y = 20 to 80
        assert!(inside([0.0, 15.0, 11.0]), "front wall of the recess");
        assert!(!inside([0.0, 22.0, 11.0]));
        assert!(!inside([0.0, 75.0, 11.0]));
        assert!(inside([0.0, 85.0, 11.0]), "back wall of the recess");
        assert!(inside([0.0, 50.0, 6.0]), "below the recess floor");
    }

    #[test]
    fn test_front_half_stops_at_the_middle() {
        let measures = FootBlock
            .default_measures()
            .with("block", block(12.0, 12.0))
            .with("parts", "front half");
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let part = assemble(&mut ctx, &FootBlock, &Frame::xy(), &measures).unwrap();
        assert_eq!(part.piece_count(), 1);
        let bbox = part.bounding_box(ctx.introspect()).unwrap();
        assert!(bbox.max[1] <= 47.0 + 1e-6, "max y {}", bbox.max[1]);
        assert!(bbox.min[1] >= -1e-6);
    }
}
