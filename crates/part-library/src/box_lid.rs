//! Fixation block for a storage box lid: a rounded bar with two
//! counterbored screw holes drilled from the top.

use kernel_bridge::KernelSolidHandle;
use modeling_ops::{Counterbore, EdgeSelector};
use part_engine::{BuildContext, BuildError, MeasureContext, PartBuilder, StepContext, Workplane};
use part_types::{Color, DisplayOptions, Frame, MeasureNode, MeasureView};
use tracing::debug;

pub const NAME: &str = "BoxLidFixation";

#[derive(Debug, Clone, Copy, Default)]
pub struct BoxLidFixation;

/// Counterbore at `position` along the bar, read from a `hole_*` group.
fn hole(view: &MeasureView<'_>) -> Result<(f64, Counterbore), BuildError> {
    let position = view.number("position").for_part(NAME)?;
    let spec = Counterbore {
        diameter: view.positive("diameter").for_part(NAME)?,
        cbore_diameter: view.positive("cbore_diameter").for_part(NAME)?,
        cbore_depth: view.positive("cbore_depth").for_part(NAME)?,
        depth: view.optional_length("depth").for_part(NAME)?,
    };
    Ok((position, spec))
}

impl PartBuilder for BoxLidFixation {
    fn build(
        &self,
        ctx: &mut BuildContext<'_>,
        frame: &Frame,
        measures: &MeasureNode,
    ) -> Result<KernelSolidHandle, BuildError> {
        let v = measures.view();
        let block = v.child("block").for_part(NAME)?;
        let width = block.positive("width").for_part(NAME)?;
        let depth = block.positive("depth").for_part(NAME)?;
        let height = block.positive("height").for_part(NAME)?;
        let radius = block.optional_length("radius").for_part(NAME)?;

        let mut wp = Workplane::new(*frame);
        // Starts at x = 0 and is centered across.
        let outline = wp
            .sketch()
            .rect(ctx.kernel(), width, depth, (false, true))
            .step("block outline")?;
        wp.extrude(ctx, &[outline], height, "block")?;
        if let Some(r) = radius.filter(|r| *r > 0.0) {
            let path = block.path_of("radius").to_string();
            wp.fillet(ctx, &EdgeSelector::parallel_to(frame.normal()), r, "round corners", &path)?;
        }
        if let Some(solid) = wp.solid() {
            ctx.show_debug("block", solid.clone());
        }

        wp.offset(height).tag("top");
        for key in ["hole_1", "hole_2"] {
            let Some(group) = v.optional_child(key).for_part(NAME)? else {
                continue;
            };
            let (position, spec) = hole(&group)?;
            debug!(hole = key, position, "counterbore");
            wp.from_tagged("top")?.push_points(&[[position, 0.0]]);
            let path = group.path().to_string();
            wp.cbore_holes(ctx, &spec, key, &path)?;
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
                .with("diameter", 3.3)
                .with("cbore_diameter", 5.8)
                .with("cbore_depth", 4.0)
        };
        MeasureNode::new()
            .with("debug", false)
            .with(
                "block",
                MeasureNode::new()
                    .with("width", 55.0)
                    .with("depth", 8.0)
                    .with("height", 5.5)
                    .with("radius", 3.99),
            )
            .with("hole_1", hole(15.0))
            .with("hole_2", hole(40.0))
    }
}
