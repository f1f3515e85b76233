//! Generic part assembly: build in a convenient internal frame, then move
//! the result into the caller's frame.

use kernel_bridge::KernelSolidHandle;
use modeling_ops::{execute_split, SplitKeep};
use part_types::{DisplayOptions, Frame, MeasureNode};
use tracing::{info, instrument};

use crate::context::BuildContext;
use crate::error::{BuildError, MeasureContext, StepContext};
use crate::part::Part;

/// A part type: anything that can build a solid from a frame and measures.
pub trait PartBuilder {
    /// Build the composed solid with `frame` as the internal build frame.
    fn build(&self, ctx: &mut BuildContext<'_>, frame: &Frame, measures: &MeasureNode)
        -> Result<KernelSolidHandle, BuildError>;

    fn name(&self) -> &str;

    fn display(&self) -> DisplayOptions {
        DisplayOptions::default()
    }

    /// The frame the part is most easily built in.
    fn build_frame(&self) -> Frame {
        Frame::xy()
    }

    /// Measures used when no preset is given.
    fn default_measures(&self) -> MeasureNode {
        MeasureNode::new()
    }

    /// Split the composed solid into delivered pieces, in the build frame.
    fn separate(
        &self,
        _ctx: &mut BuildContext<'_>,
        solid: KernelSolidHandle,
        _measures: &MeasureNode,
    ) -> Result<Vec<KernelSolidHandle>, BuildError> {
        Ok(vec![solid])
    }
}

/// Build `builder` and reposition it into `frame`.
///
/// At the outermost level the `debug` flag of `measures` switches the debug
/// channel for the whole build, sub-parts included.
#[instrument(skip_all, fields(part = builder.name()))]
pub fn assemble<B: PartBuilder + ?Sized>(
    ctx: &mut BuildContext<'_>,
    builder: &B,
    frame: &Frame,
    measures: &MeasureNode,
) -> Result<Part, BuildError> {
    let name = builder.name();
    if ctx.depth() == 0 {
        let debug = measures.view().flag_or("debug", false).for_part(name)?;
        ctx.set_debug(debug);
    }
    ctx.enter(name);
    let result = build_and_place(ctx, builder, frame, measures);
    ctx.leave();
    let part = result?;
    info!(pieces = part.solids.len(), "part assembled");
    Ok(part)
}

fn build_and_place<B: PartBuilder + ?Sized>(
    ctx: &mut BuildContext<'_>,
    builder: &B,
    frame: &Frame,
    measures: &MeasureNode,
) -> Result<Part, BuildError> {
    let internal = builder.build_frame();
    let solid = builder.build(ctx, &internal, measures)?;
    let pieces = builder.separate(ctx, solid, measures)?;

    let motion = internal.motion_to(frame);
    let tol = ctx.tolerance().coincidence;
    let solids = if motion.is_identity(tol) {
        pieces
    } else {
        pieces
            .iter()
            .map(|s| ctx.kernel().transform_solid(s, &motion).step("reposition"))
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(Part::new(builder.name(), solids, builder.display()))
}

/// Split helper for [`PartBuilder::separate`]: keep the pieces named by
/// `keep` on either side of `plane`.
pub fn split_pieces(
    ctx: &mut BuildContext<'_>,
    solid: &KernelSolidHandle,
    plane: &Frame,
    keep: SplitKeep,
    step: &str,
) -> Result<Vec<KernelSolidHandle>, BuildError> {
    execute_split(ctx.kernel(), solid, plane, keep).step(step)
}
