//! The active construction context of a part: a frame, construction-only
//! point markers, the solid being composed and the named tags.

use std::collections::HashMap;

use kernel_bridge::{KernelId, KernelSolidHandle, KernelWireHandle};
use modeling_ops::{
    cbore_hole, csk_face_hole, csk_hole, execute_chamfer, execute_extrude, execute_fillet, face_frame,
    Counterbore, Countersink, EdgeSelector, FaceSelector, Sketch,
};
use part_types::{Frame, MeasureNode};
use tracing::debug;

use crate::assembly::{assemble, PartBuilder};
use crate::composition::Composition;
use crate::context::BuildContext;
use crate::error::{BuildError, StepContext};
use crate::part::Part;

#[derive(Debug, Clone, PartialEq)]
struct Tagged {
    frame: Frame,
    markers: Vec<[f64; 2]>,
}

#[derive(Debug, Clone)]
pub struct Workplane {
    frame: Frame,
    /// Construction-only points in local coordinates of `frame`.
    markers: Vec<[f64; 2]>,
    composition: Composition,
    tags: HashMap<String, Tagged>,
}

impl Workplane {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            markers: Vec::new(),
            composition: Composition::new(),
            tags: HashMap::new(),
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn markers(&self) -> &[[f64; 2]] {
        &self.markers
    }

    /// Marker positions in world coordinates.
    pub fn marker_points(&self) -> Vec<[f64; 3]> {
        self.markers.iter().map(|p| self.frame.to_world(*p)).collect()
    }

    pub fn solid(&self) -> Option<&KernelSolidHandle> {
        self.composition.solid()
    }

    pub fn sketch(&self) -> Sketch {
        Sketch::on(self.frame)
    }

    // ── Frame stack ─────────────────────────────────────────────

    /// Replace the active frame. Markers are cleared.
    pub fn set_frame(&mut self, frame: Frame) -> &mut Self {
        self.frame = frame;
        self.markers.clear();
        self
    }

    pub fn transformed(&mut self, offset: [f64; 3], rotate_deg: [f64; 3]) -> &mut Self {
        let frame = self.frame.transformed(offset, rotate_deg);
        self.set_frame(frame)
    }

    pub fn offset(&mut self, distance: f64) -> &mut Self {
        let frame = self.frame.offset(distance);
        self.set_frame(frame)
    }

    pub fn shift(&mut self, dx: f64, dy: f64) -> &mut Self {
        let frame = self.frame.shifted(dx, dy);
        self.set_frame(frame)
    }

    pub fn invert(&mut self) -> &mut Self {
        let frame = self.frame.inverted();
        self.set_frame(frame)
    }

    /// Make the planar face of the current solid picked by `selector` the
    /// active frame, origin at the face centroid.
    pub fn face(&mut self, ctx: &mut BuildContext<'_>, selector: &FaceSelector, step: &str) -> Result<&mut Self, BuildError> {
        let solid = self.require_solid(step)?.clone();
        let tol = *ctx.tolerance();
        let faces = selector.select_required(ctx.introspect(), &solid, tol.selection).step(step)?;
        let frame = face_frame(ctx.kernel(), faces[0], tol.angular).step(step)?;
        Ok(self.set_frame(frame))
    }

    /// Set construction-only point markers, in local coordinates.
    pub fn push_points(&mut self, points: &[[f64; 2]]) -> &mut Self {
        self.markers = points.to_vec();
        self
    }

    // ── Tags ────────────────────────────────────────────────────

    /// Record the active frame and markers under `name`, overwriting any
    /// earlier tag of that name. The active context is unchanged.
    pub fn tag(&mut self, name: &str) -> &mut Self {
        debug!(name, origin = ?self.frame.origin(), "tag");
        self.tags.insert(
            name.to_string(),
            Tagged {
                frame: self.frame,
                markers: self.markers.clone(),
            },
        );
        self
    }

    /// Restore the frame and markers recorded under `name`.
    pub fn from_tagged(&mut self, name: &str) -> Result<&mut Self, BuildError> {
        let tagged = self.tagged(name)?.clone();
        self.frame = tagged.frame;
        self.markers = tagged.markers;
        Ok(self)
    }

    /// The frame recorded under `name`, leaving the active context alone.
    pub fn workplane_from_tagged(&self, name: &str) -> Result<Frame, BuildError> {
        Ok(self.tagged(name)?.frame)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    fn tagged(&self, name: &str) -> Result<&Tagged, BuildError> {
        self.tags.get(name).ok_or_else(|| BuildError::TagNotFound { name: name.to_string() })
    }

    // ── Material ────────────────────────────────────────────────

    fn require_solid(&self, step: &str) -> Result<&KernelSolidHandle, BuildError> {
        self.composition.solid().ok_or_else(|| BuildError::CompositionOrder {
            step: step.to_string(),
            reason: "the workplane has no solid yet".to_string(),
        })
    }

    pub fn add(&mut self, ctx: &mut BuildContext<'_>, solid: KernelSolidHandle, step: &str) -> Result<&mut Self, BuildError> {
        self.composition.union(ctx, solid, step)?;
        Ok(self)
    }

    pub fn cut(&mut self, ctx: &mut BuildContext<'_>, tool: &KernelSolidHandle, step: &str) -> Result<&mut Self, BuildError> {
        self.composition.cut(ctx, tool, step)?;
        Ok(self)
    }

    /// Extrude closed wires along the active normal and add the result.
    pub fn extrude(
        &mut self,
        ctx: &mut BuildContext<'_>,
        wires: &[KernelWireHandle],
        depth: f64,
        step: &str,
    ) -> Result<&mut Self, BuildError> {
        let solid = execute_extrude(ctx.kernel(), wires, self.frame.normal(), depth).step(step)?;
        self.add(ctx, solid, step)
    }

    pub fn fillet(
        &mut self,
        ctx: &mut BuildContext<'_>,
        edges: &EdgeSelector,
        radius: f64,
        step: &str,
        measure: &str,
    ) -> Result<&mut Self, BuildError> {
        let tol = ctx.tolerance().selection;
        self.composition.modify(ctx, step, |ctx, solid| {
            let ids = edges.select_required(ctx.introspect(), solid, tol).step_with(step, measure)?;
            execute_fillet(ctx.kernel(), solid, &ids, radius).step_with(step, measure)
        })?;
        Ok(self)
    }

    pub fn chamfer(
        &mut self,
        ctx: &mut BuildContext<'_>,
        edges: &EdgeSelector,
        distance: f64,
        step: &str,
        measure: &str,
    ) -> Result<&mut Self, BuildError> {
        let tol = ctx.tolerance().selection;
        self.composition.modify(ctx, step, |ctx, solid| {
            let ids = edges.select_required(ctx.introspect(), solid, tol).step_with(step, measure)?;
            execute_chamfer(ctx.kernel(), solid, &ids, distance).step_with(step, measure)
        })?;
        Ok(self)
    }

    /// Drill counterbored holes at the markers, against the active normal.
    pub fn cbore_holes(
        &mut self,
        ctx: &mut BuildContext<'_>,
        spec: &Counterbore,
        step: &str,
        measure: &str,
    ) -> Result<&mut Self, BuildError> {
        let points = self.markers_or_origin();
        let frame = self.frame;
        let slack = ctx.tolerance().overlap_slack;
        self.composition.modify(ctx, step, |ctx, solid| {
            cbore_hole(ctx.kernel(), solid, &frame, &points, spec, slack).step_with(step, measure)
        })?;
        self.composition.note_cut(step);
        Ok(self)
    }

    /// Drill countersunk holes at the markers, against the active normal.
    pub fn csk_holes(
        &mut self,
        ctx: &mut BuildContext<'_>,
        spec: &Countersink,
        step: &str,
        measure: &str,
    ) -> Result<&mut Self, BuildError> {
        let points = self.markers_or_origin();
        let frame = self.frame;
        let slack = ctx.tolerance().overlap_slack;
        self.composition.modify(ctx, step, |ctx, solid| {
            csk_hole(ctx.kernel(), solid, &frame, &points, spec, slack).step_with(step, measure)
        })?;
        self.composition.note_cut(step);
        Ok(self)
    }

    /// One countersunk hole in each face picked by a selector, at the offset
    /// paired with that selector in the face frame. All faces are picked
    /// from the solid as it stands before the first hole.
    pub fn csk_face_holes(
        &mut self,
        ctx: &mut BuildContext<'_>,
        faces: &[(FaceSelector, [f64; 2])],
        spec: &Countersink,
        step: &str,
        measure: &str,
    ) -> Result<&mut Self, BuildError> {
        let tol = *ctx.tolerance();
        self.composition.modify(ctx, step, |ctx, solid| {
            let mut holes: Vec<(KernelId, [f64; 2])> = Vec::new();
            for (selector, offset) in faces {
                let ids = selector.select_required(ctx.introspect(), solid, tol.selection).step_with(step, measure)?;
                holes.extend(ids.into_iter().map(|id| (id, *offset)));
            }
            csk_face_hole(ctx.kernel(), solid, &holes, spec, tol.overlap_slack, tol.angular).step_with(step, measure)
        })?;
        self.composition.note_cut(step);
        Ok(self)
    }

    fn markers_or_origin(&self) -> Vec<[f64; 2]> {
        if self.markers.is_empty() {
            vec![[0.0, 0.0]]
        } else {
            self.markers.clone()
        }
    }

    // ── Part factory ────────────────────────────────────────────

    /// Build `builder` with `measures` in the active frame and splice its
    /// solids onto this workplane's solid.
    pub fn part<B: PartBuilder + ?Sized>(
        &mut self,
        ctx: &mut BuildContext<'_>,
        builder: &B,
        measures: &MeasureNode,
    ) -> Result<Part, BuildError> {
        let part = assemble(ctx, builder, &self.frame, measures).map_err(|e| BuildError::SubPart {
            part: builder.name().to_string(),
            source: Box::new(e),
        })?;
        let step = format!("attach {}", part.name);
        for solid in &part.solids {
            self.composition.union(ctx, solid.clone(), &step)?;
        }
        Ok(part)
    }

    /// The composed solid; fails if nothing was ever added.
    pub fn finish(self) -> Result<KernelSolidHandle, BuildError> {
        self.composition.finish()
    }
}

impl Default for Workplane {
    fn default() -> Self {
        Self::new(Frame::xy())
    }
}
