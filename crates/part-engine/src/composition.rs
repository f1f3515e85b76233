//! Material bookkeeping for one part: all unions first, then cuts.

use kernel_bridge::KernelSolidHandle;
use modeling_ops::{execute_boolean, BooleanKind};
use tracing::debug;

use crate::context::BuildContext;
use crate::error::{BuildError, StepContext};

/// The solid a part is being composed into.
///
/// Unions add material and cuts remove it. Once the first cut has been
/// applied no more material may be added: a union after a cut would have to
/// re-cut everything added, which callers never intend.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    solid: Option<KernelSolidHandle>,
    first_cut: Option<String>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_solid(solid: KernelSolidHandle) -> Self {
        Self {
            solid: Some(solid),
            first_cut: None,
        }
    }

    pub fn solid(&self) -> Option<&KernelSolidHandle> {
        self.solid.as_ref()
    }

    /// Whether a cut has been applied yet.
    pub fn is_cutting(&self) -> bool {
        self.first_cut.is_some()
    }

    pub fn union(&mut self, ctx: &mut BuildContext<'_>, solid: KernelSolidHandle, step: &str) -> Result<(), BuildError> {
        if let Some(cut) = &self.first_cut {
            return Err(BuildError::CompositionOrder {
                step: step.to_string(),
                reason: format!("material added after the cut `{cut}`"),
            });
        }
        let next = match self.solid.take() {
            None => solid,
            Some(base) => execute_boolean(ctx.kernel(), &base, &solid, BooleanKind::Union).step(step)?,
        };
        debug!(step, "union");
        self.solid = Some(next);
        Ok(())
    }

    pub fn cut(&mut self, ctx: &mut BuildContext<'_>, tool: &KernelSolidHandle, step: &str) -> Result<(), BuildError> {
        let Some(base) = self.solid.as_ref() else {
            return Err(BuildError::CompositionOrder {
                step: step.to_string(),
                reason: "nothing to cut from".to_string(),
            });
        };
        let next = execute_boolean(ctx.kernel(), base, tool, BooleanKind::Subtract).step(step)?;
        debug!(step, "cut");
        self.solid = Some(next);
        self.first_cut.get_or_insert_with(|| step.to_string());
        Ok(())
    }

    /// Replace the current solid by a modified version of itself (fillet,
    /// chamfer, holes). Allowed in either phase.
    pub fn modify(
        &mut self,
        ctx: &mut BuildContext<'_>,
        step: &str,
        op: impl FnOnce(&mut BuildContext<'_>, &KernelSolidHandle) -> Result<KernelSolidHandle, BuildError>,
    ) -> Result<(), BuildError> {
        let Some(base) = self.solid.as_ref() else {
            return Err(BuildError::CompositionOrder {
                step: step.to_string(),
                reason: "no material to modify".to_string(),
            });
        };
        let next = op(ctx, base)?;
        self.solid = Some(next);
        Ok(())
    }

    /// Mark that material removal has begun without a boolean cut, e.g. after
    /// drilling holes.
    pub(crate) fn note_cut(&mut self, step: &str) {
        self.first_cut.get_or_insert_with(|| step.to_string());
    }

    pub fn finish(self) -> Result<KernelSolidHandle, BuildError> {
        self.solid.ok_or_else(|| BuildError::CompositionOrder {
            step: "finish".to_string(),
            reason: "no material was added".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_bridge::{KernelIntrospect, MockKernel};
    use modeling_ops::{execute_extrude, Sketch};
    use part_types::{Frame, KernelTolerance};

    fn block(ctx: &mut BuildContext<'_>, x: f64, w: f64) -> KernelSolidHandle {
        let sketch = Sketch::on(Frame::xy().shifted(x, 0.0));
        let wire = sketch.rect(ctx.kernel(), w, 1.0, (false, false)).unwrap();
        execute_extrude(ctx.kernel(), &[wire], [0.0, 0.0, 1.0], 1.0).unwrap()
    }

    #[test]
    fn test_union_then_cut() {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let mut comp = Composition::new();
        let a = block(&mut ctx, 0.0, 2.0);
        let b = block(&mut ctx, 2.0, 2.0);
        let c = block(&mut ctx, 1.0, 1.0);
        comp.union(&mut ctx, a, "left").unwrap();
        comp.union(&mut ctx, b, "right").unwrap();
        comp.cut(&mut ctx, &c, "notch").unwrap();
        let solid = comp.finish().unwrap();
        let volume = ctx.introspect().volume(&solid).unwrap();
        assert!((volume - 3.0).abs() < 0.05, "{volume}");
    }

    #[test]
    fn test_union_after_cut_is_rejected() {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let a = block(&mut ctx, 0.0, 2.0);
        let b = block(&mut ctx, 0.5, 0.5);
        let c = block(&mut ctx, 3.0, 1.0);
        let mut comp = Composition::from_solid(a);
        comp.cut(&mut ctx, &b, "slot").unwrap();
        let err = comp.union(&mut ctx, c, "ear").unwrap_err();
        assert!(matches!(err, BuildError::CompositionOrder { ref step, .. } if step == "ear"));
        assert!(err.to_string().contains("slot"));
    }

    #[test]
    fn test_cut_without_material() {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let a = block(&mut ctx, 0.0, 2.0);
        let mut comp = Composition::new();
        assert!(matches!(
            comp.cut(&mut ctx, &a, "hole"),
            Err(BuildError::CompositionOrder { .. })
        ));
        assert!(Composition::new().finish().is_err());
    }
}
