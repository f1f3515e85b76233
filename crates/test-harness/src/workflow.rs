//! PartRun: fluent API for building a part and checking it in tests.
//!
//! Goes through the real assembly path (`part_engine::assemble`), so what a
//! test checks is what the CLI would export.

use kernel_bridge::{BoundingBox, KernelIntrospect, KernelSolidHandle, MockKernel, TruckKernel};
use measure_format::{export_stl, StlFormat};
use modeling_ops::{FaceSelector, KernelBundle};
use part_engine::{assemble, BuildContext, BuildError, Part, PartBuilder, RecordingSink};
use part_types::{Frame, KernelTolerance, MeasureNode};
use tracing::debug;

use crate::helpers::{face_area, HarnessError};
use crate::oracle::{self, OracleVerdict};
use crate::report::PartReport;

/// Builds parts on one kernel and collects oracle verdicts about them.
pub struct PartRun<K: KernelBundle> {
    kernel: K,
    tolerance: KernelTolerance,
    frame: Frame,
    part: Option<Part>,
    shown: Vec<String>,
    verdicts: Vec<OracleVerdict>,
}

impl PartRun<MockKernel> {
    /// Deterministic in-memory kernel.
    pub fn mock() -> Self {
        Self::on(MockKernel::new())
    }
}

impl PartRun<TruckKernel> {
    /// B-rep kernel; fillets, chamfers and lofts are not available.
    pub fn truck() -> Self {
        Self::on(TruckKernel::new())
    }
}

impl<K: KernelBundle> PartRun<K> {
    pub fn on(kernel: K) -> Self {
        Self {
            kernel,
            tolerance: KernelTolerance::default(),
            frame: Frame::xy(),
            part: None,
            shown: Vec::new(),
            verdicts: Vec::new(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: KernelTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Frame the next builds are placed in.
    pub fn in_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Build and keep the part, replacing any earlier one.
    pub fn build(&mut self, builder: &dyn PartBuilder, measures: &MeasureNode) -> Result<&mut Self, HarnessError> {
        let part = self.try_build(builder, measures)?;
        self.part = Some(part);
        Ok(self)
    }

    /// Build without keeping the part, returning the engine's error as is.
    pub fn try_build(&mut self, builder: &dyn PartBuilder, measures: &MeasureNode) -> Result<Part, BuildError> {
        let mut sink = RecordingSink::default();
        let result = {
            let mut ctx = BuildContext::new(&mut self.kernel, self.tolerance).with_sink(&mut sink);
            assemble(&mut ctx, builder, &self.frame, measures)
        };
        self.shown = sink.names().into_iter().map(str::to_string).collect();
        debug!(part = builder.name(), ok = result.is_ok(), shown = self.shown.len(), "part run");
        result
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn part(&self) -> Result<&Part, HarnessError> {
        self.part.as_ref().ok_or(HarnessError::NotBuilt)
    }

    /// The first piece of the part.
    pub fn solid(&self) -> Result<&KernelSolidHandle, HarnessError> {
        self.part()?.solids.first().ok_or(HarnessError::NotBuilt)
    }

    /// Names sent to the debug channel during the last build.
    pub fn shown(&self) -> &[String] {
        &self.shown
    }

    pub fn volume(&self) -> Result<f64, HarnessError> {
        Ok(self.part()?.volume(&self.kernel)?)
    }

    pub fn bounding_box(&self) -> Result<BoundingBox, HarnessError> {
        Ok(self.part()?.bounding_box(&self.kernel)?)
    }

    /// Volume and bounding box, for comparing builds.
    pub fn fingerprint(&self) -> Result<(f64, BoundingBox), HarnessError> {
        Ok((self.volume()?, self.bounding_box()?))
    }

    pub fn contains(&self, point: [f64; 3]) -> Result<bool, HarnessError> {
        Ok(self.kernel.contains_point(self.solid()?, point)?)
    }

    pub fn face_area(&self, selector: &FaceSelector) -> Result<f64, HarnessError> {
        Ok(face_area(&self.kernel, self.solid()?, selector, self.tolerance.selection))
    }

    // ── Recorded checks ─────────────────────────────────────────────────

    pub fn check(&mut self, verdict: OracleVerdict) -> &mut Self {
        self.verdicts.push(verdict);
        self
    }

    pub fn expect_inside(&mut self, point: [f64; 3], label: &str) -> Result<&mut Self, HarnessError> {
        let v = oracle::check_point(&self.kernel, self.solid()?, point, true, label);
        Ok(self.check(v))
    }

    pub fn expect_outside(&mut self, point: [f64; 3], label: &str) -> Result<&mut Self, HarnessError> {
        let v = oracle::check_point(&self.kernel, self.solid()?, point, false, label);
        Ok(self.check(v))
    }

    pub fn expect_volume(&mut self, expected: f64, rel_tol: f64) -> Result<&mut Self, HarnessError> {
        let v = oracle::check_volume(&self.kernel, self.part()?, expected, rel_tol);
        Ok(self.check(v))
    }

    pub fn expect_face_area(
        &mut self,
        selector: &FaceSelector,
        expected: f64,
        tol: f64,
    ) -> Result<&mut Self, HarnessError> {
        let v = oracle::check_face_area(&self.kernel, self.solid()?, selector, expected, tol);
        Ok(self.check(v))
    }

    pub fn verdicts(&self) -> &[OracleVerdict] {
        &self.verdicts
    }

    /// Fail with the first failed verdict, if any.
    pub fn assert_all_passed(&self) -> Result<(), HarnessError> {
        match self.verdicts.iter().find(|v| !v.passed) {
            None => Ok(()),
            Some(v) => Err(HarnessError::OracleFailure {
                oracle: v.oracle_name.clone(),
                detail: v.detail.clone(),
            }),
        }
    }

    // ── Output ──────────────────────────────────────────────────────────

    pub fn report(&self) -> Result<PartReport, HarnessError> {
        PartReport::collect(&self.kernel, self.part()?, &self.verdicts)
    }

    pub fn stl(&mut self, format: StlFormat) -> Result<Vec<u8>, HarnessError> {
        let part = self.part.as_ref().ok_or(HarnessError::NotBuilt)?;
        Ok(export_stl(&mut self.kernel, &part.solids, &part.name, self.tolerance.mesh, format)?)
    }
}
