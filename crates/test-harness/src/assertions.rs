//! Assertion helpers with diagnostic output.
//!
//! Every failure carries expected vs actual and the caller's context label.

use kernel_bridge::{BoundingBox, KernelIntrospect, KernelSolidHandle};
use modeling_ops::FaceSelector;
use part_engine::{BuildError, Part};

use crate::helpers::HarnessError;
use crate::oracle::{self, OracleVerdict};

fn verdict(v: OracleVerdict, ctx: &str) -> Result<(), HarnessError> {
    if v.passed {
        Ok(())
    } else {
        Err(HarnessError::OracleFailure {
            oracle: v.oracle_name,
            detail: format!("[{ctx}] {}", v.detail),
        })
    }
}

/// Assert the part's volume within a relative tolerance.
pub fn assert_volume(
    introspect: &dyn KernelIntrospect,
    part: &Part,
    expected: f64,
    rel_tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    verdict(oracle::check_volume(introspect, part, expected, rel_tol), ctx)
}

/// Assert the part's bounding box within an absolute tolerance.
pub fn assert_bounding_box(
    introspect: &dyn KernelIntrospect,
    part: &Part,
    expected_min: [f64; 3],
    expected_max: [f64; 3],
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    let expected = BoundingBox::new(expected_min, expected_max);
    verdict(oracle::check_bounding_box(introspect, part, &expected, tol), ctx)
}

pub fn assert_inside(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    point: [f64; 3],
    ctx: &str,
) -> Result<(), HarnessError> {
    verdict(oracle::check_point(introspect, solid, point, true, ctx), ctx)
}

pub fn assert_outside(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    point: [f64; 3],
    ctx: &str,
) -> Result<(), HarnessError> {
    verdict(oracle::check_point(introspect, solid, point, false, ctx), ctx)
}

/// Assert the summed area of the selected faces.
pub fn assert_face_area(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    selector: &FaceSelector,
    expected: f64,
    tol: f64,
    ctx: &str,
) -> Result<(), HarnessError> {
    verdict(oracle::check_face_area(introspect, solid, selector, expected, tol), ctx)
}

/// Assert that a build failed at `step`, blaming the measure at `path`.
pub fn assert_build_failure<T: std::fmt::Debug>(
    result: Result<T, BuildError>,
    step: &str,
    path: &str,
    ctx: &str,
) -> Result<(), HarnessError> {
    let err = match result {
        Ok(v) => {
            return Err(HarnessError::AssertionFailed {
                detail: format!("[{ctx}] expected failure at `{step}`, got {v:?}"),
            })
        }
        Err(e) => e,
    };
    let actual_path = err.measure().map(|p| p.to_string());
    if err.step() == Some(step) && actual_path.as_deref() == Some(path) {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!(
                "[{ctx}] expected step `{step}` / measure `{path}`, got step {:?} / measure {:?} ({err})",
                err.step(),
                actual_path
            ),
        })
    }
}
