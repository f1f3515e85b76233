//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! A caller can collect every failure of a part in one pass.

use kernel_bridge::{BoundingBox, KernelIntrospect, KernelSolidHandle};
use modeling_ops::FaceSelector;
use part_engine::Part;

use crate::helpers::{face_area, relative_difference};

/// The result of a single oracle check.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn judged(name: &str, passed: bool, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed,
            detail,
            value: Some(value),
        }
    }
}

// ── Solid Oracles ───────────────────────────────────────────────────────────

/// Every piece of the part encloses material.
pub fn check_positive_volume(introspect: &dyn KernelIntrospect, part: &Part) -> OracleVerdict {
    let mut empty = Vec::new();
    let mut total = 0.0;
    for (i, solid) in part.solids.iter().enumerate() {
        match introspect.volume(solid) {
            Ok(v) if v > 0.0 => total += v,
            Ok(v) => empty.push(format!("piece {i}: {v}")),
            Err(e) => empty.push(format!("piece {i}: {e}")),
        }
    }
    if part.solids.is_empty() {
        return OracleVerdict::fail("positive_volume", "part has no pieces".to_string());
    }
    if empty.is_empty() {
        OracleVerdict::judged(
            "positive_volume",
            true,
            format!("{} piece(s), volume {total:.4}", part.solids.len()),
            total,
        )
    } else {
        OracleVerdict::fail("positive_volume", empty.join(", "))
    }
}

/// Volume within a relative tolerance.
pub fn check_volume(
    introspect: &dyn KernelIntrospect,
    part: &Part,
    expected: f64,
    rel_tol: f64,
) -> OracleVerdict {
    match part.volume(introspect) {
        Ok(actual) => {
            let diff = relative_difference(actual, expected);
            OracleVerdict::judged(
                "volume",
                diff <= rel_tol,
                format!("expected {expected:.4}, got {actual:.4} (rel diff {diff:.2e}, tol {rel_tol:.0e})"),
                actual,
            )
        }
        Err(e) => OracleVerdict::fail("volume", e.to_string()),
    }
}

/// Bounding box corners within an absolute tolerance.
pub fn check_bounding_box(
    introspect: &dyn KernelIntrospect,
    part: &Part,
    expected: &BoundingBox,
    tol: f64,
) -> OracleVerdict {
    match part.bounding_box(introspect) {
        Ok(actual) if actual.approx_eq(expected, tol) => {
            OracleVerdict::pass("bounding_box", format!("{:?}", actual.to_array()))
        }
        Ok(actual) => OracleVerdict::fail(
            "bounding_box",
            format!("expected {:?}, got {:?} (tol={tol})", expected.to_array(), actual.to_array()),
        ),
        Err(e) => OracleVerdict::fail("bounding_box", e.to_string()),
    }
}

/// A point is inside (or outside) the material of a piece.
pub fn check_point(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    point: [f64; 3],
    expect_inside: bool,
    label: &str,
) -> OracleVerdict {
    let name = if expect_inside { "point_inside" } else { "point_outside" };
    match introspect.contains_point(solid, point) {
        Ok(inside) if inside == expect_inside => OracleVerdict::pass(name, format!("{label} {point:?}")),
        Ok(inside) => OracleVerdict::fail(
            name,
            format!("{label} {point:?} is {}", if inside { "material" } else { "empty" }),
        ),
        Err(e) => OracleVerdict::fail(name, e.to_string()),
    }
}

/// Summed area of the selected faces within an absolute tolerance.
pub fn check_face_area(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
    selector: &FaceSelector,
    expected: f64,
    tol: f64,
) -> OracleVerdict {
    let actual = face_area(introspect, solid, selector, 1e-4);
    OracleVerdict::judged(
        "face_area",
        (actual - expected).abs() <= tol,
        format!("{selector}: expected {expected:.4}, got {actual:.4} (tol={tol})"),
        actual,
    )
}

/// Two builds of the same measures agree in volume and bounding box.
pub fn check_repeatable(first: (f64, BoundingBox), second: (f64, BoundingBox), tol: f64) -> OracleVerdict {
    let dv = (first.0 - second.0).abs();
    if dv <= tol && first.1.approx_eq(&second.1, tol) {
        OracleVerdict::judged("repeatable", true, format!("volume {:.6} twice", first.0), dv)
    } else {
        OracleVerdict::judged(
            "repeatable",
            false,
            format!(
                "volume {:.6} vs {:.6}, bbox {:?} vs {:?}",
                first.0,
                second.0,
                first.1.to_array(),
                second.1.to_array()
            ),
            dv,
        )
    }
}
