use kernel_bridge::{Kernel, KernelError, KernelIntrospect, KernelSolidHandle, MockKernel, TruckKernel};
use modeling_ops::compose::{union_wires, ComposedWires, ComposerSettings};
use modeling_ops::extrude::{execute_extrude, execute_symmetric_extrude};
use modeling_ops::fillet::execute_fillet;
use modeling_ops::loft::execute_loft;
use modeling_ops::revolve::execute_revolve;
use modeling_ops::select::EdgeSelector;
use modeling_ops::sketch::Sketch;
use modeling_ops::sweep::execute_sweep;
use modeling_ops::types::OpError;
use part_types::Frame;
use proptest::prelude::*;

const TOL: f64 = 1e-6;

/// Enclosed area of composed outlines, measured as the volume of a unit slab.
fn composed_area(kernel: &mut MockKernel, composed: &ComposedWires) -> f64 {
    composed
        .profiles
        .iter()
        .map(|p| {
            let slab = kernel
                .extrude_wires(&p.wires(), composed.normal, 1.0)
                .unwrap();
            kernel.volume(&slab).unwrap()
        })
        .sum()
}

fn rect(kernel: &mut MockKernel, r: [f64; 4]) -> kernel_bridge::KernelWireHandle {
    Sketch::on(Frame::xy())
        .polyline(kernel, &[[r[0], r[1]], [r[2], r[1]], [r[2], r[3]], [r[0], r[3]]], true)
        .unwrap()
}

fn area(r: [f64; 4]) -> f64 {
    (r[2] - r[0]) * (r[3] - r[1])
}

fn meet(a: [f64; 4], b: [f64; 4]) -> [f64; 4] {
    [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])]
}

/// Rectangles that all contain the origin, so any union is one region without holes.
fn around_origin() -> impl Strategy<Value = [f64; 4]> {
    (-3.0..-0.1f64, -3.0..-0.1f64, 0.1..3.0f64, 0.1..3.0f64).prop_map(|(a, b, c, d)| [a, b, c, d])
}

// ── Extrude / Loft / Sweep / Revolve ───────────────────────────────────────

#[test]
fn extrude_rectangle_volume() {
    let mut kernel = MockKernel::new();
    let wire = Sketch::on(Frame::xy()).rect(&mut kernel, 2.0, 3.0, (true, true)).unwrap();
    let solid = execute_extrude(&mut kernel, &[wire], [0.0, 0.0, 1.0], 5.0).unwrap();
    assert!((kernel.volume(&solid).unwrap() - 30.0).abs() < TOL);
}

#[test]
fn extrude_with_hole_wire() {
    let mut kernel = MockKernel::new();
    let sketch = Sketch::on(Frame::xy());
    let outer = sketch.rect(&mut kernel, 4.0, 4.0, (true, true)).unwrap();
    let hole = sketch.rect(&mut kernel, 2.0, 2.0, (true, true)).unwrap();
    let solid = execute_extrude(&mut kernel, &[outer, hole], [0.0, 0.0, 1.0], 1.0).unwrap();
    assert!((kernel.volume(&solid).unwrap() - 12.0).abs() < TOL);
    assert!(!kernel.contains_point(&solid, [0.0, 0.0, 0.5]).unwrap());
}

#[test]
fn extrude_rejects_empty_input() {
    let mut kernel = MockKernel::new();
    assert!(matches!(
        execute_extrude(&mut kernel, &[], [0.0, 0.0, 1.0], 1.0),
        Err(OpError::NoProfiles)
    ));
}

#[test]
fn symmetric_extrude_is_centered() {
    let mut kernel = MockKernel::new();
    let wire = Sketch::on(Frame::xy()).rect(&mut kernel, 1.0, 1.0, (true, true)).unwrap();
    let solid = execute_symmetric_extrude(&mut kernel, &[wire], [0.0, 0.0, 2.0], 4.0).unwrap();
    let bb = kernel.bounding_box(&solid).unwrap();
    assert!((bb.min[2] + 2.0).abs() < TOL);
    assert!((bb.max[2] - 2.0).abs() < TOL);
}

#[test]
fn loft_square_to_smaller_square() {
    let mut kernel = MockKernel::new();
    let bottom = Sketch::on(Frame::xy()).rect(&mut kernel, 4.0, 4.0, (true, true)).unwrap();
    let top = Sketch::on(Frame::xy().offset(3.0)).rect(&mut kernel, 2.0, 2.0, (true, true)).unwrap();
    let solid = execute_loft(&mut kernel, &bottom, &top).unwrap();
    // frustum of a square pyramid: h/3 (A1 + A2 + sqrt(A1 A2))
    assert!((kernel.volume(&solid).unwrap() - 28.0).abs() < 1e-6);
}

#[test]
fn sweep_requires_orthogonal_profile() {
    let mut kernel = MockKernel::new();
    let profile = Sketch::on(Frame::xy()).circle(&mut kernel, [0.0, 0.0], 1.0).unwrap();
    let along = kernel
        .make_polyline_wire(&[[0.0, 0.0, 0.0], [0.0, 0.0, 5.0]], false)
        .unwrap();
    let solid = execute_sweep(&mut kernel, &profile, &along, 1e-6).unwrap();
    assert!(kernel.contains_point(&solid, [0.0, 0.0, 4.5]).unwrap());

    let slanted = kernel
        .make_polyline_wire(&[[0.0, 0.0, 0.0], [3.0, 0.0, 4.0]], false)
        .unwrap();
    assert!(matches!(
        execute_sweep(&mut kernel, &profile, &slanted, 1e-6),
        Err(OpError::InvalidParameter { .. })
    ));
}

#[test]
fn revolve_rectangle_into_tube() {
    let mut kernel = MockKernel::new();
    let profile = Sketch::on(Frame::xz())
        .polyline(&mut kernel, &[[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0]], true)
        .unwrap();
    let solid = execute_revolve(&mut kernel, &profile, [0.0; 3], [0.0, 0.0, 1.0], 360.0).unwrap();
    let expected = std::f64::consts::PI * (4.0 - 1.0);
    assert!((kernel.volume(&solid).unwrap() - expected).abs() < 1e-6);
    assert!(!kernel.contains_point(&solid, [0.0, 0.0, 0.5]).unwrap());
    assert!(execute_revolve(&mut kernel, &profile, [0.0; 3], [0.0, 0.0, 1.0], 0.0).is_err());
}

// ── Fillet boundary ────────────────────────────────────────────────────────

fn bar(kernel: &mut MockKernel) -> KernelSolidHandle {
    let wire = Sketch::on(Frame::xy()).rect(kernel, 55.0, 8.0, (false, true)).unwrap();
    execute_extrude(kernel, &[wire], [0.0, 0.0, 1.0], 5.5).unwrap()
}

#[test]
fn fillet_at_half_the_shortest_edge_is_accepted() {
    let mut kernel = MockKernel::new();
    let solid = bar(&mut kernel);
    let edges = EdgeSelector::parallel_to([0.0, 0.0, 1.0]).select(&kernel, &solid, TOL);
    assert_eq!(edges.len(), 4);
    let rounded = execute_fillet(&mut kernel, &solid, &edges, 4.0).unwrap();
    let bb = kernel.bounding_box(&rounded).unwrap();
    assert!((bb.max[2] - 5.5).abs() < TOL);
}

#[test]
fn fillet_beyond_half_fails_and_is_not_clamped() {
    let mut kernel = MockKernel::new();
    let solid = bar(&mut kernel);
    let edges = EdgeSelector::parallel_to([0.0, 0.0, 1.0]).select(&kernel, &solid, TOL);
    let before = kernel.solid_count();
    let err = execute_fillet(&mut kernel, &solid, &edges, 4.001).unwrap_err();
    assert!(matches!(err, OpError::ExceedsMaterial { .. }), "{err:?}");
    assert_eq!(kernel.solid_count(), before, "no partial solid is produced");
}

// ── Wire composer ──────────────────────────────────────────────────────────

#[test]
fn composer_produces_hole_for_ring_of_bars() {
    let mut kernel = MockKernel::new();
    let bars = [
        [0.0, 0.0, 5.0, 1.0],
        [4.0, 0.0, 5.0, 5.0],
        [0.0, 4.0, 5.0, 5.0],
        [0.0, 0.0, 1.0, 5.0],
    ];
    let wires: Vec<_> = bars.iter().map(|r| rect(&mut kernel, *r)).collect();
    let composed = union_wires(&mut kernel, &wires, &ComposerSettings::default()).unwrap();
    let profile = composed.single().unwrap();
    assert_eq!(profile.holes.len(), 1);
    assert!((composed_area(&mut kernel, &composed) - 16.0).abs() < 1e-6);
}

#[test]
fn composer_keeps_disjoint_regions_apart() {
    let mut kernel = MockKernel::new();
    let a = rect(&mut kernel, [0.0, 0.0, 1.0, 1.0]);
    let b = rect(&mut kernel, [3.0, 0.0, 4.0, 2.0]);
    let composed = union_wires(&mut kernel, &[a, b], &ComposerSettings::default()).unwrap();
    assert_eq!(composed.profiles.len(), 2);
    assert!(composed.single().is_err());
    assert!((composed_area(&mut kernel, &composed) - 3.0).abs() < 1e-6);
}

#[test]
fn composer_on_truck_reports_instead_of_aborting() {
    let mut kernel = TruckKernel::new();
    let sketch = Sketch::on(Frame::xy());
    let a = sketch.rect(&mut kernel, 4.0, 2.0, (false, false)).unwrap();
    let b = sketch
        .polyline(&mut kernel, &[[3.0, 0.0], [5.0, 0.0], [5.0, 3.0], [3.0, 3.0]], true)
        .unwrap();
    // the coplanar slabs may be beyond truck; either way this returns
    match union_wires(&mut kernel, &[a, b], &ComposerSettings::default()) {
        Ok(composed) => {
            assert!(!composed.profiles.is_empty());
            for profile in &composed.profiles {
                for p in kernel.wire_points(&profile.outer).unwrap() {
                    assert!(p[2].abs() < 1e-6, "{p:?} left the base plane");
                }
            }
        }
        Err(err) => assert!(
            matches!(err, OpError::Kernel(KernelError::BooleanFailed { .. })),
            "{err:?}"
        ),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn composer_is_commutative(a in around_origin(), b in around_origin()) {
        let mut kernel = MockKernel::new();
        let (wa, wb) = (rect(&mut kernel, a), rect(&mut kernel, b));
        let settings = ComposerSettings::default();
        let ab = union_wires(&mut kernel, &[wa.clone(), wb.clone()], &settings).unwrap();
        let ba = union_wires(&mut kernel, &[wb, wa], &settings).unwrap();
        let expected = area(a) + area(b) - area(meet(a, b));
        prop_assert!((composed_area(&mut kernel, &ab) - expected).abs() < 1e-6);
        prop_assert!((composed_area(&mut kernel, &ba) - expected).abs() < 1e-6);
        prop_assert!((ab.normal[2] - ba.normal[2]).abs() < 1e-12);
    }

    #[test]
    fn composer_is_associative(a in around_origin(), b in around_origin(), c in around_origin()) {
        let mut kernel = MockKernel::new();
        let (wa, wb, wc) = (rect(&mut kernel, a), rect(&mut kernel, b), rect(&mut kernel, c));
        let settings = ComposerSettings::default();
        let ab = union_wires(&mut kernel, &[wa.clone(), wb.clone()], &settings).unwrap();
        let left = union_wires(&mut kernel, &[ab.single().unwrap().outer.clone(), wc.clone()], &settings).unwrap();
        let bc = union_wires(&mut kernel, &[wb, wc], &settings).unwrap();
        let right = union_wires(&mut kernel, &[wa, bc.single().unwrap().outer.clone()], &settings).unwrap();
        let (l, r) = (composed_area(&mut kernel, &left), composed_area(&mut kernel, &right));
        let expected = area(a) + area(b) + area(c)
            - area(meet(a, b)) - area(meet(b, c)) - area(meet(a, c))
            + area(meet(meet(a, b), c));
        prop_assert!((l - r).abs() < 1e-6);
        prop_assert!((l - expected).abs() < 1e-6);
    }

    #[test]
    fn composer_is_idempotent_on_contained_overlap(a in around_origin(), shrink in 0.1..0.9f64) {
        let mut kernel = MockKernel::new();
        let inner = [a[0] * shrink, a[1] * shrink, a[2] * shrink, a[3] * shrink];
        let (wa, wi) = (rect(&mut kernel, a), rect(&mut kernel, inner));
        let settings = ComposerSettings::default();
        let contained = union_wires(&mut kernel, &[wa.clone(), wi], &settings).unwrap();
        prop_assert!((composed_area(&mut kernel, &contained) - area(a)).abs() < 1e-6);
        let same = union_wires(&mut kernel, &[wa.clone(), wa], &settings).unwrap();
        prop_assert!((composed_area(&mut kernel, &same) - area(a)).abs() < 1e-6);
    }
}
