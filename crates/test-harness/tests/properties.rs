//! Property tests across the library parts.

use part_engine::{DeriveMeasures, PartBuilder};
use part_library::{BoxLidFixation, FootBlock, XMountPlug};
use part_types::{MeasureNode, MeasureValue};
use proptest::prelude::*;
use test_harness::oracle::check_repeatable;
use test_harness::PartRun;

fn foot_block(lower: f64, upper: f64, depth: f64, front: f64, back: f64) -> MeasureNode {
    FootBlock.default_measures().with(
        "block",
        MeasureNode::new()
            .with("lower_width", lower)
            .with("upper_width", upper)
            .with("lower_depth", depth)
            .with("upper_depth", depth)
            .with("front_height", front)
            .with("back_height", back),
    )
}

fn lid(width: f64, depth: f64, height: f64, radius_share: f64) -> MeasureNode {
    BoxLidFixation
        .default_measures()
        .with(
            "block",
            MeasureNode::new()
                .with("width", width)
                .with("depth", depth)
                .with("height", height)
                .with("radius", radius_share * depth / 2.0),
        )
        .with("hole_1", MeasureValue::Absent)
        .with("hole_2", MeasureValue::Absent)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn foot_block_derivation_is_deterministic(
        lower in 5.0..30.0f64,
        upper in 5.0..30.0f64,
        depth in 40.0..200.0f64,
        front in 5.0..25.0f64,
        rise in -4.0..4.0f64,
    ) {
        let measures = foot_block(lower, upper, depth, front, front + rise);
        let before = measures.clone();
        let a = FootBlock::derive(&measures).unwrap();
        let b = FootBlock::derive(&measures).unwrap();
        prop_assert_eq!(a.clone(), b);
        prop_assert_eq!(measures, before, "derivation leaves the measures alone");
        prop_assert!((a.slope_deg.to_radians().sin() * depth - rise).abs() < 1e-9);
    }

    #[test]
    fn plug_derivation_is_deterministic(width in 14.0..30.0f64, lever in 5.0..25.0f64) {
        let measures = part_library::xmount_plug::plug_measures();
        let plate = measures.view().child("plate").unwrap().node().clone().with("width", width);
        let clip = measures.view().child("clip").unwrap().node().clone().with("lever_length", lever);
        let measures = measures.with("plate", plate).with("clip", clip);
        let a = XMountPlug::derive(&measures).map_err(|e| e.to_string());
        let b = XMountPlug::derive(&measures).map_err(|e| e.to_string());
        prop_assert!(a.is_ok(), "{:?}", a);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn lid_builds_are_repeatable(
        width in 20.0..80.0f64,
        depth in 4.0..12.0f64,
        height in 2.0..8.0f64,
        radius_share in 0.1..1.0f64,
    ) {
        let measures = lid(width, depth, height, radius_share);
        let mut first = PartRun::mock();
        first.build(&BoxLidFixation, &measures).unwrap();
        let mut second = PartRun::mock();
        second.build(&BoxLidFixation, &measures).unwrap();
        let verdict = check_repeatable(first.fingerprint().unwrap(), second.fingerprint().unwrap(), 0.0);
        prop_assert!(verdict.passed, "{}", verdict.detail);
    }

    #[test]
    fn radius_past_half_the_depth_always_fails(depth in 4.0..12.0f64, excess in 0.01..2.0f64) {
        let measures = lid(40.0, depth, 5.0, 1.0).with(
            "block",
            MeasureNode::new()
                .with("width", 40.0)
                .with("depth", depth)
                .with("height", 5.0)
                .with("radius", depth / 2.0 + excess),
        );
        let mut run = PartRun::mock();
        let err = run.try_build(&BoxLidFixation, &measures).unwrap_err();
        prop_assert_eq!(err.step(), Some("round corners"));
    }
}

#[test]
fn repeated_build_in_one_kernel_is_identical() {
    let measures = FootBlock.default_measures();
    let mut run = PartRun::mock();
    run.build(&FootBlock, &measures).unwrap();
    let first = run.fingerprint().unwrap();
    run.build(&FootBlock, &measures).unwrap();
    let second = run.fingerprint().unwrap();
    assert!(check_repeatable(first, second, 0.0).passed);
}
