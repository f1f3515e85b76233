//! Part scenarios against MockKernel.
//!
//! Each scenario builds a library part through `PartRun` and checks the
//! geometry with oracles, collecting every verdict before failing.

use modeling_ops::FaceSelector;
use part_engine::{BuildError, PartBuilder};
use part_library::{BoxLidFixation, FootBlock, WallMount, XMountPlug};
use part_types::{Frame, KernelTolerance, MeasureNode, MeasureValue};
use test_harness::assertions::{assert_bounding_box, assert_build_failure};
use test_harness::helpers::{cylinder_volume, rounded_corner_loss};
use test_harness::PartRun;

fn lid_block(radius: f64) -> MeasureNode {
    MeasureNode::new()
        .with("width", 55.0)
        .with("depth", 8.0)
        .with("height", 5.5)
        .with("radius", radius)
}

fn lid_without_holes(radius: f64) -> MeasureNode {
    BoxLidFixation
        .default_measures()
        .with("block", lid_block(radius))
        .with("hole_1", MeasureValue::Absent)
        .with("hole_2", MeasureValue::Absent)
}

fn top_face() -> FaceSelector {
    FaceSelector::normal_along([0.0, 0.0, 1.0]).within(FaceSelector::extreme([0.0, 0.0, 1.0], true))
}

// ── Scenario 1: rounded box lid fixation ────────────────────────────────

#[test]
fn test_rounded_lid_keeps_height_and_loses_corner_area() {
    let r = 3.99;
    let mut run = PartRun::mock();
    run.build(&BoxLidFixation, &lid_without_holes(r)).unwrap();

    let part = run.part().unwrap().clone();
    assert_eq!(part.piece_count(), 1);
    assert_bounding_box(run.kernel(), &part, [0.0, -4.0, 0.0], [55.0, 4.0, 5.5], 1e-9, "rounded lid").unwrap();

    // Arcs are faceted with 32 steps per quarter, which costs about 0.02.
    let expected = 55.0 * 8.0 - rounded_corner_loss(r);
    run.expect_face_area(&top_face(), expected, 0.05)
        .unwrap()
        .expect_outside([0.2, 3.8, 2.0], "rounded corner")
        .unwrap()
        .expect_inside([4.0, 3.8, 2.0], "straight side")
        .unwrap();
    run.assert_all_passed().unwrap();
}

#[test]
fn test_finer_arcs_approach_the_exact_loss() {
    let r = 3.99;
    let tolerance = KernelTolerance {
        arc_segments: 256,
        ..KernelTolerance::default()
    };
    let mut run = PartRun::mock().with_tolerance(tolerance);
    run.build(&BoxLidFixation, &lid_without_holes(r)).unwrap();
    let area = run.face_area(&top_face()).unwrap();
    assert!((area - (440.0 - rounded_corner_loss(r))).abs() < 1e-3, "area {area}");
}

// ── Scenario 2: counterbored screw holes ────────────────────────────────

#[test]
fn test_counterbores_at_both_positions() {
    let mut run = PartRun::mock();
    run.build(&BoxLidFixation, &BoxLidFixation.default_measures()).unwrap();
    for x in [15.0, 40.0] {
        run.expect_outside([x, 0.0, 0.5], "through hole at the floor")
            .unwrap()
            .expect_outside([x + 1.5, 0.0, 1.0], "inside the 3.3 bore")
            .unwrap()
            .expect_inside([x + 2.2, 0.0, 1.0], "below the recess floor")
            .unwrap()
            .expect_outside([x + 2.2, 0.0, 1.6], "inside the 5.8 recess")
            .unwrap()
            .expect_outside([x - 2.8, 0.0, 5.4], "recess opens at the top")
            .unwrap()
            .expect_inside([x + 3.0, 0.0, 4.0], "beside the recess")
            .unwrap();
    }
    run.expect_inside([27.5, 0.0, 3.0], "between the holes").unwrap();
    run.assert_all_passed().unwrap();
}

#[test]
fn test_counterbores_remove_their_volume() {
    let mut plain = PartRun::mock();
    plain.build(&BoxLidFixation, &lid_without_holes(3.99)).unwrap();
    let mut drilled = PartRun::mock();
    drilled.build(&BoxLidFixation, &BoxLidFixation.default_measures()).unwrap();

    let removed = plain.volume().unwrap() - drilled.volume().unwrap();
    let expected = 2.0 * (cylinder_volume(5.8, 4.0) + cylinder_volume(3.3, 1.5));
    // Drilled solids are measured by sampling, hence the loose bound.
    assert!((removed - expected).abs() < 0.1 * expected, "removed {removed}, expected {expected}");
}

// ── Scenario 3: fillet boundary at the part level ───────────────────────

#[test]
fn test_lid_radius_of_half_the_depth_is_accepted() {
    let mut run = PartRun::mock();
    let measures = BoxLidFixation.default_measures().with("block", lid_block(4.0));
    run.build(&BoxLidFixation, &measures).unwrap();
    assert_eq!(run.part().unwrap().piece_count(), 1);
    assert!((run.bounding_box().unwrap().max[2] - 5.5).abs() < 1e-9);
}

#[test]
fn test_lid_radius_beyond_half_the_depth_names_step_and_measure() {
    let mut run = PartRun::mock();
    let measures = BoxLidFixation.default_measures().with("block", lid_block(4.01));
    let result = run.try_build(&BoxLidFixation, &measures);
    assert_build_failure(result, "round corners", "block.radius", "lid").unwrap();
    assert!(run.part().is_err(), "nothing is kept from a failed build");
}

// ── Scenario 4: foot block ──────────────────────────────────────────────

#[test]
fn test_foot_block_top_follows_the_slope() {
    let mut run = PartRun::mock();
    run.build(&FootBlock, &FootBlock.default_measures()).unwrap();
    let bbox = run.bounding_box().unwrap();
    assert!((bbox.min[2]).abs() < 1e-9);
    // The back edge of the sloped top sits at 19.1.
    assert!((bbox.max[2] - 19.1).abs() < 0.05, "top {}", bbox.max[2]);
    run.expect_inside([0.0, 5.0, 15.0], "front, below the top")
        .unwrap()
        .expect_outside([0.0, 5.0, 17.5], "front, above the top")
        .unwrap()
        .expect_inside([0.0, 89.0, 18.5], "back, below the top")
        .unwrap();
    run.assert_all_passed().unwrap();
}

#[test]
fn test_foot_block_halves_share_the_split_plane() {
    let measures = |pieces: &str| FootBlock.default_measures().with("parts", pieces);
    let mut whole = PartRun::mock();
    whole.build(&FootBlock, &measures("all")).unwrap();
    let mut front = PartRun::mock();
    front.build(&FootBlock, &measures("front half")).unwrap();
    let mut back = PartRun::mock();
    back.build(&FootBlock, &measures("back half")).unwrap();

    let front_box = front.bounding_box().unwrap();
    let back_box = back.bounding_box().unwrap();
    assert!(front_box.max[1] <= 47.0 + 1e-6 && front_box.max[1] > 46.0, "{:?}", front_box.to_array());
    assert!(back_box.min[1] >= 47.0 - 1e-6 && back_box.min[1] < 48.0, "{:?}", back_box.to_array());
    let halves = front.volume().unwrap() + back.volume().unwrap();
    let all = whole.volume().unwrap();
    assert!((halves - all).abs() < 0.02 * all, "{halves} vs {all}");
}

// ── Scenario 5: plug and wall mount ─────────────────────────────────────

#[test]
fn test_plug_bounding_box() {
    let mut run = PartRun::mock();
    run.build(&XMountPlug, &XMountPlug.default_measures()).unwrap();
    let part = run.part().unwrap().clone();
    let bbox = run.bounding_box().unwrap();
    assert!((bbox.max[2] - 11.0).abs() < 1e-6, "height {}", bbox.max[2]);
    assert!((bbox.max[0] - 10.2).abs() < 1e-6);
    assert_eq!(part.piece_count(), 1);
}

#[test]
fn test_wall_mount_debug_channel_names_both_parts() {
    let mut run = PartRun::mock().in_frame(Frame::xz());
    let measures = WallMount.default_measures().with("debug", true);
    run.build(&WallMount, &measures).unwrap();
    let shown = run.shown();
    assert!(shown.iter().any(|n| n == "WallMount/base"), "{shown:?}");
    assert!(shown.iter().any(|n| n.starts_with("XMountPlug/")), "{shown:?}");
}

#[test]
fn test_wall_mount_inconsistent_plug_is_reported_through_the_sub_part() {
    let plug = part_library::xmount_plug::plug_measures();
    let clip = plug.view().child("clip").unwrap().node().clone().with("step_height", 9.5);
    let measures = WallMount.default_measures().with("plug", plug.with("clip", clip));
    let mut run = PartRun::mock().in_frame(Frame::xz());
    let err = run.try_build(&WallMount, &measures).unwrap_err();
    assert!(matches!(err, BuildError::SubPart { ref part, .. } if part == "XMountPlug"), "{err}");
    assert_eq!(err.measure().map(|p| p.to_string()).as_deref(), Some("clip.step_height"));
}

#[test]
fn test_wall_mount_placed_in_another_frame() {
    let mut on_wall = PartRun::mock().in_frame(Frame::xz());
    on_wall.build(&WallMount, &WallMount.default_measures()).unwrap();
    let mut flat = PartRun::mock();
    flat.build(&WallMount, &WallMount.default_measures()).unwrap();

    let upright = on_wall.bounding_box().unwrap();
    let lying = flat.bounding_box().unwrap();
    assert!((upright.size()[0] - lying.size()[0]).abs() < 1e-6);
    assert!((on_wall.volume().unwrap() - flat.volume().unwrap()).abs() < 1e-3 * flat.volume().unwrap());
    // Lying flat, the wall side is the floor.
    assert!(lying.min[2].abs() < 1e-6, "floor {}", lying.min[2]);
}
