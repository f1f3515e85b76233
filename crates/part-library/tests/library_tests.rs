use kernel_bridge::{KernelIntrospect, MockKernel};
use measure_format::find_preset;
use part_engine::{assemble, BuildContext, BuildError, PartBuilder, RecordingSink};
use part_library::{bundled_presets, catalog, wall_mount, WallMount};
use part_types::{Frame, KernelTolerance, MeasureValue};

// ── Catalog ──────────────────────────────────────────────────────────────

#[test]
fn catalog_lists_every_part() {
    let catalog = catalog();
    let names: Vec<&str> = catalog.names().collect();
    assert_eq!(names, ["BoxLidFixation", "FootBlock", "WallMount", "XMountPlug"]);
}

#[test]
fn catalog_rejects_unknown_names() {
    let catalog = catalog();
    assert!(matches!(catalog.get("Teapot"), Err(BuildError::UnknownPart { .. })));
}

#[test]
fn default_measures_build_for_every_part() {
    let catalog = catalog();
    for name in catalog.names() {
        let builder = catalog.get(name).unwrap();
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
        let part = assemble(&mut ctx, builder, &Frame::xy(), &builder.default_measures())
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(part.name, name);
        assert!(part.volume(ctx.introspect()).unwrap() > 0.0, "{name}");
        assert!((0.0..=1.0).contains(&part.display.opacity()));
    }
}

// ── Presets ──────────────────────────────────────────────────────────────

#[test]
fn every_bundled_preset_builds() {
    let catalog = catalog();
    for preset in bundled_presets().unwrap() {
        let builder = catalog.get(&preset.part).unwrap();
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, preset.settings);
        let part = assemble(&mut ctx, builder, &Frame::xy(), &preset.measures)
            .unwrap_or_else(|e| panic!("{} / {}: {e}", preset.part, preset.name()));
        assert!(part.piece_count() >= 1);
    }
}

#[test]
fn mitraset_preset_delivers_the_front_half() {
    let presets = bundled_presets().unwrap();
    let preset = find_preset(&presets, "FootBlock", "mitraset foot").unwrap();
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, preset.settings);
    let part = assemble(&mut ctx, &part_library::FootBlock, &Frame::xy(), &preset.measures).unwrap();
    let bbox = part.bounding_box(ctx.introspect()).unwrap();
    assert!(bbox.max[1] <= 178.6 / 2.0 + 1e-6, "max y {}", bbox.max[1]);
    assert!((bbox.max[2] - 10.7).abs() < 1e-6);
}

#[test]
fn toilet_seat_preset_matches_the_defaults() {
    let presets = bundled_presets().unwrap();
    let preset = find_preset(&presets, "FootBlock", "toilet seat support").unwrap();
    let builder = catalog();
    let defaults = builder.get("FootBlock").unwrap().default_measures();
    assert_eq!(preset.measures, defaults);
}

// ── Sub-parts ────────────────────────────────────────────────────────────

#[test]
fn wall_mount_shows_its_plug_in_debug_mode() {
    let measures = WallMount.default_measures().with("debug", true);
    let mut shown = RecordingSink::default();
    {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default()).with_sink(&mut shown);
        assemble(&mut ctx, &WallMount, &Frame::xz(), &measures).unwrap();
    }
    let names = shown.names();
    assert!(names.contains(&"WallMount/base"));
    assert!(names.contains(&"XMountPlug/stem"));
    assert!(names.contains(&"XMountPlug/clip"));
}

#[test]
fn wall_mount_is_one_solid_with_the_plug_attached() {
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let part = assemble(&mut ctx, &WallMount, &Frame::xz(), &WallMount.default_measures()).unwrap();
    assert_eq!(part.piece_count(), 1);
    let bbox = part.bounding_box(ctx.introspect()).unwrap();
    // The plug stands proud of the 15 deep base.
    assert!(bbox.min[1] < -15.0 - 8.0, "min y {}", bbox.min[1]);
    assert!(ctx
        .introspect()
        .contains_point(&part.solids[0], [0.0, -1.0, 0.0])
        .unwrap());
}

#[test]
fn wall_mount_without_bolt_holes_keeps_solid_faces() {
    let measures = WallMount.default_measures();
    let base = measures.view().child("base").unwrap().node().clone().with("bolt_holes", MeasureValue::Absent);
    let measures = measures.with("base", base);
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let part = assemble(&mut ctx, &WallMount, &Frame::xz(), &measures).unwrap();
    assert_eq!(part.name, wall_mount::NAME);
    assert!(part.volume(ctx.introspect()).unwrap() > 0.0);
}
