use kernel_bridge::{KernelIntrospect, KernelSolidHandle, MockKernel};
use modeling_ops::{Counterbore, EdgeSelector, OpError};
use part_engine::*;
use part_types::{Color, DisplayOptions, Frame, KernelTolerance, MeasureNode, MeasureValue};
use proptest::prelude::*;

/// Block with rounded vertical corners and an optional counterbore.
struct Bracket;

impl PartBuilder for Bracket {
    fn build(
        &self,
        ctx: &mut BuildContext<'_>,
        frame: &Frame,
        measures: &MeasureNode,
    ) -> Result<KernelSolidHandle, BuildError> {
        let v = measures.view();
        let base = v.child("base").for_part(self.name())?;
        let w = base.positive("width").for_part(self.name())?;
        let d = base.positive("depth").for_part(self.name())?;
        let h = base.positive("height").for_part(self.name())?;
        let radius = base.optional_length("radius").for_part(self.name())?;

        let mut wp = Workplane::new(*frame);
        let outline = wp.sketch().rect(ctx.kernel(), w, d, (true, true)).step("base outline")?;
        ctx.show_debug("base outline", outline.clone());
        wp.extrude(ctx, &[outline], h, "base")?;
        if let Some(r) = radius {
            let path = base.path_of("radius").to_string();
            wp.fillet(ctx, &EdgeSelector::parallel_to(frame.normal()), r, "round corners", &path)?;
        }
        if let Some(hole) = v.optional_child("hole").for_part(self.name())? {
            let spec = Counterbore {
                diameter: hole.positive("diameter").for_part(self.name())?,
                cbore_diameter: hole.positive("cbore_diameter").for_part(self.name())?,
                cbore_depth: hole.positive("cbore_depth").for_part(self.name())?,
                depth: None,
            };
            wp.offset(h).tag("top").push_points(&[[0.0, 0.0]]);
            let path = hole.path().to_string();
            wp.cbore_holes(ctx, &spec, "counterbore", &path)?;
        }
        if let Some(solid) = wp.solid() {
            ctx.show_debug("bracket", solid.clone());
        }
        wp.finish()
    }

    fn name(&self) -> &str {
        "Bracket"
    }

    fn display(&self) -> DisplayOptions {
        DisplayOptions::opaque(Color::named("yellow"))
    }
}

/// A plate carrying a bracket on its top face.
struct Stand;

impl PartBuilder for Stand {
    fn build(
        &self,
        ctx: &mut BuildContext<'_>,
        frame: &Frame,
        measures: &MeasureNode,
    ) -> Result<KernelSolidHandle, BuildError> {
        let v = measures.view();
        let plate = v.positive("plate").for_part(self.name())?;
        let bracket = v.child("bracket").for_part(self.name())?;

        let mut wp = Workplane::new(*frame);
        let outline = wp.sketch().rect(ctx.kernel(), plate, plate, (true, true)).step("plate outline")?;
        wp.extrude(ctx, &[outline], 1.0, "plate")?;
        wp.offset(1.0).tag("plate_top");
        wp.offset(50.0);
        wp.from_tagged("plate_top")?;
        wp.part(ctx, &Bracket, bracket.node())?;
        wp.finish()
    }

    fn name(&self) -> &str {
        "Stand"
    }
}

fn bracket_measures(debug: bool) -> MeasureNode {
    MeasureNode::new().with("debug", debug).with(
        "base",
        MeasureNode::new()
            .with("width", 10.0)
            .with("depth", 4.0)
            .with("height", 3.0)
            .with("radius", 1.0),
    )
}

fn with_hole(m: MeasureNode) -> MeasureNode {
    m.with(
        "hole",
        MeasureNode::new()
            .with("diameter", 1.0)
            .with("cbore_diameter", 2.0)
            .with("cbore_depth", 1.0),
    )
}

fn build(builder: &dyn PartBuilder, frame: &Frame, measures: &MeasureNode) -> (f64, [f64; 6]) {
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let part = assemble(&mut ctx, builder, frame, measures).unwrap();
    let volume = part.volume(ctx.introspect()).unwrap();
    let bbox = part.bounding_box(ctx.introspect()).unwrap();
    (volume, bbox.to_array())
}

// ── Assembly ────────────────────────────────────────────────────

#[test]
fn assembly_is_deterministic() {
    let m = with_hole(bracket_measures(false));
    let a = build(&Bracket, &Frame::xy(), &m);
    let b = build(&Bracket, &Frame::xy(), &m);
    assert_eq!(a, b);
}

#[test]
fn rounded_block_volume() {
    let (volume, bbox) = build(&Bracket, &Frame::xy(), &bracket_measures(false));
    let corner_loss = 4.0 * (1.0 - std::f64::consts::PI / 4.0) * 3.0;
    assert!((volume - (120.0 - corner_loss)).abs() < 0.05, "{volume}");
    for (got, want) in bbox.iter().zip([-5.0, -2.0, 0.0, 5.0, 2.0, 3.0]) {
        assert!((got - want).abs() < 1e-9, "{bbox:?}");
    }
}

#[test]
fn assembly_moves_part_into_frame() {
    let target = Frame::xz().offset(2.0).shifted(7.0, 1.0);
    let (volume, bbox) = build(&Bracket, &target, &bracket_measures(false));
    let (ref_volume, _) = build(&Bracket, &Frame::xy(), &bracket_measures(false));
    assert!((volume - ref_volume).abs() < 1e-6);
    // XZ normal is -Y: the block grows from y = -2 toward -5.
    assert!((bbox[1] - -5.0).abs() < 1e-6, "{bbox:?}");
    assert!((bbox[4] - -2.0).abs() < 1e-6, "{bbox:?}");
    assert!((bbox[0] - 2.0).abs() < 1e-6, "{bbox:?}");
    assert!((bbox[3] - 12.0).abs() < 1e-6, "{bbox:?}");
}

#[test]
fn part_carries_display() {
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let part = assemble(&mut ctx, &Bracket, &Frame::xy(), &bracket_measures(false)).unwrap();
    assert_eq!(part.name, "Bracket");
    assert_eq!(part.piece_count(), 1);
    assert_eq!(part.display.color, Color::named("yellow"));
    assert_eq!(part.display.opacity(), 1.0);
}

// ── Errors ──────────────────────────────────────────────────────

#[test]
fn missing_measure_is_configuration_error() {
    let m = MeasureNode::new().with("base", MeasureNode::new().with("width", 1.0).with("depth", 1.0));
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let err = assemble(&mut ctx, &Bracket, &Frame::xy(), &m).unwrap_err();
    assert!(matches!(err, BuildError::Configuration { .. }));
    assert_eq!(err.measure().map(|p| p.to_string()), Some("base.height".to_string()));
}

#[test]
fn oversized_fillet_names_step_and_measure() {
    let m = MeasureNode::new().with(
        "base",
        MeasureNode::new()
            .with("width", 10.0)
            .with("depth", 4.0)
            .with("height", 3.0)
            .with("radius", 2.01),
    );
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let err = assemble(&mut ctx, &Bracket, &Frame::xy(), &m).unwrap_err();
    assert_eq!(err.step(), Some("round corners"));
    assert_eq!(err.measure().map(|p| p.to_string()), Some("base.radius".to_string()));
    assert!(matches!(
        err,
        BuildError::Geometry {
            source: OpError::ExceedsMaterial { .. },
            ..
        }
    ));
}

#[test]
fn sub_part_failure_is_wrapped() {
    let m = MeasureNode::new()
        .with("plate", 20.0)
        .with("bracket", MeasureNode::new().with("base", MeasureValue::Absent));
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let err = assemble(&mut ctx, &Stand, &Frame::xy(), &m).unwrap_err();
    assert!(matches!(err, BuildError::SubPart { ref part, .. } if part == "Bracket"));
    assert_eq!(err.part_chain().first(), Some(&"Bracket"));
    assert_eq!(err.measure().map(|p| p.to_string()), Some("base".to_string()));
    assert_eq!(ctx.depth(), 0);
}

// ── Part factory ────────────────────────────────────────────────

#[test]
fn factory_splices_sub_part_at_tag() {
    let m = MeasureNode::new().with("plate", 20.0).with("bracket", bracket_measures(false));
    let mut kernel = MockKernel::new();
    let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default());
    let part = assemble(&mut ctx, &Stand, &Frame::xy(), &m).unwrap();
    let solid = &part.solids[0];
    let bbox = ctx.introspect().bounding_box(solid).unwrap();
    assert!((bbox.max[2] - 4.0).abs() < 1e-9, "{bbox:?}");
    assert!(ctx.introspect().contains_point(solid, [0.0, 0.0, 3.5]).unwrap());
    assert!(ctx.introspect().contains_point(solid, [9.0, 9.0, 0.5]).unwrap());
    assert!(!ctx.introspect().contains_point(solid, [9.0, 9.0, 1.5]).unwrap());
}

// ── Debug channel ───────────────────────────────────────────────

#[test]
fn debug_channel_does_not_change_geometry() {
    let mut shown = RecordingSink::default();
    let on = {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default()).with_sink(&mut shown);
        let part = assemble(&mut ctx, &Bracket, &Frame::xy(), &with_hole(bracket_measures(true))).unwrap();
        (part.volume(ctx.introspect()).unwrap(), part.bounding_box(ctx.introspect()).unwrap())
    };
    assert_eq!(shown.names(), vec!["Bracket/base outline", "Bracket/bracket"]);

    let mut silent = RecordingSink::default();
    let off = {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default()).with_sink(&mut silent);
        let part = assemble(&mut ctx, &Bracket, &Frame::xy(), &with_hole(bracket_measures(false))).unwrap();
        (part.volume(ctx.introspect()).unwrap(), part.bounding_box(ctx.introspect()).unwrap())
    };
    assert!(silent.shown.is_empty());
    assert_eq!(on.0, off.0);
    assert!(on.1.approx_eq(&off.1, 0.0));
}

#[test]
fn debug_flag_reaches_sub_parts() {
    let m = MeasureNode::new()
        .with("debug", true)
        .with("plate", 20.0)
        .with("bracket", bracket_measures(false));
    let mut shown = RecordingSink::default();
    {
        let mut kernel = MockKernel::new();
        let mut ctx = BuildContext::new(&mut kernel, KernelTolerance::default()).with_sink(&mut shown);
        assemble(&mut ctx, &Stand, &Frame::xy(), &m).unwrap();
    }
    assert!(shown.names().contains(&"Bracket/base outline"));
}

// ── Catalog ─────────────────────────────────────────────────────

#[test]
fn catalog_lookup() {
    let mut catalog = PartCatalog::new();
    catalog.register(Bracket).register(Stand);
    assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Bracket", "Stand"]);
    assert_eq!(catalog.get("Stand").unwrap().name(), "Stand");
    assert!(matches!(catalog.get("Nope"), Err(BuildError::UnknownPart { .. })));
}

// ── Tags ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tag_round_trip(
        offset in prop::array::uniform3(-50.0..50.0f64),
        rotate in prop::array::uniform3(-180.0..180.0f64),
        steps in prop::collection::vec((0u8..4, -10.0..10.0f64), 0..8),
    ) {
        let mut wp = Workplane::new(Frame::xy().transformed(offset, rotate));
        let frame = *wp.frame();
        wp.tag("mark");
        for (op, x) in steps {
            match op {
                0 => { wp.offset(x); }
                1 => { wp.shift(x, -x); }
                2 => { wp.invert(); }
                _ => { wp.transformed([x, 0.0, 0.0], [x, x, 0.0]).tag("other"); }
            }
        }
        wp.from_tagged("mark").unwrap();
        prop_assert!(wp.frame().approx_eq(&frame, 1e-12));
    }
}
