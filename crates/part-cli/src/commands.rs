use std::path::Path;

use anyhow::{bail, Context, Result};
use kernel_bridge::{MockKernel, TruckKernel};
use measure_format::{
    discover_presets, export_stl, find_preset, load_preset_file, save_preset, MeasurePreset, StlFormat,
};
use modeling_ops::KernelBundle;
use part_engine::{assemble, BuildContext, BuildError, PartBuilder, TracingSink};
use part_library::{bundled_presets, catalog};
use part_types::{Frame, KernelTolerance, MeasureNode};
use tracing::{debug, info};

use crate::{BuildArgs, KernelChoice};

pub fn list(preset_dir: Option<&Path>) -> Result<()> {
    let mut presets = bundled_presets().context("bundled presets")?;
    if let Some(dir) = preset_dir {
        let found = discover_presets(dir).with_context(|| format!("presets in {}", dir.display()))?;
        debug!(count = found.len(), dir = %dir.display(), "discovered presets");
        presets.extend(found);
    }
    for name in catalog().names() {
        println!("{name}");
        for preset in presets.iter().filter(|p| p.part == name) {
            match &preset.metadata.description {
                Some(text) => println!("    {:<24} {text}", preset.name()),
                None => println!("    {}", preset.name()),
            }
        }
    }
    Ok(())
}

pub fn defaults(part: &str) -> Result<()> {
    let catalog = catalog();
    let builder = catalog.get(part)?;
    let preset = MeasurePreset::new(part, "default", builder.default_measures());
    println!("{}", save_preset(&preset)?);
    Ok(())
}

/// Measures and settings for a build: a preset file, a bundled preset, or
/// the part's defaults.
fn resolve(builder: &dyn PartBuilder, preset: Option<&str>) -> Result<(MeasureNode, KernelTolerance)> {
    let Some(preset) = preset else {
        return Ok((builder.default_measures(), KernelTolerance::default()));
    };
    let path = Path::new(preset);
    let found = if path.extension().is_some_and(|ext| ext == "json") || path.is_file() {
        load_preset_file(path)?
    } else {
        let bundled = bundled_presets()?;
        find_preset(&bundled, builder.name(), preset)?.clone()
    };
    if found.part != builder.name() {
        bail!("preset `{}` is for {}, not {}", found.name(), found.part, builder.name());
    }
    Ok((found.measures, found.settings))
}

pub fn build(args: &BuildArgs) -> Result<()> {
    let catalog = catalog();
    let builder = catalog.get(&args.part)?;
    let (mut measures, mut settings) = resolve(builder, args.preset.as_deref())?;
    if let Some(slack) = args.tolerance {
        settings.overlap_slack = slack;
    }
    settings.validate().map_err(anyhow::Error::msg).context("kernel settings")?;
    if args.debug {
        measures = measures.with("debug", true);
    }
    info!(part = builder.name(), kernel = ?args.kernel, "building");

    match args.kernel {
        KernelChoice::Mock => run(MockKernel::with_tolerance(settings), builder, &measures, settings, args),
        KernelChoice::Truck => run(TruckKernel::with_tolerance(settings), builder, &measures, settings, args),
    }
}

fn run<K: KernelBundle>(
    mut kernel: K,
    builder: &dyn PartBuilder,
    measures: &MeasureNode,
    settings: KernelTolerance,
    args: &BuildArgs,
) -> Result<()> {
    // Built lying on the print bed.
    let part = {
        let mut ctx = BuildContext::new(&mut kernel, settings).with_sink(TracingSink);
        assemble(&mut ctx, builder, &Frame::xy(), measures)?
    };
    let volume = part.volume(&kernel)?;
    let bbox = part.bounding_box(&kernel)?;
    let size = bbox.size();
    println!(
        "{}: {} piece(s), volume {volume:.2}, size {:.2} x {:.2} x {:.2}",
        part.name,
        part.piece_count(),
        size[0],
        size[1],
        size[2]
    );

    if let Some(path) = &args.stl {
        let format = if args.ascii { StlFormat::Ascii } else { StlFormat::Binary };
        let bytes = export_stl(&mut kernel, &part.solids, &part.name, settings.mesh, format)?;
        std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "stl written");
    }
    Ok(())
}

/// Error text for the terminal. Build failures name the part chain, the
/// step and the measure behind it.
pub fn describe_failure(err: &anyhow::Error) -> String {
    let Some(build) = err.downcast_ref::<BuildError>() else {
        return format!("error: {err:#}");
    };
    let mut out = String::from("error: build failed");
    let chain = build.part_chain();
    if !chain.is_empty() {
        out.push_str(&format!("\n  part:    {}", chain.join(" > ")));
    }
    if let Some(step) = build.step() {
        out.push_str(&format!("\n  step:    {step}"));
    }
    if let Some(path) = build.measure() {
        out.push_str(&format!("\n  measure: {path}"));
    }
    out.push_str(&format!("\n  cause:   {build}"));
    out
}
