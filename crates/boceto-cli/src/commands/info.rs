//! Sketch inspection command.

use clap::Args;
use std::path::PathBuf;

use boceto_model::{ComponentKind, SKETCH_PRIMITIVE_MAX, Sketch};

#[derive(Args)]
pub struct InfoArgs {
    /// Sketch JSON file
    #[arg(value_name = "SKETCH")]
    file: PathBuf,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let sketch = Sketch::load(&args.file)?;
    let primitives = sketch.count_primitive_components();

    println!("Sketch: {}", sketch.name);
    println!("  Components: {}", sketch.components.len());
    println!(
        "  Primitive budget: {}/{} ({} remaining)",
        primitives,
        SKETCH_PRIMITIVE_MAX,
        SKETCH_PRIMITIVE_MAX - primitives
    );

    if !sketch.inputs.is_empty() {
        println!("  Input ports:");
        for (index, port) in sketch.inputs.iter().enumerate() {
            println!("    {}: {}", index, port.name);
        }
    }

    println!("  Graph:");
    for (id, component) in &sketch.components {
        println!(
            "    {} '{}' [{}] -> {} edge(s)",
            id,
            component.name,
            kind_name(&component.kind),
            component.output_destinations.len()
        );
    }
    Ok(())
}

fn kind_name(kind: &ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Amplifier => "amplifier",
        ComponentKind::Buffer => "buffer",
        ComponentKind::Differentiator => "differentiator",
        ComponentKind::Distributor => "distributor",
        ComponentKind::Divider => "divider",
        ComponentKind::Integrator => "integrator",
        ComponentKind::LowerSaturator => "lowerSaturator",
        ComponentKind::Mixer => "mixer",
        ComponentKind::Noise => "noise",
        ComponentKind::Saw => "saw",
        ComponentKind::Sine => "sine",
        ComponentKind::Square => "square",
        ComponentKind::Subtractor => "subtractor",
        ComponentKind::Triangle => "triangle",
        ComponentKind::UpperSaturator => "upperSaturator",
        ComponentKind::Input { .. } => "input",
        ComponentKind::KeyboardFrequency => "keyboardFrequency",
        ComponentKind::KeyboardSwitch => "keyboardSwitch",
        ComponentKind::Speaker => "speaker",
        ComponentKind::Meter => "meter",
        ComponentKind::Sketch { .. } => "sketch",
    }
}
