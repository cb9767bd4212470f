//! Sketch validation command.

use clap::Args;
use std::path::PathBuf;

use boceto_model::Sketch;
use boceto_player::compile;

#[derive(Args)]
pub struct CheckArgs {
    /// Sketch JSON file
    #[arg(value_name = "SKETCH")]
    file: PathBuf,

    /// Sample rate to compile at
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let sketch = Sketch::load(&args.file)?;
    let compiled = compile(&sketch, args.sample_rate as f32)?;

    println!("OK: '{}'", sketch.name);
    println!(
        "  {} components, {} engine nodes",
        sketch.components.len(),
        compiled.node_count()
    );
    if compiled.sink().is_none() {
        println!("  note: no speaker component, the sketch renders silence");
    }
    Ok(())
}
