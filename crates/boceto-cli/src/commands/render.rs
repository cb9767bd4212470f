//! Offline render command.

use clap::Args;
use std::path::PathBuf;

use boceto_model::Sketch;
use boceto_player::render_offline;

#[derive(Args)]
pub struct RenderArgs {
    /// Sketch JSON file
    #[arg(value_name = "SKETCH")]
    file: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Duration in seconds
    #[arg(long, default_value = "2.0")]
    seconds: f32,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let sketch = Sketch::load(&args.file)?;

    println!("Rendering '{}'...", sketch.name);
    println!("  {:.2}s at {} Hz", args.seconds, args.sample_rate);

    let frames = (args.seconds * args.sample_rate as f32) as usize;
    let samples = render_offline(&sketch, args.sample_rate as f32, frames)?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&args.output, spec)?;
    for sample in &samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    println!("Wrote {} samples to {}", samples.len(), args.output.display());
    Ok(())
}
