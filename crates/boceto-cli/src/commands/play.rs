//! Live playback command.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use boceto_model::Sketch;
use boceto_player::{Player, PlayerConfig};

#[derive(Args)]
pub struct PlayArgs {
    /// Sketch JSON file
    #[arg(value_name = "SKETCH")]
    file: PathBuf,

    /// Output device name (uses the default device if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let sketch = Sketch::load(&args.file)?;

    let config = PlayerConfig {
        output_device: args.output,
    };
    let mut player = Player::run(&sketch, &config)?;

    println!(
        "Playing '{}' at {} Hz. Press Ctrl+C to stop.",
        sketch.name,
        player.sample_rate()
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        if let Some(fault) = player.poll_fault() {
            match &fault.component {
                Some(id) => println!(
                    "Fault: infinite feedback loop through component '{id}'. \
                     Insert a buffer component into the cycle to break it."
                ),
                None => println!("Fault: infinite feedback loop at engine node {}.", fault.node),
            }
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    player.stop();
    Ok(())
}
