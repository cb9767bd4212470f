//! Boceto CLI - command-line interface for the Boceto patch-graph synthesizer.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "boceto")]
#[command(author, version, about = "Boceto patch-graph synthesizer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and compile a sketch file
    Check(commands::check::CheckArgs),

    /// Show sketch structure and budget usage
    Info(commands::info::InfoArgs),

    /// Render a sketch to a WAV file
    Render(commands::render::RenderArgs),

    /// Play a sketch live on the default output device
    Play(commands::play::PlayArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => commands::check::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
    }
}
