use clap::{Args as ClapArgs, Parser, Subcommand};
use crossbeam::channel::unbounded;
use std::path::PathBuf;
use wavey::config::{EngineSettings, CONFIG};
use wavey::models::Progression;
use wavey::sequencer::Sequencer;
use wavey::Engine;

/// Stream a chord progression through the additive synthesizer
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a progression JSON file until Ctrl+C
    Run(RunArgs),
    /// Generate a default settings file and exit
    GenerateConfig(ConfigArgs),
}

#[derive(ClapArgs)]
struct RunArgs {
    /// Path to the progression JSON file
    #[arg(long)]
    path: PathBuf,
    /// Settings file; defaults to config.toml next to the crate manifest
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the progression tempo
    #[arg(long)]
    bpm: Option<f32>,
    /// Start with every voice enabled instead of only root, third and fifth
    #[arg(long, default_value_t = false)]
    all_voices: bool,
}

#[derive(ClapArgs)]
struct ConfigArgs {
    /// Output path for the generated settings
    #[arg(long, default_value = "config.toml")]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run_command(args)?,
        Commands::GenerateConfig(cfg) => {
            EngineSettings::generate_default(&cfg.out)?;
            println!("Generated default settings at {}", cfg.out.display());
        }
    }
    Ok(())
}

fn run_command(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = match &args.config {
        Some(path) => EngineSettings::load(path)?,
        None => CONFIG.clone(),
    };
    let mut progression = Progression::load(&args.path)?;
    if let Some(bpm) = args.bpm {
        progression.bpm = bpm;
    }
    if let Some(synth) = &progression.synth {
        settings.synth = synth.clone();
    }
    log::info!(
        "{} beats at {} bpm from {}",
        progression.beats.len(),
        progression.bpm,
        args.path.display()
    );

    let mut sequencer = Sequencer::new(progression, 0.0);
    let engine = Engine::init_with(&settings, move |handle, now| {
        if let Some(beat) = sequencer.update(now) {
            handle.apply_beat(beat, now);
        }
    })?;

    if !args.all_voices {
        let handle = engine.handle();
        handle.set_channel_enabled(3, false);
        handle.set_channel_enabled(4, false);
    }

    let (tx, rx) = unbounded();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    println!("Streaming {}... press Ctrl+C to stop", args.path.display());

    rx.recv()?;
    engine.shutdown();
    Ok(())
}
