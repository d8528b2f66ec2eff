//! remix - terminal sample remixer
//!
//! Run with: cargo run --bin remix -- path/to/loop.wav

mod app;
mod ui;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use app::Remix;
use saavy_remix::{
    engine::{RemixParams, SoundSource},
    sequencing::{Bpm, Preset},
    voices::{DrumKind, DrumPatch},
};

#[derive(Debug, Parser)]
#[command(name = "remix", version, about = "Chop a sample into a probability-driven remix")]
struct Cli {
    /// WAV file to remix
    path: PathBuf,

    /// Tempo in beats per minute
    #[arg(long, default_value_t = 120)]
    bpm: u32,

    /// Note-value probabilities: equal, chop, shuffle, swing, break, dub, slow
    #[arg(long, default_value = "chop")]
    preset: Preset,

    /// Slice fade-in in milliseconds
    #[arg(long, default_value_t = 5.0)]
    attack: f64,

    /// Slice fade-out after each step, in milliseconds
    #[arg(long, default_value_t = 0.0)]
    release: f64,

    /// Layer balance: 0 is remix only, 1 is background only
    #[arg(long, default_value_t = 0.0)]
    mix: f32,

    /// Master volume, 0 to 1
    #[arg(long, default_value_t = 1.0)]
    volume: f32,

    /// Seed for reproducible remixes
    #[arg(long)]
    seed: Option<u64>,

    /// What each step plays: slice, kick, snare, hihat, clap or bass
    #[arg(long, default_value = "slice")]
    source: String,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long)]
    log: Option<PathBuf>,
}

/// Everything the app needs to start, validated.
pub struct Config {
    pub path: PathBuf,
    pub params: RemixParams,
    pub preset: Preset,
    pub sound: SoundSource,
    pub seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> EyreResult<Config> {
        let bpm = Bpm::new(self.bpm).wrap_err("--bpm must be at least 1")?;
        let sound = parse_sound(&self.source)?;

        Ok(Config {
            path: self.path,
            params: RemixParams {
                bpm,
                attack_ms: self.attack,
                release_ms: self.release,
                master_volume: self.volume,
                mix_fader: self.mix,
                weights: self.preset.table(),
            },
            preset: self.preset,
            sound,
            seed: self.seed,
        })
    }
}

fn parse_sound(name: &str) -> EyreResult<SoundSource> {
    if name.eq_ignore_ascii_case("slice") {
        return Ok(SoundSource::Slice);
    }
    let kind: DrumKind = name.parse().wrap_err("unknown --source")?;
    Ok(SoundSource::Drum(DrumPatch::new(kind)))
}

/// The terminal belongs to the UI, so logs only go to a file.
fn init_logging(path: Option<&PathBuf>) -> EyreResult<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).wrap_err_with(|| format!("creating log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.log.as_ref())?;

    Remix::new(cli.into_config()?).run()
}
