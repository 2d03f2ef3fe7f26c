//! Modulation amplification command.

use super::common::{self, ClipArgs, WindowArgs};
use anyhow::Context;
use clap::Args;
use sonance_analysis::{ModulationAmplifier, Passband};
use sonance_io::write_resynthesis;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct AmplifyArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Gain applied to modulation inside the passband
    #[arg(long)]
    gain: Option<f32>,

    /// Passband lower edge in Hz
    #[arg(long)]
    low_hz: Option<f32>,

    /// Passband upper edge in Hz
    #[arg(long)]
    high_hz: Option<f32>,

    /// Pyramid level to amplify (repeatable; default: all)
    #[arg(long = "level", value_name = "LEVEL")]
    levels: Vec<usize>,

    /// Number of pyramid levels (default: log2 of the bin count)
    #[arg(long)]
    depth: Option<usize>,

    #[command(flatten)]
    clip: ClipArgs,

    #[command(flatten)]
    window: WindowArgs,
}

pub fn run(args: AmplifyArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = common::load_config(config_path)?;
    args.clip.apply(&mut config);
    args.window.apply(&mut config);
    if let Some(gain) = args.gain {
        config.amplify.gain = gain;
    }
    if args.low_hz.is_some() {
        config.amplify.low_hz = args.low_hz;
    }
    if args.high_hz.is_some() {
        config.amplify.high_hz = args.high_hz;
    }
    if !args.levels.is_empty() {
        config.amplify.levels.clone_from(&args.levels);
    }
    config.validate()?;

    let passband: Passband = config
        .amplify
        .passband()
        .context("a passband is required: pass --low-hz and --high-hz or set them in [amplify]")?;

    let clip = common::read_clip(&args.input, &config)?;
    let params = config.window.params();
    let spectrogram = common::analyze(&clip, params)?;

    let mut amplifier = ModulationAmplifier::for_analysis(
        clip.sample_rate as f32,
        params,
        passband,
        config.amplify.gain,
    )?;
    if !config.amplify.levels.is_empty() {
        amplifier = amplifier.with_levels(config.amplify.levels.iter().copied());
    }
    println!(
        "  amplifying {:.2}-{:.2} Hz modulation by {} (frame rate {:.1} Hz)",
        passband.low_hz,
        passband.high_hz,
        config.amplify.gain,
        amplifier.frame_rate()
    );

    let pb = common::spinner("decomposing and amplifying")?;
    let amplified = amplifier.apply(&spectrogram, args.depth)?;
    pb.finish_and_clear();

    let samples = common::resynthesizer(&config).resynthesize(&amplified);
    println!("Writing {}...", args.output.display());
    write_resynthesis(&args.output, &samples, clip.sample_rate)?;
    println!("Done!");
    Ok(())
}
