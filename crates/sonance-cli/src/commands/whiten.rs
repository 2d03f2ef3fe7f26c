//! Spectral whitening command.

use super::common::{self, ClipArgs, WindowArgs};
use clap::Args;
use sonance_analysis::{normalize_total_power, total_power, whiten};
use sonance_io::write_resynthesis;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct WhitenArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    clip: ClipArgs,

    #[command(flatten)]
    window: WindowArgs,
}

pub fn run(args: WhitenArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = common::load_config(config_path)?;
    args.clip.apply(&mut config);
    args.window.apply(&mut config);
    config.validate()?;

    let clip = common::read_clip(&args.input, &config)?;
    let spectrogram = common::analyze(&clip, config.window.params())?;

    // keep the overall energy of the input
    let power = total_power(&spectrogram);
    let white = normalize_total_power(&whiten(&spectrogram)?, power)?;
    println!("  whitened {} bins, total power {power:.3e}", white.num_bins());

    let samples = common::resynthesizer(&config).resynthesize(&white);
    println!("Writing {}...", args.output.display());
    write_resynthesis(&args.output, &samples, clip.sample_rate)?;
    println!("Done!");
    Ok(())
}
