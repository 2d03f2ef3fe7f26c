//! Rebuild audio from a saved SVD model.

use super::common;
use clap::Args;
use sonance_io::{ModelFile, write_resynthesis};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ReconstructArgs {
    /// Model file written by `sonance decompose`
    #[arg(value_name = "MODEL")]
    model: PathBuf,

    /// Components to keep: `i` or inclusive `a:b` (default from config, else 0)
    #[arg(value_name = "KEEP")]
    keep: Vec<String>,

    /// Output WAV file
    #[arg(short, long, default_value = "reconstruction.wav")]
    output: PathBuf,
}

pub fn run(args: ReconstructArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = common::load_config(config_path)?;
    config.validate()?;
    let keep = common::keep_set(&args.keep, &config)?;

    println!("Loading {}...", args.model.display());
    let ModelFile {
        sample_rate,
        mut model,
    } = ModelFile::load(&args.model)?;
    let (frames, bins) = model.shape();
    println!(
        "  {frames} frames x {bins} bins, {} components, {sample_rate} Hz",
        model.k()
    );

    let k = model.k();
    if let Some(max) = keep.max().filter(|&max| max >= k) {
        tracing::warn!(max, k, "keep indices beyond the model are ignored");
    }
    println!("  keeping components {keep}");
    model.mask(keep.iter_below(k));

    let spectrogram = model.reconstruct();
    let samples = common::resynthesizer(&config).resynthesize(&spectrogram);

    println!("Writing {}...", args.output.display());
    write_resynthesis(&args.output, &samples, sample_rate)?;
    println!("Done!");
    Ok(())
}
