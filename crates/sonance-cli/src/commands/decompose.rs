//! Analyze a clip and save its SVD model.

use super::common::{self, ClipArgs, WindowArgs};
use clap::Args;
use sonance_analysis::SvdModel;
use sonance_io::ModelFile;
use std::path::{Path, PathBuf};

/// Number of leading singular values printed.
const SHOWN_VALUES: usize = 8;

#[derive(Args)]
pub struct DecomposeArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Model file to write (JSON)
    #[arg(value_name = "MODEL")]
    model: PathBuf,

    #[command(flatten)]
    clip: ClipArgs,

    #[command(flatten)]
    window: WindowArgs,
}

pub fn run(args: DecomposeArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = common::load_config(config_path)?;
    args.clip.apply(&mut config);
    args.window.apply(&mut config);
    config.validate()?;

    let clip = common::read_clip(&args.input, &config)?;
    let spectrogram = common::analyze(&clip, config.window.params())?;

    let pb = common::spinner("computing singular value decomposition")?;
    let model = SvdModel::from_spectrogram(&spectrogram)?;
    pb.finish_and_clear();

    let shown: Vec<String> = model
        .singular_values()
        .iter()
        .take(SHOWN_VALUES)
        .map(|s| format!("{s:.3}"))
        .collect();
    println!("  {} components, leading: [{}]", model.k(), shown.join(", "));

    println!("Writing {}...", args.model.display());
    ModelFile::new(clip.sample_rate, model).save(&args.model)?;
    println!("Done!");
    Ok(())
}
