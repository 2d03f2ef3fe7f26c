//! Unmodified and rank-truncated resynthesis of a clip.

use super::common::{self, ClipArgs, WindowArgs};
use clap::Args;
use sonance_analysis::SvdModel;
use sonance_io::write_resynthesis;
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ResynthArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    clip: ClipArgs,

    #[command(flatten)]
    window: WindowArgs,

    /// Singular components to keep: `i` or inclusive `a:b` (default from config, else 0)
    #[arg(short, long, num_args = 1.., value_name = "INDEX")]
    keep: Vec<String>,

    /// Directory for resynth.wav and resynth_truncated.wav
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

pub fn run(args: ResynthArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = common::load_config(config_path)?;
    args.clip.apply(&mut config);
    args.window.apply(&mut config);
    config.validate()?;
    let keep = common::keep_set(&args.keep, &config)?;

    let clip = common::read_clip(&args.input, &config)?;
    let spectrogram = common::analyze(&clip, config.window.params())?;

    let pb = common::spinner("computing singular value decomposition")?;
    let model = SvdModel::from_spectrogram(&spectrogram)?;
    pb.finish_and_clear();
    println!(
        "  keeping {} of {} components ({:.1}% of energy)",
        keep.count_below(model.k()),
        model.k(),
        100.0 * model.energy_fraction(keep.iter_below(model.k()))
    );
    let k = model.k();
    let truncated = model.masked(keep.iter_below(k)).reconstruct();

    let resynth = common::resynthesizer(&config);
    std::fs::create_dir_all(&args.out_dir)?;

    let plain_path = args.out_dir.join("resynth.wav");
    println!("Writing {}...", plain_path.display());
    write_resynthesis(&plain_path, &resynth.resynthesize(&spectrogram), clip.sample_rate)?;

    let truncated_path = args.out_dir.join("resynth_truncated.wav");
    println!("Writing {}...", truncated_path.display());
    write_resynthesis(&truncated_path, &resynth.resynthesize(&truncated), clip.sample_rate)?;

    println!("Done!");
    Ok(())
}
