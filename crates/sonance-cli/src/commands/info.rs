//! Display WAV file metadata and STFT framing.

use super::common::{self, WindowArgs};
use clap::Args;
use sonance_io::{WavFormat, read_wav_info};
use std::path::{Path, PathBuf};

/// Display WAV file information.
#[derive(Args)]
pub struct InfoArgs {
    /// Path to the WAV file
    pub file: PathBuf,

    #[command(flatten)]
    window: WindowArgs,
}

/// Run the info command.
pub fn run(args: InfoArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = common::load_config(config_path)?;
    args.window.apply(&mut config);
    config.validate()?;
    let params = config.window.params();

    let info = read_wav_info(&args.file)?;
    let format_str = match info.format {
        WavFormat::Pcm => "PCM",
        WavFormat::IeeeFloat => "IEEE Float",
    };
    let sample_rate = info.spec.sample_rate as f32;

    println!("File:        {}", args.file.display());
    println!("Format:      {} {}-bit", format_str, info.spec.bits_per_sample);
    println!("Channels:    {}", info.spec.channels);
    println!("Sample Rate: {} Hz", info.spec.sample_rate);
    println!(
        "Duration:    {:.3}s ({} frames)",
        info.duration_secs, info.num_frames
    );

    let windows = params.num_windows(info.num_frames as usize)?;
    println!();
    println!(
        "Window:      W={} S={} N={}",
        params.window, params.step, params.fft_size
    );
    println!("Windows:     {windows}");
    println!("Frame Rate:  {:.2} Hz", sample_rate / params.step as f32);
    println!(
        "Bin Width:   {:.2} Hz",
        sample_rate / params.fft_size as f32
    );

    Ok(())
}
