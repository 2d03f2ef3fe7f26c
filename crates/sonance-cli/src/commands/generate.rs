//! Test signal generation command.

use clap::Args;
use sonance_io::{WavSpec, write_wav};
use std::f32::consts::PI;
use std::path::PathBuf;

#[derive(Args)]
pub struct GenerateArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Frequency in Hz
    #[arg(long, default_value = "440.0")]
    freq: f32,

    /// Duration in seconds
    #[arg(long, default_value = "2.0")]
    duration: f32,

    /// Amplitude (0-1)
    #[arg(long, default_value = "0.8")]
    amplitude: f32,

    /// Sample rate
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "16")]
    bit_depth: u16,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    if !(args.duration > 0.0) {
        anyhow::bail!("duration must be positive, got {}", args.duration);
    }
    if args.sample_rate == 0 {
        anyhow::bail!("sample rate must be positive");
    }

    let num_samples = (args.duration * args.sample_rate as f32) as usize;
    let samples = sine(args.freq, args.amplitude, args.sample_rate as f32, num_samples);

    println!(
        "Generating {} Hz sine, {:.2}s at {} Hz...",
        args.freq, args.duration, args.sample_rate
    );
    let spec = WavSpec {
        channels: 1,
        sample_rate: args.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    write_wav(&args.output, &samples, spec)?;
    println!("Saved to {}", args.output.display());
    Ok(())
}

fn sine(freq: f32, amplitude: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate).sin())
        .collect()
}
