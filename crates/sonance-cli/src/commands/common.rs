//! Shared CLI helpers used across multiple commands.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sonance_analysis::{Normalization, Resynthesizer, Spectrogram, StftAnalyzer, WindowParams};
use sonance_config::{AnalysisConfig, KeepSet};
use sonance_io::Clip;
use std::path::Path;
use std::time::Duration;

/// Clip range flags; unset flags fall back to the config file.
#[derive(Args, Debug, Default)]
pub struct ClipArgs {
    /// Start time in seconds
    #[arg(short = 's', long = "start", value_name = "SECS")]
    pub start_secs: Option<f64>,

    /// End time in seconds
    #[arg(short = 'f', long = "end", value_name = "SECS")]
    pub end_secs: Option<f64>,
}

impl ClipArgs {
    /// Apply the flags on top of `config`.
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(start) = self.start_secs {
            config.clip.start_secs = start;
        }
        if let Some(end) = self.end_secs {
            config.clip.end_secs = Some(end);
        }
    }
}

/// Window framing flags; unset flags fall back to the config file.
#[derive(Args, Debug, Default)]
pub struct WindowArgs {
    /// Window size in samples
    #[arg(long = "window", value_name = "SAMPLES")]
    pub size: Option<usize>,

    /// Step between windows (default: half the window)
    #[arg(long, value_name = "SAMPLES")]
    pub step: Option<usize>,

    /// FFT length (default: the window size)
    #[arg(long, value_name = "SAMPLES")]
    pub fft_size: Option<usize>,
}

impl WindowArgs {
    /// Apply the flags on top of `config`.
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(size) = self.size {
            config.window.size = size;
        }
        if self.step.is_some() {
            config.window.step = self.step;
        }
        if self.fft_size.is_some() {
            config.window.fft_size = self.fft_size;
        }
    }
}

/// Load the config file (explicit or discovered) without validating it.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    let config = AnalysisConfig::load_or_discover(path)?;
    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    Ok(config)
}

/// Keep-set from command-line tokens, or the config's when none are given.
pub fn keep_set(tokens: &[String], config: &AnalysisConfig) -> anyhow::Result<KeepSet> {
    let keep = if tokens.is_empty() {
        config.svd.keep_set()?
    } else {
        KeepSet::parse(tokens)?
    };
    Ok(keep)
}

/// Read the configured clip range of `path`.
pub fn read_clip(path: &Path, config: &AnalysisConfig) -> anyhow::Result<Clip> {
    println!("Reading {}...", path.display());
    let clip = Clip::read_secs(path, config.clip.start_secs, config.clip.end_secs)?;
    println!(
        "  {} samples, {} Hz, {:.2}s",
        clip.len(),
        clip.sample_rate,
        clip.duration_secs()
    );
    Ok(clip)
}

/// STFT of a clip with the configured window.
pub fn analyze(clip: &Clip, params: WindowParams) -> anyhow::Result<Spectrogram> {
    let pb = spinner("computing spectrogram")?;
    let spectrogram = StftAnalyzer::new(params)?.analyze(&clip.samples)?;
    pb.finish_and_clear();
    let (frames, bins) = spectrogram.shape();
    println!(
        "  spectrogram: {frames} frames x {bins} bins (W={}, S={}, N={})",
        params.window, params.step, params.fft_size
    );
    Ok(spectrogram)
}

/// Resynthesizer for the configured output bit depth.
pub fn resynthesizer(config: &AnalysisConfig) -> Resynthesizer {
    match config.output.bit_depth {
        32 => Resynthesizer::new(Normalization::None),
        _ => Resynthesizer::new(Normalization::Peak16),
    }
}

/// Spinner for a step with no natural progress count.
pub fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
