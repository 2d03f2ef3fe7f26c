//! Waveform and model I/O for sonance.
//!
//! This crate provides:
//!
//! - **Clip reading**: [`Clip::read`] loads channel 0 of a WAV file, optionally
//!   restricted to a sample range
//! - **WAV writing**: [`write_pcm16`], [`write_wav`], and [`write_resynthesis`]
//! - **Model persistence**: [`ModelFile`] stores an SVD model with the sample
//!   rate of the clip it came from
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sonance_analysis::{Resynthesizer, StftAnalyzer, SvdModel, WindowParams};
//! use sonance_io::{Clip, ModelFile, write_resynthesis};
//!
//! let clip = Clip::read_secs("input.wav", 13.0, Some(20.0))?;
//! let spectrogram = StftAnalyzer::new(WindowParams::new(1024))?.analyze(&clip.samples)?;
//! let model = SvdModel::from_spectrogram(&spectrogram)?;
//! ModelFile::new(clip.sample_rate, model).save("model.json")?;
//!
//! let mut file = ModelFile::load("model.json")?;
//! file.model.mask([0, 1, 2]);
//! let pcm = Resynthesizer::default().resynthesize(&file.model.reconstruct());
//! write_resynthesis("reconstruction.wav", &pcm, file.sample_rate)?;
//! ```

mod model;
mod wav;

pub use model::ModelFile;
pub use wav::{
    Clip, WavFormat, WavInfo, WavSpec, read_wav_info, write_pcm16, write_resynthesis, write_wav,
};

/// Error types for clip and model I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model file could not be encoded or decoded.
    #[error("Model file error: {0}")]
    Model(#[from] serde_json::Error),

    /// A loaded model failed validation.
    #[error("Invalid model: {0}")]
    Analysis(#[from] sonance_analysis::Error),

    /// The requested sample range selects no samples.
    #[error("Empty clip: range {start}..{end} of a {available}-sample file")]
    EmptyClip {
        /// First requested sample.
        start: usize,
        /// One past the last requested sample (after clamping).
        end: usize,
        /// Samples per channel in the file.
        available: usize,
    },

    /// The requested output sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

/// Convenience result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
