//! Sonance Analysis - spectral analysis, low-rank modelling, and resynthesis
//!
//! This crate is the numeric engine behind `sonance`:
//!
//! - [`framer`] - how a sample sequence splits into overlapping windows
//! - [`fft`] - complex FFT wrapper and taper functions
//! - [`spectrogram`] - STFT analysis into a complex `T x N` spectrogram
//! - [`resynth`] - overlap-add resynthesis back to samples
//! - [`power`] - power profile, whitening/unwhitening, total-energy normalization
//! - [`svd`] - SVD factor model with masking and rank-truncated reconstruction
//! - [`pyramid`] - Laplacian pyramid over the frequency axis
//! - [`modulation`] - band-selective amplification of slow amplitude modulation
//!
//! Everything is synchronous and side-effect free; each operation returns a
//! fresh matrix. The one in-place mutation is [`SvdModel::mask`], which needs
//! exclusive access to the model.
//!
//! ## Example Workflow
//!
//! ```rust
//! use sonance_analysis::{Normalization, Resynthesizer, StftAnalyzer, SvdModel, WindowParams};
//! use std::f32::consts::PI;
//!
//! let signal: Vec<f32> = (0..22050)
//!     .map(|i| (2.0 * PI * 440.0 * i as f32 / 22050.0).sin())
//!     .collect();
//!
//! // 1. Analyze
//! let analyzer = StftAnalyzer::new(WindowParams::new(512))?;
//! let spectrogram = analyzer.analyze(&signal)?;
//!
//! // 2. Keep only the strongest singular component
//! let truncated = SvdModel::from_spectrogram(&spectrogram)?.masked([0]).reconstruct();
//!
//! // 3. Resynthesize to 16-bit samples
//! let pcm = Resynthesizer::new(Normalization::Peak16).resynthesize(&truncated);
//! assert!(!pcm.is_empty());
//! # Ok::<(), sonance_analysis::Error>(())
//! ```

pub mod error;
pub mod fft;
pub mod framer;
pub mod modulation;
pub mod power;
pub mod pyramid;
pub mod resynth;
pub mod spectrogram;
pub mod svd;

// Re-export main types
pub use error::{Error, Result};
pub use fft::{Fft, Window};
pub use framer::{WindowParams, WindowSlices, num_windows, slices};
pub use modulation::{ModulationAmplifier, Passband};
pub use power::{normalize_total_power, power_profile, total_power, unwhiten, whiten, whiten_with};
pub use pyramid::{LaplacianPyramid, Pyramid, SMOOTHING_KERNEL, SpectralPyramid, default_levels};
pub use resynth::{Normalization, PEAK_HEADROOM, Resynthesis, Resynthesizer, peak_normalize_pcm16};
pub use spectrogram::{Spectrogram, StftAnalyzer};
pub use svd::{SvdModel, SvdRecord};

/// Complex sample type used for every spectrogram entry.
pub use num_complex::Complex32;
