//! Overlap-add resynthesis: the inverse of [`StftAnalyzer`](crate::StftAnalyzer).
//!
//! Each spectrogram row is inverse-transformed at the window length `W` (the row
//! is truncated or zero-padded to `W` bins first), its real part is kept, and it
//! is added into the output at offset `S * i`. The output has `S * (T - 1) + W`
//! samples.
//!
//! Hamming-tapered analysis at 50% overlap is only approximately inverted: the
//! overlapped tapers sum to roughly 1.08, not exactly 1.

use ndarray::ArrayViewD;
use num_complex::Complex32;

use crate::error::Result;
use crate::fft::Fft;
use crate::framer::WindowParams;
use crate::spectrogram::Spectrogram;

/// Fraction of signed 16-bit full scale the output peak is mapped to.
pub const PEAK_HEADROOM: f32 = 0.9;

/// How the accumulated overlap-add buffer is scaled on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Map the peak absolute amplitude to 90% of signed 16-bit full scale and
    /// quantize to integer samples.
    #[default]
    Peak16,
    /// Return the raw floating-point overlap-add result.
    None,
}

/// Resynthesized samples, in the representation chosen by [`Normalization`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resynthesis {
    /// Quantized 16-bit samples.
    Pcm16(Vec<i16>),
    /// Unscaled floating-point samples.
    Float(Vec<f32>),
}

impl Resynthesis {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Resynthesis::Pcm16(samples) => samples.len(),
            Resynthesis::Float(samples) => samples.len(),
        }
    }

    /// True when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples as floats; 16-bit samples keep their integer values.
    pub fn into_f32(self) -> Vec<f32> {
        match self {
            Resynthesis::Pcm16(samples) => samples.into_iter().map(f32::from).collect(),
            Resynthesis::Float(samples) => samples,
        }
    }
}

/// Overlap-add resynthesizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resynthesizer {
    normalization: Normalization,
    trim_leading: bool,
}

impl Resynthesizer {
    /// Create a resynthesizer with the given output normalization.
    pub fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            trim_leading: false,
        }
    }

    /// Drop the first `W` samples, where only one window contributes.
    pub fn with_trim_leading(mut self, trim: bool) -> Self {
        self.trim_leading = trim;
        self
    }

    /// Output normalization.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Whether the leading partial-overlap region is trimmed.
    pub fn trims_leading(&self) -> bool {
        self.trim_leading
    }

    /// Raw overlap-add of a spectrogram (trimmed if configured, never scaled).
    pub fn overlap_add(&self, spectrogram: &Spectrogram) -> Vec<f32> {
        let params = spectrogram.params();
        let mut signal = overlap_add_rows(spectrogram, params);
        if self.trim_leading {
            let cut = params.window.min(signal.len());
            signal.drain(..cut);
        }
        signal
    }

    /// Resynthesize a spectrogram.
    pub fn resynthesize(&self, spectrogram: &Spectrogram) -> Resynthesis {
        let signal = self.overlap_add(spectrogram);
        match self.normalization {
            Normalization::Peak16 => Resynthesis::Pcm16(peak_normalize_pcm16(&signal)),
            Normalization::None => Resynthesis::Float(signal),
        }
    }

    /// Resynthesize a dynamically-shaped array, which must be 2-D.
    pub fn resynthesize_array(
        &self,
        data: ArrayViewD<'_, Complex32>,
        params: WindowParams,
    ) -> Result<Resynthesis> {
        let spectrogram = Spectrogram::from_dyn(data, params)?;
        Ok(self.resynthesize(&spectrogram))
    }
}

fn overlap_add_rows(spectrogram: &Spectrogram, params: WindowParams) -> Vec<f32> {
    let num_frames = spectrogram.num_frames();
    let mut signal = vec![0.0f32; params.overlap_add_len(num_frames)];
    if num_frames == 0 {
        return signal;
    }

    let ifft = Fft::new(params.window);
    for (i, row) in spectrogram.data().rows().into_iter().enumerate() {
        let row: Vec<Complex32> = row.iter().copied().collect();
        let snippet = ifft.inverse_from(&row);
        let offset = params.step * i;
        for (out, value) in signal[offset..offset + params.window].iter_mut().zip(snippet) {
            *out += value.re;
        }
    }

    tracing::debug!(frames = num_frames, samples = signal.len(), "overlap-add");
    signal
}

/// Scale so the peak absolute sample maps to 90% of signed 16-bit full scale,
/// then truncate to `i16`.
///
/// A silent (all-zero) input stays silent.
pub fn peak_normalize_pcm16(signal: &[f32]) -> Vec<i16> {
    let peak = signal.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak <= 0.0 || !peak.is_finite() {
        if !signal.is_empty() {
            tracing::warn!(peak, "resynthesized signal has no usable peak; writing silence");
        }
        return vec![0; signal.len()];
    }
    let scale = 32768.0 * PEAK_HEADROOM / peak;
    signal.iter().map(|&s| (s * scale) as i16).collect()
}
