//! STFT-based complex spectrogram generation.
//!
//! A [`Spectrogram`] is a `T x N` complex matrix: row `i` is the `N`-point
//! spectrum of the tapered signal segment `[S*i, S*i + W)`. Full complex bins are
//! kept so the matrix can be factored and resynthesized.

use ndarray::{Array2, ArrayView1, ArrayViewD, Ix1, Ix2};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fft::{Fft, Window};
use crate::framer::WindowParams;

/// Complex time-frequency matrix plus the window descriptor that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrogram {
    data: Array2<Complex32>,
    params: WindowParams,
}

impl Spectrogram {
    /// Wrap an existing `[frame][bin]` matrix.
    pub fn new(data: Array2<Complex32>, params: WindowParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { data, params })
    }

    /// Wrap a matrix whose descriptor is already known to be valid.
    pub(crate) fn from_validated(data: Array2<Complex32>, params: WindowParams) -> Self {
        Self { data, params }
    }

    /// Wrap a dynamically-shaped array, which must be 2-D.
    pub fn from_dyn(data: ArrayViewD<'_, Complex32>, params: WindowParams) -> Result<Self> {
        let shape = data.shape().to_vec();
        let data = data
            .into_dimensionality::<Ix2>()
            .map_err(|_| {
                Error::invalid_shape(
                    "2-D spectrogram",
                    format!("{}-D array {:?}", shape.len(), shape),
                )
            })?;
        Self::new(data.to_owned(), params)
    }

    /// The complex `[frame][bin]` matrix.
    pub fn data(&self) -> &Array2<Complex32> {
        &self.data
    }

    /// Consume the spectrogram, returning its matrix.
    pub fn into_data(self) -> Array2<Complex32> {
        self.data
    }

    /// Window descriptor of the analysis that produced this matrix.
    pub fn params(&self) -> WindowParams {
        self.params
    }

    /// Same descriptor, different matrix.
    pub fn with_data(&self, data: Array2<Complex32>) -> Self {
        Self {
            data,
            params: self.params,
        }
    }

    /// Number of time frames (`T`).
    pub fn num_frames(&self) -> usize {
        self.data.nrows()
    }

    /// Number of frequency bins (`F`).
    pub fn num_bins(&self) -> usize {
        self.data.ncols()
    }

    /// `(frames, bins)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Spectrum of a single frame.
    pub fn frame(&self, frame: usize) -> Option<ArrayView1<'_, Complex32>> {
        (frame < self.num_frames()).then(|| self.data.row(frame))
    }

    /// Magnitude of every entry.
    pub fn magnitude(&self) -> Array2<f32> {
        self.data.mapv(|c| c.norm())
    }

    /// Frequency in Hz of a bin, for a signal sampled at `sample_rate`.
    pub fn bin_to_freq(&self, bin: usize, sample_rate: f32) -> f32 {
        bin as f32 * sample_rate / self.num_bins().max(1) as f32
    }

    /// Start time in seconds of a frame, for a signal sampled at `sample_rate`.
    pub fn frame_to_time(&self, frame: usize, sample_rate: f32) -> f32 {
        (frame * self.params.step) as f32 / sample_rate
    }

    /// Loudest non-negative-frequency bin (`0..=N/2`) of a frame.
    pub fn peak_bin(&self, frame: usize) -> Option<usize> {
        let spectrum = self.frame(frame)?;
        let half = self.num_bins() / 2 + 1;
        spectrum
            .iter()
            .take(half)
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
            .map(|(bin, _)| bin)
    }
}

/// STFT (Short-Time Fourier Transform) analyzer.
#[derive(Debug, Clone)]
pub struct StftAnalyzer {
    params: WindowParams,
    window: Window,
    taper: Vec<f32>,
    fft: Fft,
}

impl StftAnalyzer {
    /// Create an analyzer with a Hamming taper.
    pub fn new(params: WindowParams) -> Result<Self> {
        Self::with_window(params, Window::Hamming)
    }

    /// Create an analyzer with an explicit taper.
    pub fn with_window(params: WindowParams, window: Window) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            window,
            taper: window.coefficients(params.window),
            fft: Fft::new(params.fft_size),
        })
    }

    /// Window descriptor.
    pub fn params(&self) -> WindowParams {
        self.params
    }

    /// Taper in use.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Compute the `T x N` complex spectrogram of a signal.
    pub fn analyze(&self, signal: &[f32]) -> Result<Spectrogram> {
        let WindowParams {
            window,
            step,
            fft_size,
        } = self.params;
        let slices = self.params.slices(signal.len())?;
        let num_frames = slices.len();

        let dropped = signal.len() - self.params.overlap_add_len(num_frames).min(signal.len());
        tracing::debug!(
            samples = signal.len(),
            frames = num_frames,
            window,
            step,
            fft_size,
            dropped,
            "stft"
        );
        if num_frames == 0 && !signal.is_empty() {
            tracing::warn!(samples = signal.len(), window, "signal shorter than one window");
        }

        let mut data = Array2::<Complex32>::zeros((num_frames, fft_size));
        let mut segment = vec![0.0f32; window];
        for (i, range) in slices.enumerate() {
            for ((dst, &src), &w) in segment.iter_mut().zip(&signal[range]).zip(&self.taper) {
                *dst = src * w;
            }
            let spectrum = self.fft.forward_real(&segment);
            for (dst, src) in data.row_mut(i).iter_mut().zip(spectrum) {
                *dst = src;
            }
        }

        Ok(Spectrogram {
            data,
            params: self.params,
        })
    }

    /// Analyze a dynamically-shaped array, which must be 1-D.
    pub fn analyze_array(&self, signal: ArrayViewD<'_, f32>) -> Result<Spectrogram> {
        let shape = signal.shape().to_vec();
        let signal = signal
            .into_dimensionality::<Ix1>()
            .map_err(|_| {
                Error::invalid_shape(
                    "1-D signal",
                    format!("{}-D array {:?}", shape.len(), shape),
                )
            })?;
        match signal.as_slice() {
            Some(samples) => self.analyze(samples),
            None => self.analyze(&signal.to_vec()),
        }
    }
}
