//! Laplacian pyramid over the frequency axis of a spectrogram.
//!
//! A trace of length `F` is smoothed with the 5-tap binomial kernel
//! `[1, 4, 6, 4, 1] / 16` by circular convolution (multiplication by the
//! kernel's transform). Each level yields `band = trace - smooth(trace)` and
//! recurses on `smooth(trace)`; what is left after the last level is the lowpass
//! residual, so `Σ bands + residual == trace`.
//!
//! Complex spectrograms are decomposed row by row, with the real and imaginary
//! parts handled as independent real traces.

use ndarray::{Array2, Axis};
use num_complex::Complex32;

use crate::error::{Error, Result};
use crate::fft::Fft;
use crate::framer::WindowParams;
use crate::spectrogram::Spectrogram;

/// Binomial smoothing kernel, centered on the middle tap.
pub const SMOOTHING_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Default number of levels for a trace of `len` samples: `floor(log2(len))`.
pub fn default_levels(len: usize) -> usize {
    if len == 0 { 0 } else { len.ilog2() as usize }
}

/// Laplacian pyramid for real traces of a fixed length.
#[derive(Debug, Clone)]
pub struct LaplacianPyramid {
    len: usize,
    levels: usize,
    kernel_spectrum: Vec<Complex32>,
    fft: Fft,
}

impl LaplacianPyramid {
    /// Pyramid for traces of `len` samples with `floor(log2(len))` levels.
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::invalid_shape("trace of at least 1 sample", "empty trace"));
        }
        let fft = Fft::new(len);

        // taps at offsets -2..=2, wrapped onto the circle
        let mut kernel = vec![0.0f32; len];
        for (tap, &weight) in SMOOTHING_KERNEL.iter().enumerate() {
            let offset = tap as isize - 2;
            let index = offset.rem_euclid(len as isize) as usize;
            kernel[index] += weight;
        }
        let kernel_spectrum = fft.forward_real(&kernel);

        Ok(Self {
            len,
            levels: default_levels(len),
            kernel_spectrum,
            fft,
        })
    }

    /// Override the number of levels.
    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Trace length this pyramid accepts.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a pyramid is never built for empty traces.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bands produced.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Circular convolution of a trace with [`SMOOTHING_KERNEL`].
    pub fn smooth(&self, trace: &[f32]) -> Result<Vec<f32>> {
        self.check_len(trace.len())?;
        Ok(self.smooth_unchecked(trace))
    }

    fn smooth_unchecked(&self, trace: &[f32]) -> Vec<f32> {
        let mut spectrum = self.fft.forward_real(trace);
        for (bin, k) in spectrum.iter_mut().zip(&self.kernel_spectrum) {
            *bin *= k;
        }
        self.fft.inverse(&mut spectrum);
        spectrum.into_iter().map(|c| c.re).collect()
    }

    /// Lazily computed detail bands of a trace, finest first.
    pub fn bands(&self, trace: &[f32]) -> Result<Bands<'_>> {
        self.check_len(trace.len())?;
        Ok(Bands {
            pyramid: self,
            current: trace.to_vec(),
            remaining: self.levels,
        })
    }

    /// All bands plus the lowpass residual.
    pub fn decompose(&self, trace: &[f32]) -> Result<Pyramid> {
        let mut bands = self.bands(trace)?;
        let collected: Vec<Vec<f32>> = bands.by_ref().collect();
        Ok(Pyramid {
            bands: collected,
            residual: bands.into_residual(),
        })
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.len {
            return Err(Error::invalid_shape(
                format!("trace of length {}", self.len),
                format!("length {len}"),
            ));
        }
        Ok(())
    }
}

/// Iterator over pyramid bands, see [`LaplacianPyramid::bands`].
///
/// Not restartable: decomposing again means calling `bands` again.
#[derive(Debug)]
pub struct Bands<'a> {
    pyramid: &'a LaplacianPyramid,
    current: Vec<f32>,
    remaining: usize,
}

impl Bands<'_> {
    /// The smoothed trace left after the bands yielded so far.
    pub fn into_residual(self) -> Vec<f32> {
        self.current
    }
}

impl Iterator for Bands<'_> {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let smoothed = self.pyramid.smooth_unchecked(&self.current);
        let band = self
            .current
            .iter()
            .zip(&smoothed)
            .map(|(x, s)| x - s)
            .collect();
        self.current = smoothed;
        Some(band)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Bands<'_> {}

/// Bands and residual of one real trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Pyramid {
    /// Detail bands, finest first.
    pub bands: Vec<Vec<f32>>,
    /// Lowpass residual after the last level.
    pub residual: Vec<f32>,
}

impl Pyramid {
    /// Sum of all bands and the residual; reproduces the decomposed trace.
    pub fn collapse(&self) -> Vec<f32> {
        let mut out = self.residual.clone();
        for band in &self.bands {
            for (o, b) in out.iter_mut().zip(band) {
                *o += b;
            }
        }
        out
    }
}

/// Complex bands of a whole spectrogram, each `T x F`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralPyramid {
    /// Detail bands, finest first.
    pub bands: Vec<Array2<Complex32>>,
    /// Lowpass residual.
    pub residual: Array2<Complex32>,
    params: WindowParams,
}

impl SpectralPyramid {
    /// Decompose every frame of a spectrogram along frequency.
    ///
    /// `levels` defaults to `floor(log2(F))`.
    pub fn decompose(spectrogram: &Spectrogram, levels: Option<usize>) -> Result<Self> {
        let (frames, bins) = spectrogram.shape();
        let mut pyramid = LaplacianPyramid::new(bins)?;
        if let Some(levels) = levels {
            pyramid = pyramid.with_levels(levels);
        }
        let levels = pyramid.levels();

        let mut bands = vec![Array2::<Complex32>::zeros((frames, bins)); levels];
        let mut residual = Array2::<Complex32>::zeros((frames, bins));

        for (t, row) in spectrogram.data().axis_iter(Axis(0)).enumerate() {
            let re: Vec<f32> = row.iter().map(|c| c.re).collect();
            let im: Vec<f32> = row.iter().map(|c| c.im).collect();
            let re = pyramid.decompose(&re)?;
            let im = pyramid.decompose(&im)?;

            for (level, (band_re, band_im)) in re.bands.iter().zip(&im.bands).enumerate() {
                for (f, (&r, &i)) in band_re.iter().zip(band_im).enumerate() {
                    bands[level][[t, f]] = Complex32::new(r, i);
                }
            }
            for (f, (&r, &i)) in re.residual.iter().zip(&im.residual).enumerate() {
                residual[[t, f]] = Complex32::new(r, i);
            }
        }

        tracing::debug!(frames, bins, levels, "laplacian pyramid");
        Ok(Self {
            bands,
            residual,
            params: spectrogram.params(),
        })
    }

    /// Number of detail bands.
    pub fn levels(&self) -> usize {
        self.bands.len()
    }

    /// Window descriptor of the decomposed spectrogram.
    pub fn params(&self) -> WindowParams {
        self.params
    }

    /// Re-sum bands and residual into a spectrogram.
    pub fn collapse(&self) -> Spectrogram {
        let mut data = self.residual.clone();
        for band in &self.bands {
            data += band;
        }
        Spectrogram::from_validated(data, self.params)
    }
}
