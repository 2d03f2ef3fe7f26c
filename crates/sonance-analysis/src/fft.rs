//! FFT wrapper with taper (window) functions.
//!
//! Unlike a magnitude-only analyzer, everything here keeps the full complex
//! spectrum (`N` bins, negative frequencies included) so a spectrogram can be
//! inverted, factored, and resynthesized.

use num_complex::Complex32;
use rustfft::FftPlanner;
use std::f32::consts::PI;
use std::sync::Arc;

/// Taper applied to each window before the forward transform.
///
/// All shapes are the symmetric form: the first and last coefficients are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// Rectangular (no tapering)
    Rectangular,
    /// Hamming: `0.54 - 0.46 cos(2πi / (W - 1))`
    #[default]
    Hamming,
    /// Hann (raised cosine reaching zero at the edges)
    Hann,
    /// Blackman
    Blackman,
}

impl Window {
    /// Taper coefficient `i` of a window of length `size`.
    fn coefficient(self, i: usize, size: usize) -> f32 {
        if size < 2 {
            return 1.0;
        }
        let x = 2.0 * PI * i as f32 / (size - 1) as f32;
        match self {
            Window::Rectangular => 1.0,
            Window::Hamming => 0.54 - 0.46 * x.cos(),
            Window::Hann => 0.5 - 0.5 * x.cos(),
            Window::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
        }
    }

    /// Multiply a buffer by the taper in place.
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.coefficient(i, n);
        }
    }

    /// Taper coefficients for a window of `size` samples.
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        (0..size).map(|i| self.coefficient(i, size)).collect()
    }
}

/// Planned forward/inverse complex FFT of a fixed length.
#[derive(Clone)]
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    ifft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl std::fmt::Debug for Fft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft").field("size", &self.size).finish()
    }
}

impl Fft {
    /// Plan transforms of length `size`.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self::with_planner(&mut planner, size)
    }

    /// Plan transforms of length `size`, reusing an existing planner's cache.
    pub fn with_planner(planner: &mut FftPlanner<f32>, size: usize) -> Self {
        Self {
            fft: planner.plan_fft_forward(size),
            ifft: planner.plan_fft_inverse(size),
            size,
        }
    }

    /// Transform length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward transform of a real sequence.
    ///
    /// The input is zero-padded, or truncated, to the transform length. All
    /// `size` bins are returned.
    pub fn forward_real(&self, input: &[f32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = input
            .iter()
            .take(self.size)
            .map(|&x| Complex32::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex32::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        buffer
    }

    /// Forward transform in place (unnormalized).
    pub fn forward(&self, buffer: &mut [Complex32]) {
        self.fft.process(buffer);
    }

    /// Inverse transform of a spectrum, normalized by `1 / size`.
    ///
    /// The spectrum is truncated, or zero-padded, to the transform length first.
    pub fn inverse_from(&self, spectrum: &[Complex32]) -> Vec<Complex32> {
        let mut buffer: Vec<Complex32> = spectrum.iter().take(self.size).copied().collect();
        buffer.resize(self.size, Complex32::new(0.0, 0.0));
        self.inverse(&mut buffer);
        buffer
    }

    /// Inverse transform in place, normalized by `1 / size`.
    pub fn inverse(&self, buffer: &mut [Complex32]) {
        self.ifft.process(buffer);
        let scale = 1.0 / self.size as f32;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamming_is_symmetric_with_expected_edges() {
        let coeffs = Window::Hamming.coefficients(1024);
        assert!((coeffs[0] - 0.08).abs() < 1e-6);
        assert!((coeffs[1023] - 0.08).abs() < 1e-6);
        for i in 0..512 {
            assert!((coeffs[i] - coeffs[1023 - i]).abs() < 1e-5);
        }
        let odd = Window::Hamming.coefficients(5);
        assert!((odd[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn single_sample_window_is_unity() {
        assert_eq!(Window::Hamming.coefficients(1), vec![1.0]);
        assert_eq!(Window::Hann.coefficients(0), Vec::<f32>::new());
    }

    #[test]
    fn forward_inverse_roundtrip() {
        let fft = Fft::new(256);
        let input: Vec<f32> = (0..256)
            .map(|i| (2.0 * PI * 10.0 * i as f32 / 256.0).sin())
            .collect();

        let spectrum = fft.forward_real(&input);
        assert_eq!(spectrum.len(), 256);
        let back = fft.inverse_from(&spectrum);

        for (a, b) in input.iter().zip(back.iter()) {
            assert!((a - b.re).abs() < 1e-4, "Mismatch: {} vs {}", a, b.re);
            assert!(b.im.abs() < 1e-4);
        }
    }

    #[test]
    fn forward_zero_pads_short_input() {
        let fft = Fft::new(8);
        let spectrum = fft.forward_real(&[1.0, 1.0]);
        // DC bin is the sum of the samples
        assert!((spectrum[0].re - 2.0).abs() < 1e-6);
        assert_eq!(spectrum.len(), 8);
    }

    #[test]
    fn real_input_has_conjugate_symmetric_spectrum() {
        let fft = Fft::new(64);
        let input: Vec<f32> = (0..64).map(|i| (i as f32 * 0.37).cos() + 0.1).collect();
        let spectrum = fft.forward_real(&input);
        for k in 1..32 {
            let diff = spectrum[k] - spectrum[64 - k].conj();
            assert!(diff.norm() < 1e-3, "bin {k} not symmetric");
        }
    }
}
