//! Window framing: how a sample sequence splits into overlapping windows.
//!
//! Pure index arithmetic, no transforms. Window `i` covers the half-open range
//! `[step * i, step * i + window)`. Any tail shorter than a full window is dropped.
//!
//! ```rust
//! use sonance_analysis::framer::{num_windows, slices};
//!
//! assert_eq!(num_windows(2048, 1024, 512).unwrap(), 3);
//! let ranges: Vec<_> = slices(2048, 1024, 512).unwrap().collect();
//! assert_eq!(ranges, vec![0..1024, 512..1536, 1024..2048]);
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Window descriptor: window size, hop between windows, and transform length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowParams {
    /// Samples per window (`W`).
    pub window: usize,
    /// Samples between consecutive window starts (`S`).
    pub step: usize,
    /// Fourier transform length (`N`); the spectrogram has `N` frequency bins.
    pub fft_size: usize,
}

impl WindowParams {
    /// Half-overlapping windows with a transform as long as the window.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            step: (window / 2).max(1),
            fft_size: window,
        }
    }

    /// Back-to-back windows (step equals window) with a transform as long as the window.
    pub fn non_overlapping(window: usize) -> Self {
        Self {
            window,
            step: window,
            fft_size: window,
        }
    }

    /// Replace the hop size.
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Replace the transform length.
    pub fn with_fft_size(mut self, fft_size: usize) -> Self {
        self.fft_size = fft_size;
        self
    }

    /// Check that window, step, and transform length are all positive.
    pub fn validate(&self) -> Result<()> {
        check_framing(self.window, self.step)?;
        if self.fft_size == 0 {
            return Err(Error::InvalidWindowConfig(
                "transform length must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of full windows that fit in `length` samples.
    pub fn num_windows(&self, length: usize) -> Result<usize> {
        num_windows(length, self.window, self.step)
    }

    /// Window ranges over a sequence of `length` samples.
    pub fn slices(&self, length: usize) -> Result<WindowSlices> {
        slices(length, self.window, self.step)
    }

    /// Length of the overlap-add output for `num_windows` windows: `S * (T - 1) + W`.
    ///
    /// Zero windows produce zero samples.
    pub fn overlap_add_len(&self, num_windows: usize) -> usize {
        match num_windows {
            0 => 0,
            t => self.step * (t - 1) + self.window,
        }
    }
}

impl Default for WindowParams {
    fn default() -> Self {
        Self::new(1024)
    }
}

fn check_framing(window: usize, step: usize) -> Result<()> {
    if window == 0 {
        return Err(Error::InvalidWindowConfig("window size must be positive".into()));
    }
    if step == 0 {
        return Err(Error::InvalidWindowConfig("step size must be positive".into()));
    }
    Ok(())
}

/// Number of windows: `max(0, floor((length - window + step) / step))`.
pub fn num_windows(length: usize, window: usize, step: usize) -> Result<usize> {
    check_framing(window, step)?;
    // length - window + step, without going negative in unsigned arithmetic
    Ok(match (length + step).checked_sub(window) {
        Some(numerator) => numerator / step,
        None => 0,
    })
}

/// Lazy sequence of window ranges over a sequence of `length` samples.
///
/// The iterator is `Clone`, so a saved copy restarts the sequence.
pub fn slices(length: usize, window: usize, step: usize) -> Result<WindowSlices> {
    let count = num_windows(length, window, step)?;
    Ok(WindowSlices {
        window,
        step,
        next: 0,
        count,
    })
}

/// Iterator over half-open window ranges, see [`slices`].
#[derive(Debug, Clone)]
pub struct WindowSlices {
    window: usize,
    step: usize,
    next: usize,
    count: usize,
}

impl Iterator for WindowSlices {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let start = self.step * self.next;
        self.next += 1;
        Some(start..start + self.window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowSlices {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn counts_for_reference_triples() {
        assert_eq!(num_windows(1024, 1024, 512).unwrap(), 1);
        assert_eq!(num_windows(2048, 1024, 512).unwrap(), 3);
        // a single full window, however small the step
        assert_eq!(num_windows(10, 10, 1).unwrap(), 1);
    }

    #[test]
    fn short_signal_has_no_windows() {
        assert_eq!(num_windows(100, 1024, 512).unwrap(), 0);
        assert_eq!(num_windows(0, 4, 4).unwrap(), 0);
        assert_eq!(slices(100, 1024, 512).unwrap().count(), 0);
    }

    #[test]
    fn tail_is_dropped() {
        let ranges: Vec<_> = slices(11, 4, 4).unwrap().collect();
        assert_eq!(ranges, vec![0..4, 4..8]);
    }

    #[test]
    fn zero_step_or_window_is_rejected() {
        assert!(matches!(
            num_windows(100, 10, 0),
            Err(Error::InvalidWindowConfig(_))
        ));
        assert!(matches!(
            num_windows(100, 0, 5),
            Err(Error::InvalidWindowConfig(_))
        ));
        assert!(WindowParams::new(1024).with_fft_size(0).validate().is_err());
    }

    #[test]
    fn descriptor_and_free_functions_report_the_same_error() {
        let params = WindowParams::new(1024).with_step(0);
        assert_eq!(params.validate(), num_windows(4096, 1024, 0).map(|_| ()));
        let params = WindowParams { window: 0, step: 4, fft_size: 8 };
        assert_eq!(params.validate(), slices(4096, 0, 4).map(|_| ()));
    }

    #[test]
    fn slices_restart_from_a_clone() {
        let slices = slices(4096, 1024, 512).unwrap();
        let first: Vec<_> = slices.clone().collect();
        let second: Vec<_> = slices.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 7);
    }

    #[test]
    fn default_params_half_overlap() {
        let params = WindowParams::default();
        assert_eq!(params.window, 1024);
        assert_eq!(params.step, 512);
        assert_eq!(params.fft_size, 1024);
        assert_eq!(WindowParams::non_overlapping(256).step, 256);
    }

    #[test]
    fn overlap_add_length() {
        let params = WindowParams::new(1024);
        assert_eq!(params.overlap_add_len(0), 0);
        assert_eq!(params.overlap_add_len(1), 1024);
        assert_eq!(params.overlap_add_len(3), 2048);
    }

    proptest! {
        #[test]
        fn emitted_count_matches_formula(
            length in 0usize..20_000,
            window in 1usize..2048,
            step in 1usize..2048,
        ) {
            let count = num_windows(length, window, step).unwrap();
            let ranges: Vec<_> = slices(length, window, step).unwrap().collect();
            prop_assert_eq!(ranges.len(), count);
            for (i, range) in ranges.iter().enumerate() {
                prop_assert_eq!(range.start, step * i);
                prop_assert_eq!(range.len(), window);
                prop_assert!(range.end <= length);
            }
        }
    }
}
