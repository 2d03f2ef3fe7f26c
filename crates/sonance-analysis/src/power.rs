//! Per-bin power estimation, whitening, and total-energy normalization.
//!
//! The power profile of a spectrogram is the time-mean of `|X[t, f]|²` for each
//! bin `f`. Whitening divides each column by the square root of its profile
//! value; unwhitening multiplies it back. Bins with zero power cannot be
//! whitened and are reported as [`Error::DegenerateSpectrum`] instead of
//! producing infinities.

use ndarray::{Array1, Array2, Axis};
use num_complex::Complex32;

use crate::error::{Error, Result};
use crate::spectrogram::Spectrogram;

/// Mean over time of squared magnitude, per frequency bin (length `F`).
///
/// A spectrogram with no frames has an all-zero profile.
pub fn power_profile(spectrogram: &Spectrogram) -> Array1<f32> {
    let power = spectrogram.data().mapv(|c| c.norm_sqr());
    power
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(spectrogram.num_bins()))
}

/// Sum of `|entry|²` over the whole matrix.
pub fn total_power(spectrogram: &Spectrogram) -> f32 {
    spectrogram.data().iter().map(|c| c.norm_sqr()).sum()
}

/// Whiten a spectrogram by its own power profile.
pub fn whiten(spectrogram: &Spectrogram) -> Result<Spectrogram> {
    let profile = power_profile(spectrogram);
    whiten_with(spectrogram, &profile)
}

/// Divide each column `f` by `sqrt(profile[f])`.
pub fn whiten_with(spectrogram: &Spectrogram, profile: &Array1<f32>) -> Result<Spectrogram> {
    let gains = column_gains(spectrogram, profile)?;
    for (bin, &g) in gains.iter().enumerate() {
        if g <= 0.0 || !g.is_finite() {
            return Err(Error::DegenerateSpectrum(format!(
                "bin {bin} has power {}; cannot whiten",
                profile[bin]
            )));
        }
    }
    Ok(scale_columns(spectrogram, gains.mapv(|g| g.recip())))
}

/// Multiply each column `f` by `sqrt(profile[f])`, undoing [`whiten_with`].
pub fn unwhiten(spectrogram: &Spectrogram, profile: &Array1<f32>) -> Result<Spectrogram> {
    let gains = column_gains(spectrogram, profile)?;
    Ok(scale_columns(spectrogram, gains))
}

/// Rescale the whole matrix so its [`total_power`] equals `target`.
pub fn normalize_total_power(spectrogram: &Spectrogram, target: f32) -> Result<Spectrogram> {
    if !(target > 0.0 && target.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "target power must be positive and finite, got {target}"
        )));
    }
    let current = total_power(spectrogram);
    if current <= 0.0 || !current.is_finite() {
        return Err(Error::DegenerateSpectrum(format!(
            "total power is {current}; cannot renormalize"
        )));
    }
    // scale in f64: sums over large spectrograms lose precision in f32
    let scale = (f64::from(target) / f64::from(current)).sqrt() as f32;
    tracing::debug!(current, target, scale, "normalize total power");
    Ok(spectrogram.with_data(spectrogram.data().mapv(|c| c * scale)))
}

fn column_gains(spectrogram: &Spectrogram, profile: &Array1<f32>) -> Result<Array1<f32>> {
    if profile.len() != spectrogram.num_bins() {
        return Err(Error::invalid_shape(
            format!("power profile of length {}", spectrogram.num_bins()),
            format!("length {}", profile.len()),
        ));
    }
    Ok(profile.mapv(|p| p.max(0.0).sqrt()))
}

fn scale_columns(spectrogram: &Spectrogram, gains: Array1<f32>) -> Spectrogram {
    let gains = gains.mapv(|g| Complex32::new(g, 0.0));
    let data: Array2<Complex32> = spectrogram.data() * &gains.insert_axis(Axis(0));
    spectrogram.with_data(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framer::WindowParams;
    use ndarray::array;

    fn spec(data: Array2<Complex32>) -> Spectrogram {
        Spectrogram::new(data, WindowParams::new(4)).unwrap()
    }

    fn c(re: f32, im: f32) -> Complex32 {
        Complex32::new(re, im)
    }

    #[test]
    fn profile_is_time_mean_of_power() {
        let s = spec(array![[c(1.0, 0.0), c(0.0, 2.0)], [c(3.0, 0.0), c(0.0, 0.0)]]);
        let profile = power_profile(&s);
        assert_eq!(profile, array![5.0, 2.0]);
        assert_eq!(total_power(&s), 14.0);
    }

    #[test]
    fn whitened_columns_have_unit_power() {
        let s = spec(array![[c(1.0, 1.0), c(0.0, 4.0)], [c(3.0, 0.0), c(2.0, 0.0)]]);
        let white = whiten(&s).unwrap();
        for p in power_profile(&white) {
            assert!((p - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_power_bin_is_degenerate() {
        let s = spec(array![[c(1.0, 0.0), c(0.0, 0.0)], [c(2.0, 0.0), c(0.0, 0.0)]]);
        assert!(matches!(whiten(&s), Err(Error::DegenerateSpectrum(_))));
    }

    #[test]
    fn unwhiten_restores_original() {
        let s = spec(array![[c(1.0, -1.0), c(0.5, 4.0)], [c(3.0, 0.2), c(2.0, 0.0)]]);
        let profile = power_profile(&s);
        let back = unwhiten(&whiten_with(&s, &profile).unwrap(), &profile).unwrap();
        for (a, b) in s.data().iter().zip(back.data()) {
            assert!((a - b).norm() < 1e-5);
        }
    }

    #[test]
    fn profile_length_mismatch_is_shape_error() {
        let s = spec(array![[c(1.0, 0.0), c(1.0, 0.0)]]);
        let result = unwhiten(&s, &array![1.0, 1.0, 1.0]);
        assert!(matches!(result, Err(Error::InvalidShape { .. })));
    }

    #[test]
    fn normalize_hits_target() {
        let s = spec(array![[c(1.0, 2.0), c(3.0, 0.0)], [c(0.0, 0.5), c(-1.0, 1.0)]]);
        let out = normalize_total_power(&s, 42.0).unwrap();
        assert!((total_power(&out) - 42.0).abs() < 1e-3);
    }

    #[test]
    fn normalize_rejects_silence_and_bad_targets() {
        let silent = spec(Array2::zeros((2, 2)));
        assert!(matches!(
            normalize_total_power(&silent, 1.0),
            Err(Error::DegenerateSpectrum(_))
        ));

        let s = spec(array![[c(1.0, 0.0)]]);
        assert!(matches!(
            normalize_total_power(&s, 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(normalize_total_power(&s, f32::NAN).is_err());
    }
}
