//! Band-selective amplification of slow amplitude modulation.
//!
//! Each pyramid band is a `T x F` complex matrix. Reading one column over time
//! gives a trace sampled at the frame rate (`sample_rate / step`). A bandpass
//! filter over that trace isolates modulation in a chosen passband; the isolated
//! part is scaled by the gain and the bands are re-summed:
//!
//! ```text
//! band' = band + (gain - 1) * bandpass(band)
//! ```
//!
//! so a gain of 1 leaves the spectrogram unchanged.

use std::f32::consts::PI;

use ndarray::{Array2, Axis};
use num_complex::Complex32;

use crate::error::{Error, Result};
use crate::framer::WindowParams;
use crate::pyramid::SpectralPyramid;
use crate::spectrogram::Spectrogram;

/// Modulation-frequency passband in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Passband {
    /// Lower edge in Hz.
    pub low_hz: f32,
    /// Upper edge in Hz.
    pub high_hz: f32,
}

impl Passband {
    /// Create a passband.
    pub const fn new(low_hz: f32, high_hz: f32) -> Self {
        Self { low_hz, high_hz }
    }

    /// Geometric center frequency.
    pub fn center_hz(&self) -> f32 {
        (self.low_hz * self.high_hz).sqrt()
    }

    fn validate(&self, frame_rate: f32) -> Result<()> {
        let nyquist = frame_rate / 2.0;
        if !(self.low_hz > 0.0 && self.low_hz < self.high_hz && self.high_hz < nyquist) {
            return Err(Error::InvalidParameter(format!(
                "passband {}..{} Hz must satisfy 0 < low < high < {} Hz (half the frame rate)",
                self.low_hz, self.high_hz, nyquist
            )));
        }
        Ok(())
    }
}

/// Second-order section in transposed direct form II.
#[derive(Debug, Clone, Copy)]
struct Section {
    b: [f32; 3],
    a: [f32; 2],
}

impl Section {
    /// RBJ cookbook section: `highpass` selects the high-pass numerator.
    fn new(highpass: bool, frequency: f32, q: f32, rate: f32) -> Self {
        let omega = 2.0 * PI * frequency / rate;
        let (sin, cos) = omega.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;
        let b = if highpass {
            [(1.0 + cos) / 2.0, -(1.0 + cos), (1.0 + cos) / 2.0]
        } else {
            [(1.0 - cos) / 2.0, 1.0 - cos, (1.0 - cos) / 2.0]
        };
        Self {
            b: b.map(|x| x / a0),
            a: [-2.0 * cos / a0, (1.0 - alpha) / a0],
        }
    }

    fn run(&self, trace: &mut [f32]) {
        let (mut z1, mut z2) = (0.0f32, 0.0f32);
        for x in trace.iter_mut() {
            let input = *x;
            let y = self.b[0] * input + z1;
            z1 = self.b[1] * input - self.a[0] * y + z2;
            z2 = self.b[2] * input - self.a[1] * y;
            *x = y;
        }
    }
}

/// Butterworth Q values of the two sections of a 4th-order cascade.
const BUTTERWORTH_Q: [f32; 2] = [0.541, 1.307];

/// 4th-order high-pass at `low_hz` followed by 4th-order low-pass at `high_hz`,
/// run forward then backward so the filtered trace is not delayed.
#[derive(Debug, Clone)]
struct BandpassFilter {
    sections: Vec<Section>,
}

impl BandpassFilter {
    fn new(passband: Passband, rate: f32) -> Self {
        let mut sections = Vec::with_capacity(4);
        for q in BUTTERWORTH_Q {
            sections.push(Section::new(true, passband.low_hz, q, rate));
        }
        for q in BUTTERWORTH_Q {
            sections.push(Section::new(false, passband.high_hz, q, rate));
        }
        Self { sections }
    }

    fn filter(&self, trace: &mut [f32]) {
        for section in &self.sections {
            section.run(trace);
        }
        trace.reverse();
        for section in &self.sections {
            section.run(trace);
        }
        trace.reverse();
    }
}

/// Scales modulation within a passband, per pyramid band and frequency bin.
#[derive(Debug, Clone)]
pub struct ModulationAmplifier {
    frame_rate: f32,
    passband: Passband,
    gain: f32,
    levels: Option<Vec<usize>>,
    filter: BandpassFilter,
}

impl ModulationAmplifier {
    /// Amplifier for traces sampled at `frame_rate` frames per second.
    pub fn new(frame_rate: f32, passband: Passband, gain: f32) -> Result<Self> {
        if !(frame_rate > 0.0 && frame_rate.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }
        if !(gain >= 0.0 && gain.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "gain must be finite and non-negative, got {gain}"
            )));
        }
        passband.validate(frame_rate)?;
        Ok(Self {
            frame_rate,
            passband,
            gain,
            levels: None,
            filter: BandpassFilter::new(passband, frame_rate),
        })
    }

    /// Amplifier for spectrograms of a signal at `sample_rate` analyzed with `params`.
    pub fn for_analysis(
        sample_rate: f32,
        params: WindowParams,
        passband: Passband,
        gain: f32,
    ) -> Result<Self> {
        params.validate()?;
        Self::new(sample_rate / params.step as f32, passband, gain)
    }

    /// Restrict amplification to the given pyramid levels (default: all).
    pub fn with_levels(mut self, levels: impl IntoIterator<Item = usize>) -> Self {
        self.levels = Some(levels.into_iter().collect());
        self
    }

    /// Frames per second of the traces being filtered.
    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    /// Modulation passband.
    pub fn passband(&self) -> Passband {
        self.passband
    }

    /// Gain applied inside the passband.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    fn selects(&self, level: usize) -> bool {
        self.levels.as_ref().is_none_or(|levels| levels.contains(&level))
    }

    /// Amplify the selected bands of a pyramid in place.
    pub fn amplify(&self, pyramid: &mut SpectralPyramid) {
        let boost = self.gain - 1.0;
        if boost == 0.0 {
            return;
        }
        for (level, band) in pyramid.bands.iter_mut().enumerate() {
            if !self.selects(level) {
                continue;
            }
            self.amplify_band(band, boost);
        }
    }

    fn amplify_band(&self, band: &mut Array2<Complex32>, boost: f32) {
        let mut re = vec![0.0f32; band.nrows()];
        let mut im = vec![0.0f32; band.nrows()];
        for mut column in band.axis_iter_mut(Axis(1)) {
            for ((r, i), c) in re.iter_mut().zip(im.iter_mut()).zip(column.iter()) {
                *r = c.re;
                *i = c.im;
            }
            self.filter.filter(&mut re);
            self.filter.filter(&mut im);
            for ((c, &r), &i) in column.iter_mut().zip(&re).zip(&im) {
                *c += Complex32::new(r, i) * boost;
            }
        }
    }

    /// Decompose, amplify, and re-sum a spectrogram.
    pub fn apply(&self, spectrogram: &Spectrogram, levels: Option<usize>) -> Result<Spectrogram> {
        let mut pyramid = SpectralPyramid::decompose(spectrogram, levels)?;
        self.amplify(&mut pyramid);
        tracing::debug!(
            gain = self.gain,
            low_hz = self.passband.low_hz,
            high_hz = self.passband.high_hz,
            levels = pyramid.levels(),
            "modulation amplify"
        );
        Ok(pyramid.collapse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / rate).sin())
            .collect()
    }

    fn rms(signal: &[f32]) -> f32 {
        (signal.iter().map(|x| x * x).sum::<f32>() / signal.len() as f32).sqrt()
    }

    #[test]
    fn bandpass_passes_center_and_rejects_far_tones() {
        let rate = 86.0;
        let filter = BandpassFilter::new(Passband::new(2.0, 6.0), rate);

        let mut inside = tone(4.0, rate, 2000);
        filter.filter(&mut inside);
        let mut outside = tone(30.0, rate, 2000);
        filter.filter(&mut outside);

        let gain_in = rms(&inside[500..1500]) / (0.5f32).sqrt();
        let gain_out = rms(&outside[500..1500]) / (0.5f32).sqrt();
        assert!(gain_in > 0.7, "passband gain {gain_in}");
        assert!(gain_out < 0.05, "stopband gain {gain_out}");
    }

    #[test]
    fn passband_validation() {
        assert!(ModulationAmplifier::new(86.0, Passband::new(2.0, 6.0), 2.0).is_ok());
        assert!(ModulationAmplifier::new(86.0, Passband::new(6.0, 2.0), 2.0).is_err());
        assert!(ModulationAmplifier::new(86.0, Passband::new(2.0, 50.0), 2.0).is_err());
        assert!(ModulationAmplifier::new(86.0, Passband::new(0.0, 6.0), 2.0).is_err());
        assert!(ModulationAmplifier::new(86.0, Passband::new(2.0, 6.0), f32::NAN).is_err());
    }

    #[test]
    fn frame_rate_from_analysis() {
        let amp = ModulationAmplifier::for_analysis(
            44100.0,
            WindowParams::new(1024),
            Passband::new(1.0, 10.0),
            3.0,
        )
        .unwrap();
        assert!((amp.frame_rate() - 44100.0 / 512.0).abs() < 1e-3);
    }

    #[test]
    fn unity_gain_is_identity() {
        let data = Array2::from_shape_fn((64, 16), |(t, f)| {
            Complex32::new((t as f32 * 0.3).sin() * f as f32, (t as f32 * 0.1).cos())
        });
        let spectrogram = Spectrogram::new(data, WindowParams::new(16)).unwrap();
        let amp = ModulationAmplifier::new(86.0, Passband::new(2.0, 8.0), 1.0).unwrap();
        let out = amp.apply(&spectrogram, None).unwrap();
        for (a, b) in spectrogram.data().iter().zip(out.data()) {
            assert!((a - b).norm() < 1e-4);
        }
    }

    #[test]
    fn gain_boosts_in_band_modulation() {
        let rate = 86.0;
        let frames = 400;
        // alternating sign across bins lands entirely in the finest band;
        // every bin is amplitude-modulated at 4 Hz
        let data = Array2::from_shape_fn((frames, 8), |(t, f)| {
            let envelope = 1.0 + 0.5 * (2.0 * PI * 4.0 * t as f32 / rate).sin();
            let sign = if f % 2 == 0 { 1.0 } else { -1.0 };
            Complex32::new(envelope * sign, 0.0)
        });
        let spectrogram = Spectrogram::new(data, WindowParams::new(8)).unwrap();
        let amp = ModulationAmplifier::new(rate, Passband::new(2.0, 8.0), 4.0).unwrap();
        let out = amp.apply(&spectrogram, None).unwrap();

        let depth = |s: &Spectrogram| {
            let column: Vec<f32> = s.data().column(3).iter().map(|c| c.re).collect();
            let middle = &column[100..300];
            let max = middle.iter().copied().fold(f32::MIN, f32::max);
            let min = middle.iter().copied().fold(f32::MAX, f32::min);
            max - min
        };
        assert!(depth(&out) > 2.0 * depth(&spectrogram));
    }

    #[test]
    fn level_selection_skips_other_bands() {
        let data = Array2::from_shape_fn((128, 8), |(t, f)| {
            Complex32::new((2.0 * PI * 4.0 * t as f32 / 86.0).sin() * (f % 3) as f32, 0.0)
        });
        let spectrogram = Spectrogram::new(data, WindowParams::new(8)).unwrap();
        let mut pyramid = SpectralPyramid::decompose(&spectrogram, None).unwrap();
        let untouched = pyramid.bands[1].clone();

        ModulationAmplifier::new(86.0, Passband::new(2.0, 8.0), 5.0)
            .unwrap()
            .with_levels([0])
            .amplify(&mut pyramid);
        assert_eq!(pyramid.bands[1], untouched);
    }
}
