//! Integration tests for sonance-analysis crate.
//!
//! Tests run whole pipelines (analysis, decomposition, masking, resynthesis)
//! over synthetic signals with known spectral content.

use std::f32::consts::PI;

use ndarray::Array2;
use proptest::prelude::*;
use sonance_analysis::{
    Complex32, Fft, ModulationAmplifier, Normalization, Passband, Resynthesis, Resynthesizer,
    Spectrogram, SpectralPyramid, StftAnalyzer, SvdModel, WindowParams, normalize_total_power,
    num_windows, power_profile, total_power, unwhiten, whiten,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const SAMPLE_RATE: f32 = 44100.0;

fn sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| (2.0 * PI * freq_hz * i as f32 / sample_rate).sin())
        .collect()
}

/// Dominant frequency of a stretch of signal, from an 8192-point transform.
fn dominant_freq(signal: &[f32], sample_rate: f32) -> f32 {
    let fft = Fft::new(8192);
    let spectrum = fft.forward_real(signal);
    let bin = spectrum[..4096]
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        .map(|(i, _)| i)
        .unwrap();
    bin as f32 * sample_rate / 8192.0
}

fn correlation(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (na * nb)
}

fn max_abs_diff(a: &Spectrogram, b: &Spectrogram) -> f32 {
    a.data()
        .iter()
        .zip(b.data())
        .map(|(x, y)| (x - y).norm())
        .fold(0.0, f32::max)
}

fn two_tone(num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * PI * 440.0 * t).sin() + 0.3 * (2.0 * PI * 1320.0 * t).sin()
        })
        .collect()
}

// ===========================================================================
// 1. Framing
// ===========================================================================

#[test]
fn frame_count_table() {
    assert_eq!(num_windows(100, 10, 10).unwrap(), 10);
    assert_eq!(num_windows(100, 10, 5).unwrap(), 19);
    assert_eq!(num_windows(5, 10, 5).unwrap(), 0);
    assert_eq!(num_windows(88200, 1024, 512).unwrap(), 171);
}

// ===========================================================================
// 2. Analysis and resynthesis
// ===========================================================================

#[test]
fn resynthesis_approximates_input() {
    let signal = sine(440.0, SAMPLE_RATE, 22050);
    let params = WindowParams::new(1024);
    let spectrogram = StftAnalyzer::new(params).unwrap().analyze(&signal).unwrap();

    let out = Resynthesizer::new(Normalization::None).overlap_add(&spectrogram);
    assert_eq!(out.len(), params.overlap_add_len(spectrogram.num_frames()));

    // skip the single-window regions at either end
    let interior = 1024..out.len() - 1024;
    let r = correlation(&out[interior.clone()], &signal[interior]);
    assert!(r > 0.99, "correlation {r}");
}

#[test]
fn peak16_output_uses_ninety_percent_of_full_scale() {
    let signal = sine(440.0, SAMPLE_RATE, 8192);
    let spectrogram = StftAnalyzer::new(WindowParams::new(512))
        .unwrap()
        .analyze(&signal)
        .unwrap();
    let Resynthesis::Pcm16(pcm) = Resynthesizer::default().resynthesize(&spectrogram) else {
        panic!("default normalization should quantize");
    };
    let peak = pcm.iter().map(|s| i32::from(*s).abs()).max().unwrap();
    assert!((29000..=29491).contains(&peak), "peak {peak}");
}

// ===========================================================================
// 3. Low-rank decomposition
// ===========================================================================

#[test]
fn rank_one_sine_keeps_its_pitch() {
    // 2 s of 440 Hz, keep only the strongest component
    let signal = sine(440.0, SAMPLE_RATE, 88200);
    let params = WindowParams::new(1024).with_step(512);
    let spectrogram = StftAnalyzer::new(params).unwrap().analyze(&signal).unwrap();
    assert_eq!(spectrogram.shape(), (171, 1024));

    let model = SvdModel::from_spectrogram(&spectrogram).unwrap();
    assert_eq!(model.k(), 171);

    let truncated = model.masked([0]).reconstruct();
    let pcm = Resynthesizer::new(Normalization::Peak16)
        .resynthesize(&truncated)
        .into_f32();
    assert_eq!(pcm.len(), 512 * 170 + 1024);

    let middle = &pcm[20_000..20_000 + 8192];
    let freq = dominant_freq(middle, SAMPLE_RATE);
    assert!((freq - 440.0).abs() < 10.0, "dominant {freq} Hz");
}

#[test]
fn full_keep_set_reconstructs_spectrogram() {
    let signal = two_tone(16384);
    let spectrogram = StftAnalyzer::new(WindowParams::new(256))
        .unwrap()
        .analyze(&signal)
        .unwrap();
    let model = SvdModel::from_spectrogram(&spectrogram).unwrap();
    let k = model.k();
    let back = model.masked(0..k).reconstruct();

    let scale = spectrogram
        .data()
        .iter()
        .map(|c| c.norm())
        .fold(0.0, f32::max);
    assert!(max_abs_diff(&back, &spectrogram) < 1e-4 * scale);
}

#[test]
fn empty_keep_set_resynthesizes_silence() {
    let signal = two_tone(4096);
    let spectrogram = StftAnalyzer::new(WindowParams::new(256))
        .unwrap()
        .analyze(&signal)
        .unwrap();
    let zeroed = SvdModel::from_spectrogram(&spectrogram)
        .unwrap()
        .masked(std::iter::empty())
        .reconstruct();
    assert!(zeroed.data().iter().all(|c| c.norm() == 0.0));

    let out = Resynthesizer::default().resynthesize(&zeroed);
    assert!(out.into_f32().iter().all(|&s| s == 0.0));
}

#[test]
fn svd_model_roundtrips_through_serde() {
    let spectrogram = StftAnalyzer::new(WindowParams::new(64))
        .unwrap()
        .analyze(&two_tone(1024))
        .unwrap();
    let model = SvdModel::from_spectrogram(&spectrogram).unwrap().masked([0, 1]);

    let json = serde_json::to_string(&model).unwrap();
    let restored: SvdModel = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, model);
    assert!(max_abs_diff(&restored.reconstruct(), &model.reconstruct()) < 1e-6);
}

// ===========================================================================
// 4. Power normalization
// ===========================================================================

#[test]
fn whiten_then_unwhiten_is_identity() {
    let spectrogram = StftAnalyzer::new(WindowParams::new(128))
        .unwrap()
        .analyze(&two_tone(4096))
        .unwrap();
    let profile = power_profile(&spectrogram);
    let white = whiten(&spectrogram).unwrap();
    for p in power_profile(&white) {
        assert!((p - 1.0).abs() < 1e-3, "whitened bin power {p}");
    }

    let back = unwhiten(&white, &profile).unwrap();
    let scale = spectrogram
        .data()
        .iter()
        .map(|c| c.norm())
        .fold(0.0, f32::max);
    assert!(max_abs_diff(&back, &spectrogram) < 1e-4 * scale);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn normalized_power_matches_target(
        values in proptest::collection::vec((-10.0f32..10.0, -10.0f32..10.0), 12),
        target in 0.01f32..1000.0,
    ) {
        let data = Array2::from_shape_vec(
            (3, 4),
            values.iter().map(|&(re, im)| Complex32::new(re, im)).collect(),
        ).unwrap();
        let spectrogram = Spectrogram::new(data, WindowParams::new(4)).unwrap();
        prop_assume!(total_power(&spectrogram) > 1e-3);

        let out = normalize_total_power(&spectrogram, target).unwrap();
        let power = total_power(&out);
        prop_assert!((power - target).abs() <= target * 1e-3, "{} vs {}", power, target);
    }
}

// ===========================================================================
// 5. Pyramid and modulation
// ===========================================================================

#[test]
fn spectral_pyramid_is_lossless() {
    let spectrogram = StftAnalyzer::new(WindowParams::new(256))
        .unwrap()
        .analyze(&two_tone(8192))
        .unwrap();
    let pyramid = SpectralPyramid::decompose(&spectrogram, None).unwrap();
    assert_eq!(pyramid.levels(), 8);

    let scale = spectrogram
        .data()
        .iter()
        .map(|c| c.norm())
        .fold(0.0, f32::max);
    assert!(max_abs_diff(&pyramid.collapse(), &spectrogram) < 1e-4 * scale);
}

#[test]
fn unity_gain_modulation_is_identity() {
    let params = WindowParams::new(256);
    let spectrogram = StftAnalyzer::new(params)
        .unwrap()
        .analyze(&two_tone(16384))
        .unwrap();
    let amplifier =
        ModulationAmplifier::for_analysis(SAMPLE_RATE, params, Passband::new(2.0, 20.0), 1.0)
            .unwrap();
    let out = amplifier.apply(&spectrogram, Some(4)).unwrap();

    let scale = spectrogram
        .data()
        .iter()
        .map(|c| c.norm())
        .fold(0.0, f32::max);
    assert!(max_abs_diff(&out, &spectrogram) < 1e-4 * scale);
}
