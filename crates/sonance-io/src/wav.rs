//! WAV clip reading and writing.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use sonance_analysis::Resynthesis;
use std::io::{Read, Seek};
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample; 32 is written as float, anything else as PCM.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// WAV file metadata, read from the header only.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Channel count, rate, and bit depth.
    pub spec: WavSpec,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let header = reader.spec();
    let num_frames = u64::from(reader.duration());

    Ok(WavInfo {
        spec: WavSpec {
            channels: header.channels,
            sample_rate: header.sample_rate,
            bits_per_sample: header.bits_per_sample,
        },
        num_frames,
        duration_secs: num_frames as f64 / f64::from(header.sample_rate),
        format: match header.sample_format {
            SampleFormat::Float => WavFormat::IeeeFloat,
            SampleFormat::Int => WavFormat::Pcm,
        },
    })
}

/// A mono excerpt of a WAV file.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Channel-0 samples, integer PCM scaled to `[-1, 1)`.
    pub samples: Vec<f32>,
    /// Sample rate of the source file in Hz.
    pub sample_rate: u32,
    /// Offset of the first sample within the source file.
    pub offset: usize,
}

impl Clip {
    /// Read channel 0 of `path`, samples `start..end` (`end` clamped to the file).
    ///
    /// # Example
    /// ```ignore
    /// let clip = Clip::read("input.wav", 0, Some(44100))?;
    /// println!("{} samples, nyquist {} Hz", clip.len(), clip.nyquist());
    /// ```
    pub fn read<P: AsRef<Path>>(path: P, start: usize, end: Option<usize>) -> Result<Self> {
        let reader = WavReader::open(path)?;
        read_channel0(reader, start, end)
    }

    /// Like [`Clip::read`], with the range given in seconds.
    pub fn read_secs<P: AsRef<Path>>(
        path: P,
        start_secs: f64,
        end_secs: Option<f64>,
    ) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let rate = f64::from(reader.spec().sample_rate);
        let start = (start_secs * rate) as usize;
        let end = end_secs.map(|secs| (secs * rate) as usize);
        read_channel0(reader, start, end)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the clip holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Half the sample rate, in Hz.
    pub fn nyquist(&self) -> f32 {
        self.sample_rate as f32 / 2.0
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

fn read_channel0<R: Read + Seek>(
    mut reader: WavReader<R>,
    start: usize,
    end: Option<usize>,
) -> Result<Clip> {
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));
    let available = reader.duration() as usize;
    let end = end.map_or(available, |end| end.min(available));
    if start >= end {
        return Err(Error::EmptyClip {
            start,
            end,
            available,
        });
    }

    reader.seek(start as u32)?;
    let count = (end - start) * channels;
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .take(count)
            .step_by(channels)
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .take(count)
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    if channels > 1 {
        tracing::debug!(channels, "using channel 0 only");
    }
    tracing::debug!(
        start,
        end,
        samples = samples.len(),
        sample_rate = spec.sample_rate,
        "read clip"
    );

    Ok(Clip {
        samples,
        sample_rate: spec.sample_rate,
        offset: start,
    })
}

/// Write 16-bit mono PCM samples.
pub fn write_pcm16<P: AsRef<Path>>(path: P, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
    };
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write floating-point samples in `[-1, 1]` using `spec`'s bit depth.
///
/// 32-bit output is IEEE float and written unscaled; 8, 16, and 24-bit output
/// is scaled to full-scale PCM and clamped.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    if !matches!(spec.bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(Error::UnsupportedFormat(format!(
            "{}-bit output",
            spec.bits_per_sample
        )));
    }
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let full_scale = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in samples {
            let value = (sample * full_scale).clamp(-full_scale, full_scale - 1.0) as i32;
            writer.write_sample(value)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Write a resynthesis result as a mono file: 16-bit PCM for quantized
/// output, 32-bit float for raw output.
pub fn write_resynthesis<P: AsRef<Path>>(
    path: P,
    resynthesis: &Resynthesis,
    sample_rate: u32,
) -> Result<()> {
    match resynthesis {
        Resynthesis::Pcm16(samples) => write_pcm16(path, samples, sample_rate),
        Resynthesis::Float(samples) => write_wav(
            path,
            samples,
            WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn write_interleaved_i16(path: &Path, channels: u16, frames: &[[i16; 2]]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in &frame[..channels as usize] {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn float_roundtrip() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0).sin()).collect();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let clip = Clip::read(file.path(), 0, None).unwrap();
        assert_eq!(clip.sample_rate, 48000);
        assert_eq!(clip.samples, samples);
    }

    #[test]
    fn int_pcm_is_scaled_to_unit_range() {
        let file = NamedTempFile::new().unwrap();
        write_interleaved_i16(file.path(), 1, &[[16384, 0], [-32768, 0], [0, 0]]);

        let clip = Clip::read(file.path(), 0, None).unwrap();
        assert_eq!(clip.samples, vec![0.5, -1.0, 0.0]);
    }

    #[test]
    fn stereo_keeps_channel_zero() {
        let file = NamedTempFile::new().unwrap();
        let frames: Vec<[i16; 2]> = (0..10).map(|i| [i * 100, -1000]).collect();
        write_interleaved_i16(file.path(), 2, &frames);

        let clip = Clip::read(file.path(), 2, Some(5)).unwrap();
        let expected: Vec<f32> = [200.0, 300.0, 400.0].iter().map(|v| v / 32768.0).collect();
        assert_eq!(clip.samples, expected);
        assert_eq!(clip.offset, 2);
    }

    #[test]
    fn range_is_clamped_and_empty_range_rejected() {
        let file = NamedTempFile::new().unwrap();
        write_interleaved_i16(file.path(), 1, &[[1, 0]; 8]);

        assert_eq!(Clip::read(file.path(), 5, Some(100)).unwrap().len(), 3);
        assert!(matches!(
            Clip::read(file.path(), 8, None),
            Err(Error::EmptyClip { available: 8, .. })
        ));
        assert!(matches!(
            Clip::read(file.path(), 4, Some(4)),
            Err(Error::EmptyClip { .. })
        ));
    }

    #[test]
    fn seconds_use_file_sample_rate() {
        let file = NamedTempFile::new().unwrap();
        let frames = vec![[7, 0]; 8000];
        write_interleaved_i16(file.path(), 1, &frames);

        let clip = Clip::read_secs(file.path(), 0.25, Some(0.5)).unwrap();
        assert_eq!(clip.len(), 2000);
        assert_eq!(clip.offset, 2000);
        assert!((clip.duration_secs() - 0.25).abs() < 1e-9);
        assert_eq!(clip.nyquist(), 4000.0);
    }

    #[test]
    fn pcm16_written_exactly() {
        let file = NamedTempFile::new().unwrap();
        let samples = [0i16, 29491, -29491, 12];
        write_pcm16(file.path(), &samples, 22050).unwrap();

        let mut reader = WavReader::open(file.path()).unwrap();
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.spec().sample_rate, 22050);
        let back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(back, samples);
    }

    #[test]
    fn resynthesis_format_follows_variant() {
        let file = NamedTempFile::new().unwrap();
        write_resynthesis(file.path(), &Resynthesis::Float(vec![0.25, -2.0]), 8000).unwrap();
        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.format, WavFormat::IeeeFloat);
        assert_eq!(info.num_frames, 2);

        // raw floats are not clamped
        let clip = Clip::read(file.path(), 0, None).unwrap();
        assert_eq!(clip.samples, vec![0.25, -2.0]);
    }

    #[test]
    fn unsupported_bit_depth() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            bits_per_sample: 12,
            ..WavSpec::default()
        };
        assert!(matches!(
            write_wav(file.path(), &[0.0], spec),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
