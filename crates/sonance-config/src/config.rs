//! Analysis configuration file format and operations.

use serde::{Deserialize, Serialize};
use sonance_analysis::{Passband, WindowParams};
use std::path::Path;

use crate::error::ConfigError;
use crate::keep::KeepSet;
use crate::paths;

/// Settings for the whole analysis pipeline.
///
/// Every section and field is optional in the file; missing values take the
/// defaults shown below.
///
/// # TOML Format
///
/// ```toml
/// [clip]
/// start_secs = 13.0
/// end_secs = 20.0
///
/// [window]
/// size = 1024
/// step = 512
/// fft_size = 1024
///
/// [svd]
/// keep = ["0", "2:4"]
///
/// [amplify]
/// gain = 4.0
/// low_hz = 2.0
/// high_hz = 12.0
/// levels = [0, 1]
///
/// [output]
/// bit_depth = 16
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Which part of the input file to analyze.
    pub clip: ClipConfig,
    /// STFT framing.
    pub window: WindowConfig,
    /// Low-rank reconstruction.
    pub svd: SvdConfig,
    /// Modulation amplification.
    pub amplify: AmplifyConfig,
    /// Output file format.
    pub output: OutputConfig,
}

/// Clip range in seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClipConfig {
    /// Start offset (default 0).
    pub start_secs: f64,
    /// End offset; `None` reads to the end of the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_secs: Option<f64>,
}

/// STFT window descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window length `W` in samples.
    pub size: usize,
    /// Step `S`; defaults to `W / 2`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    /// Transform length `N`; defaults to `W`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fft_size: Option<usize>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: 1024,
            step: None,
            fft_size: None,
        }
    }
}

impl WindowConfig {
    /// Resolve defaults into a window descriptor.
    pub fn params(&self) -> WindowParams {
        let mut params = WindowParams::new(self.size);
        if let Some(step) = self.step {
            params = params.with_step(step);
        }
        if let Some(fft_size) = self.fft_size {
            params = params.with_fft_size(fft_size);
        }
        params
    }
}

/// Singular components to keep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SvdConfig {
    /// Keep-set tokens, see [`KeepSet`].
    pub keep: Vec<String>,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            keep: vec!["0".to_string()],
        }
    }
}

impl SvdConfig {
    /// Parse the keep tokens.
    pub fn keep_set(&self) -> Result<KeepSet, ConfigError> {
        KeepSet::parse(&self.keep)
    }
}

/// Modulation amplification settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmplifyConfig {
    /// Gain inside the passband (1.0 leaves the signal unchanged).
    pub gain: f32,
    /// Passband lower edge in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_hz: Option<f32>,
    /// Passband upper edge in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_hz: Option<f32>,
    /// Pyramid levels to amplify; empty means all.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub levels: Vec<usize>,
}

impl Default for AmplifyConfig {
    fn default() -> Self {
        Self {
            gain: 1.0,
            low_hz: None,
            high_hz: None,
            levels: Vec::new(),
        }
    }
}

impl AmplifyConfig {
    /// The passband, when both edges are set.
    pub fn passband(&self) -> Option<Passband> {
        Some(Passband::new(self.low_hz?, self.high_hz?))
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// 16 writes peak-normalized PCM; 32 writes raw float samples.
    pub bit_depth: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { bit_depth: 16 }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load the user configuration file if it exists, otherwise defaults.
    pub fn discover() -> Result<Self, ConfigError> {
        let path = paths::user_config_path();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load `path` if given, otherwise [`AnalysisConfig::discover`].
    pub fn load_or_discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::discover(),
        }
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Validation(msg));

        let ClipConfig {
            start_secs,
            end_secs,
        } = self.clip;
        if !(start_secs >= 0.0 && start_secs.is_finite()) {
            return invalid(format!("clip start must be non-negative, got {start_secs}"));
        }
        if let Some(end) = end_secs
            && !(end > start_secs)
        {
            return invalid(format!("clip end {end} must be after start {start_secs}"));
        }

        if self.window.size == 0 {
            return invalid("window size must be positive".into());
        }
        if self.window.step == Some(0) {
            return invalid("window step must be positive".into());
        }
        if self.window.fft_size == Some(0) {
            return invalid("fft size must be positive".into());
        }

        self.svd.keep_set()?;

        let AmplifyConfig {
            gain,
            low_hz,
            high_hz,
            ..
        } = self.amplify;
        if !(gain >= 0.0 && gain.is_finite()) {
            return invalid(format!("gain must be finite and non-negative, got {gain}"));
        }
        match (low_hz, high_hz) {
            (Some(low), Some(high)) if !(low > 0.0 && low < high) => {
                return invalid(format!("passband needs 0 < low < high, got {low}..{high}"));
            }
            (Some(_), None) | (None, Some(_)) => {
                return invalid("passband needs both low_hz and high_hz".into());
            }
            _ => {}
        }

        if !matches!(self.output.bit_depth, 16 | 32) {
            return invalid(format!(
                "output bit depth must be 16 or 32, got {}",
                self.output.bit_depth
            ));
        }

        Ok(())
    }
}
