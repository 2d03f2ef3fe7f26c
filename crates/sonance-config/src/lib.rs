//! Configuration for the sonance analysis pipeline.
//!
//! # Features
//!
//! - **Analysis config**: [`AnalysisConfig`] loads and saves TOML settings for
//!   clip range, window framing, keep-set, modulation amplification, and output
//! - **Keep-sets**: [`KeepSet`] parses `i` and inclusive `a:b` tokens
//! - **Paths**: platform-specific location of the user config file
//!
//! # Example
//!
//! ```rust,no_run
//! use sonance_config::AnalysisConfig;
//!
//! // User config if present, defaults otherwise
//! let config = AnalysisConfig::discover().unwrap();
//! config.validate().unwrap();
//!
//! let params = config.window.params();
//! let keep = config.svd.keep_set().unwrap();
//! println!("W={} S={} keep={}", params.window, params.step, keep);
//! ```

mod config;
mod error;
mod keep;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::{
    AmplifyConfig, AnalysisConfig, ClipConfig, OutputConfig, SvdConfig, WindowConfig,
};
pub use error::ConfigError;
pub use keep::KeepSet;
pub use paths::{user_config_dir, user_config_path};
