//! CLI command implementations.

pub mod amplify;
pub mod common;
pub mod decompose;
pub mod generate;
pub mod info;
pub mod reconstruct;
pub mod resynth;
pub mod whiten;
