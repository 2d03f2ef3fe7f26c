//! SVD model files.
//!
//! A model file is JSON holding the factor record (`u`, `s`, `v`, window
//! params) and the sample rate of the analyzed clip. Factor shapes are
//! re-validated on load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sonance_analysis::{SvdModel, SvdRecord};

use crate::{Error, Result};

/// An SVD model plus what is needed to play its reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    /// Sample rate of the clip the model was computed from.
    pub sample_rate: u32,
    /// The factored spectrogram.
    pub model: SvdModel,
}

#[derive(Serialize, Deserialize)]
struct Stored {
    sample_rate: u32,
    model: SvdRecord,
}

impl ModelFile {
    /// Pair a model with its clip's sample rate.
    pub fn new(sample_rate: u32, model: SvdModel) -> Self {
        Self { sample_rate, model }
    }

    /// Encode to a writer.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let stored = Stored {
            sample_rate: self.sample_rate,
            model: self.model.clone().into_record(),
        };
        serde_json::to_writer(writer, &stored)?;
        Ok(())
    }

    /// Decode from a reader, validating factor shapes.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let stored: Stored = serde_json::from_reader(reader)?;
        if stored.sample_rate == 0 {
            return Err(Error::Analysis(sonance_analysis::Error::InvalidParameter(
                "model sample rate is zero".into(),
            )));
        }
        let model = SvdModel::from_record(stored.model)?;
        Ok(Self {
            sample_rate: stored.sample_rate,
            model,
        })
    }

    /// Save to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        let (rows, cols) = self.model.shape();
        tracing::debug!(path = %path.display(), rows, cols, k = self.model.k(), "saved model");
        Ok(())
    }

    /// Load from `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = Self::read_from(BufReader::new(File::open(path)?))?;
        tracing::debug!(path = %path.display(), k = file.model.k(), "loaded model");
        Ok(file)
    }
}
