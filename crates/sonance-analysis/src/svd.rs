//! Low-rank spectrogram model via singular value decomposition.
//!
//! A `T x F` spectrogram is factored as `U · diag(s) · V` with `k = min(T, F)`:
//! `U` is `T x k`, `s` holds `k` non-negative singular values in descending
//! order, and `V` is `k x F`. Masking zeroes singular values so that
//! reconstruction yields a rank-truncated spectrogram.
//!
//! ```rust
//! use sonance_analysis::{StftAnalyzer, SvdModel, WindowParams};
//!
//! let signal: Vec<f32> = (0..4096).map(|i| (i as f32 * 0.05).sin()).collect();
//! let spectrogram = StftAnalyzer::new(WindowParams::new(256))?.analyze(&signal)?;
//!
//! let model = SvdModel::from_spectrogram(&spectrogram)?.masked([0]);
//! let rank_one = model.reconstruct();
//! assert_eq!(rank_one.shape(), spectrogram.shape());
//! # Ok::<(), sonance_analysis::Error>(())
//! ```

use std::collections::HashSet;

use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};
use num_complex::{Complex32, Complex64};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::framer::WindowParams;
use crate::spectrogram::Spectrogram;

/// Bound on QR sweeps per singular component before giving up.
const MAX_SWEEPS_PER_COMPONENT: usize = 100;

/// Plain factor record for persistence: `(U, s, V, window descriptor)`.
///
/// Encoding is left to the caller; any serde format works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvdRecord {
    /// Left singular vectors, `T x k`.
    pub u: Array2<Complex32>,
    /// Singular values, length `k`.
    pub s: Array1<f32>,
    /// Right singular vectors, `k x F`.
    pub v: Array2<Complex32>,
    /// Window descriptor of the analyzed spectrogram.
    pub params: WindowParams,
}

/// Factored spectrogram `U · diag(s) · V`.
///
/// The singular values are owned exclusively by the model; [`SvdModel::mask`]
/// needs `&mut self`, so two masks can never race on the same model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SvdRecord", into = "SvdRecord")]
pub struct SvdModel {
    u: Array2<Complex32>,
    s: Array1<f32>,
    v: Array2<Complex32>,
    params: WindowParams,
}

impl SvdModel {
    /// Factor a spectrogram.
    ///
    /// The decomposition runs in double precision and is stored in single
    /// precision, matching the spectrogram.
    pub fn from_spectrogram(spectrogram: &Spectrogram) -> Result<Self> {
        let (rows, cols) = spectrogram.shape();
        let params = spectrogram.params();
        let k = rows.min(cols);
        if k == 0 {
            return Ok(Self {
                u: Array2::zeros((rows, 0)),
                s: Array1::zeros(0),
                v: Array2::zeros((0, cols)),
                params,
            });
        }

        let data = spectrogram.data();
        if let Some(((frame, bin), _)) = data
            .indexed_iter()
            .find(|(_, c)| !c.re.is_finite() || !c.im.is_finite())
        {
            return Err(Error::DegenerateSpectrum(format!(
                "non-finite value at frame {frame}, bin {bin}"
            )));
        }

        Self::factor(spectrogram, MAX_SWEEPS_PER_COMPONENT * k)
    }

    fn factor(spectrogram: &Spectrogram, max_sweeps: usize) -> Result<Self> {
        let (rows, cols) = spectrogram.shape();
        let params = spectrogram.params();
        let k = rows.min(cols);
        let data = spectrogram.data();
        let matrix = DMatrix::<Complex64>::from_fn(rows, cols, |i, j| {
            let c = data[[i, j]];
            Complex64::new(f64::from(c.re), f64::from(c.im))
        });

        // nalgebra treats a limit of zero as unbounded
        let svd = matrix
            .try_svd(true, true, f64::EPSILON, max_sweeps.max(1))
            .ok_or(Error::DecompositionFailed { rows, cols })?;
        let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
            return Err(Error::DecompositionFailed { rows, cols });
        };
        let singular = svd.singular_values;

        // largest first; masking by index relies on this order
        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));

        let narrow = |c: Complex64| Complex32::new(c.re as f32, c.im as f32);
        let u = Array2::from_shape_fn((rows, k), |(i, j)| narrow(u[(i, order[j])]));
        let s = Array1::from_shape_fn(k, |j| singular[order[j]] as f32);
        let v = Array2::from_shape_fn((k, cols), |(j, c)| narrow(v_t[(order[j], c)]));

        tracing::debug!(rows, cols, k, largest = s[0], "svd");
        Ok(Self { u, s, v, params })
    }

    /// Rebuild a model from persisted factors, checking their shapes.
    pub fn from_record(record: SvdRecord) -> Result<Self> {
        let SvdRecord { u, s, v, params } = record;
        params.validate()?;
        let (rows, k) = u.dim();
        let (v_rows, cols) = v.dim();
        if s.len() != k || v_rows != k || k != rows.min(cols) {
            return Err(Error::invalid_shape(
                "U (T x k), s (k), V (k x F) with k = min(T, F)",
                format!(
                    "U {:?}, s ({}), V {:?}",
                    u.dim(),
                    s.len(),
                    v.dim()
                ),
            ));
        }
        if s.iter().any(|&x| x < 0.0 || !x.is_finite()) {
            return Err(Error::InvalidParameter(
                "singular values must be finite and non-negative".into(),
            ));
        }
        Ok(Self { u, s, v, params })
    }

    /// Decompose into the plain persistence record.
    pub fn into_record(self) -> SvdRecord {
        SvdRecord {
            u: self.u,
            s: self.s,
            v: self.v,
            params: self.params,
        }
    }

    /// Number of singular components, `min(T, F)`.
    pub fn k(&self) -> usize {
        self.s.len()
    }

    /// Number of non-zero singular values.
    pub fn rank(&self) -> usize {
        self.s.iter().filter(|&&x| x > 0.0).count()
    }

    /// Shape of the spectrogram this model reconstructs.
    pub fn shape(&self) -> (usize, usize) {
        (self.u.nrows(), self.v.ncols())
    }

    /// Left singular vectors (`T x k`).
    pub fn u(&self) -> &Array2<Complex32> {
        &self.u
    }

    /// Singular values (length `k`, descending before any masking).
    pub fn singular_values(&self) -> &Array1<f32> {
        &self.s
    }

    /// Right singular vectors (`k x F`).
    pub fn v(&self) -> &Array2<Complex32> {
        &self.v
    }

    /// Window descriptor of the originating spectrogram.
    pub fn params(&self) -> WindowParams {
        self.params
    }

    /// Zero every singular value whose index is not in `keep`.
    ///
    /// Indices beyond `k` are ignored. Idempotent; keeping `0..k` is a no-op and
    /// keeping nothing zeroes the whole model.
    pub fn mask<I: IntoIterator<Item = usize>>(&mut self, keep: I) {
        let keep: HashSet<usize> = keep.into_iter().collect();
        let mut zeroed = 0usize;
        for (i, value) in self.s.iter_mut().enumerate() {
            if !keep.contains(&i) && *value != 0.0 {
                *value = 0.0;
                zeroed += 1;
            }
        }
        tracing::debug!(k = self.k(), kept = keep.len(), zeroed, "svd mask");
    }

    /// Masked copy of the model, see [`SvdModel::mask`].
    pub fn masked<I: IntoIterator<Item = usize>>(mut self, keep: I) -> Self {
        self.mask(keep);
        self
    }

    /// `U · (diag(s) · V)` as a fresh spectrogram.
    pub fn reconstruct(&self) -> Spectrogram {
        let weights = self.s.mapv(|x| Complex32::new(x, 0.0)).insert_axis(Axis(1));
        let scaled_v = &self.v * &weights;
        Spectrogram::from_validated(self.u.dot(&scaled_v), self.params)
    }

    /// Rank-1 terms `U[:, i] · s[i] · V[i, :]` for `i` in `0..k`.
    ///
    /// Their sum equals [`SvdModel::reconstruct`]. Each term is computed on
    /// demand; collecting all of them costs `k` full spectrograms of memory.
    pub fn components(&self) -> impl ExactSizeIterator<Item = Spectrogram> + '_ {
        (0..self.k()).map(move |i| {
            let weight = self.s[i];
            let column = self
                .u
                .column(i)
                .mapv(|x| x * weight)
                .insert_axis(Axis(1));
            let row = self.v.row(i).insert_axis(Axis(0));
            Spectrogram::from_validated(column.dot(&row), self.params)
        })
    }

    /// Fraction of the model's energy (`Σ s²`) carried by the `keep` components.
    pub fn energy_fraction<I: IntoIterator<Item = usize>>(&self, keep: I) -> f32 {
        let total: f32 = self.s.iter().map(|x| x * x).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let kept: HashSet<usize> = keep.into_iter().filter(|&i| i < self.k()).collect();
        kept.iter().map(|&i| self.s[i] * self.s[i]).sum::<f32>() / total
    }
}

impl TryFrom<SvdRecord> for SvdModel {
    type Error = Error;

    fn try_from(record: SvdRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

impl From<SvdModel> for SvdRecord {
    fn from(model: SvdModel) -> Self {
        model.into_record()
    }
}
