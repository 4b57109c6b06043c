//! Fixed beamforming weights
//!
//! Weights arrive as a flat array of reals covering the full half spectrum:
//!
//! ```text
//!   [re(0,0), im(0,0), re(0,1), im(0,1), ..., re(F-1,C-1), im(F-1,C-1)]
//!     bin 0, ch 0       bin 0, ch 1              last bin, last ch
//! ```
//!
//! with `F = nfft/2 + 1` and `C = nchannel`. Only the rows inside the
//! processed band are retained. Each (bin, channel) pair has exactly one
//! stored value; the beamformer conjugates it where needed.

use crate::band::FrequencyBand;
use crate::params::GscParams;
use crate::types::{Complex, GscError, GscResult};

/// Read-only fixed weight matrix, shape `(band.len(), nchannel)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWeights {
    nchannel: usize,
    weights: Vec<Complex>,
}

impl FixedWeights {
    /// Parse the interleaved weight array and keep the band rows.
    pub fn from_interleaved(
        raw: &[f64],
        params: &GscParams,
        band: &FrequencyBand,
    ) -> GscResult<Self> {
        let expected = params.weight_len();
        if raw.len() != expected {
            return Err(GscError::WeightSizeMismatch {
                expected,
                actual: raw.len(),
            });
        }
        if let Some(pos) = raw.iter().position(|v| !v.is_finite()) {
            return Err(GscError::InvalidWeights(format!(
                "non-finite value at index {}",
                pos
            )));
        }

        let nchannel = params.nchannel;
        let weights = raw
            .chunks_exact(2)
            .skip(band.start() * nchannel)
            .take(band.len() * nchannel)
            .map(|pair| Complex::new(pair[0], pair[1]))
            .collect();

        Ok(Self { nchannel, weights })
    }

    /// Number of band rows.
    pub fn num_bins(&self) -> usize {
        self.weights.len() / self.nchannel
    }

    pub fn num_channels(&self) -> usize {
        self.nchannel
    }

    /// Weights of one band-relative bin, one per channel.
    #[inline]
    pub fn row(&self, f: usize) -> &[Complex] {
        &self.weights[f * self.nchannel..(f + 1) * self.nchannel]
    }

    /// Weight of a band-relative bin and channel.
    #[inline]
    pub fn get(&self, f: usize, ch: usize) -> Complex {
        self.weights[f * self.nchannel + ch]
    }
}

/// Interleave complex weights into the on-disk layout.
///
/// `weights` covers the full half spectrum, bin-major.
pub fn interleave(weights: &[Complex]) -> Vec<f64> {
    weights.iter().flat_map(|w| [w.re, w.im]).collect()
}
