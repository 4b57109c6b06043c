//! Processed frequency band
//!
//! The canceller only touches bins in `[start, end)`. DC is never processed
//! and the upper edge is the bin nearest to `f_max`, with bin width
//! `fs / nfft`. Every other output bin is forced to zero.

use std::ops::Range;

use crate::params::GscParams;
use crate::types::{GscError, GscResult};

/// Contiguous range of processed STFT bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyBand {
    start: usize,
    end: usize,
}

impl FrequencyBand {
    /// First processed bin; bin 0 (DC) is always skipped.
    pub const MIN_INDEX: usize = 1;

    /// Derive the band from the FFT geometry and the maximum frequency.
    ///
    /// `end = round(f_max / (fs / nfft))`, clamped to the half-spectrum
    /// length. Frequencies past Nyquist therefore select the whole spectrum
    /// above DC.
    pub fn from_params(params: &GscParams) -> GscResult<Self> {
        let bin_width = params.bin_width();
        let nearest = (params.f_max / bin_width).round();
        let end = if nearest.is_finite() && nearest > 0.0 {
            (nearest as usize).min(params.half_spectrum_len())
        } else {
            0
        };

        if end <= Self::MIN_INDEX {
            return Err(GscError::EmptyBand {
                f_max: params.f_max,
                bin_width,
            });
        }

        Ok(Self {
            start: Self::MIN_INDEX,
            end,
        })
    }

    /// First processed bin (inclusive).
    pub fn start(&self) -> usize {
        self.start
    }

    /// Upper band edge (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of processed bins.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, bin: usize) -> bool {
        bin >= self.start && bin < self.end
    }

    /// Absolute bin indices of the band.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}
