//! Canceller Parameters
//!
//! Scalar parameters fixed at construction time. Stream-level values
//! (`nfft`, `fs`, `nchannel`) come from the surrounding STFT pipeline;
//! algorithm values come from a [`GscConfig`](crate::config::GscConfig) or
//! are set through the builder.
//!
//! ## Forgetting factors
//!
//! | Parameter | Range    | Near 1                  | Near 0              |
//! |-----------|----------|-------------------------|---------------------|
//! | `rls_ff`  | (0, 1]   | slow, stable adaptation | fast, noisy tracking|
//! | `pb_ff`   | (0, 1)   | smooth gain estimate    | per-frame gain      |
//!
//! `rls_ff = 1` disables forgetting entirely, which makes the RLS
//! statistics plain sums over all frames.
//!
//! ## Example
//!
//! ```rust
//! use gsc_core::params::GscParams;
//!
//! let params = GscParams::builder()
//!     .nfft(512)
//!     .sample_rate(16_000.0)
//!     .channels(8, 2)
//!     .rls(0.995, 1e-2)
//!     .projection_back(0.98, 0)
//!     .f_max(7_000.0)
//!     .build();
//!
//! assert!(params.validate().is_ok());
//! assert_eq!(params.downsample_factor(), 4);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::GscConfig;
use crate::types::{GscError, GscResult};

/// What to do with trailing channels when `nchannel` is not a multiple of
/// `nchannel_ds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Exclude channels `>= nchannel_ds * factor` from the adaptive branch
    Drop,
    /// Refuse to build the canceller
    Reject,
}

impl Default for RemainderPolicy {
    fn default() -> Self {
        RemainderPolicy::Drop
    }
}

impl fmt::Display for RemainderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainderPolicy::Drop => write!(f, "drop"),
            RemainderPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Default floor for the projection-back denominator.
pub const DEFAULT_PB_DEN_FLOOR: f64 = 1e-10;

/// Complete parameter set of a canceller instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GscParams {
    /// FFT size of the surrounding STFT
    pub nfft: usize,
    /// Sampling rate in Hz
    pub fs: f64,
    /// Number of input channels
    pub nchannel: usize,
    /// Number of reference channels after downsampling
    pub nchannel_ds: usize,
    /// RLS forgetting factor
    pub rls_ff: f64,
    /// RLS regularization, initial inverse covariance is `I / rls_reg`
    pub rls_reg: f64,
    /// Projection-back forgetting factor
    pub pb_ff: f64,
    /// Input channel the output scale is anchored to
    pub pb_ref_channel: usize,
    /// Upper edge of the processed band in Hz
    pub f_max: f64,
    /// Trailing channel policy for the downsampler
    pub remainder: RemainderPolicy,
    /// Smallest projection-back denominator used for division
    pub pb_den_floor: f64,
}

impl Default for GscParams {
    fn default() -> Self {
        Self {
            nfft: 512,
            fs: 16_000.0,
            nchannel: 4,
            nchannel_ds: 2,
            rls_ff: 0.99,
            rls_reg: 1e-2,
            pb_ff: 0.95,
            pb_ref_channel: 0,
            f_max: 8_000.0,
            remainder: RemainderPolicy::Drop,
            pb_den_floor: DEFAULT_PB_DEN_FLOOR,
        }
    }
}

impl GscParams {
    /// Create a builder starting from the defaults.
    pub fn builder() -> GscParamsBuilder {
        GscParamsBuilder::default()
    }

    /// Combine a parsed configuration with the stream geometry.
    pub fn from_config(config: &GscConfig, nfft: usize, fs: f64, nchannel: usize) -> Self {
        Self {
            nfft,
            fs,
            nchannel,
            nchannel_ds: config.nchannel_ds,
            rls_ff: config.rls_ff,
            rls_reg: config.rls_reg,
            pb_ff: config.pb_ff,
            pb_ref_channel: config.pb_ref_channel,
            f_max: config.f_max,
            remainder: config.downsample_remainder,
            pb_den_floor: config.pb_den_floor,
        }
    }

    /// Number of bins in the non-negative half spectrum.
    pub fn half_spectrum_len(&self) -> usize {
        self.nfft / 2 + 1
    }

    /// Frequency spacing between adjacent bins in Hz.
    pub fn bin_width(&self) -> f64 {
        self.fs / self.nfft as f64
    }

    /// Number of blocking-matrix channels averaged into one reference.
    pub fn downsample_factor(&self) -> usize {
        self.nchannel / self.nchannel_ds.max(1)
    }

    /// Number of channels that actually feed the adaptive branch.
    pub fn used_channels(&self) -> usize {
        self.nchannel_ds * self.downsample_factor()
    }

    /// Expected length of an input frame.
    pub fn input_frame_len(&self) -> usize {
        self.nchannel * self.half_spectrum_len()
    }

    /// Expected number of reals in the fixed weight array.
    pub fn weight_len(&self) -> usize {
        2 * self.half_spectrum_len() * self.nchannel
    }

    /// Check every parameter range. Band emptiness is checked by
    /// [`FrequencyBand::from_params`](crate::band::FrequencyBand::from_params).
    pub fn validate(&self) -> GscResult<()> {
        if self.nfft < 2 {
            return Err(invalid(format!("nfft must be at least 2, got {}", self.nfft)));
        }
        if !(self.fs.is_finite() && self.fs > 0.0) {
            return Err(invalid(format!("fs must be positive, got {}", self.fs)));
        }
        if self.nchannel == 0 {
            return Err(invalid("nchannel must be at least 1".to_string()));
        }
        if self.nchannel_ds == 0 || self.nchannel_ds > self.nchannel {
            return Err(invalid(format!(
                "nchannel_ds must be in [1, {}], got {}",
                self.nchannel, self.nchannel_ds
            )));
        }
        if self.nchannel % self.nchannel_ds != 0 && self.remainder == RemainderPolicy::Reject {
            return Err(GscError::UnevenDownsampling {
                nchannel: self.nchannel,
                nchannel_ds: self.nchannel_ds,
            });
        }
        if !(self.rls_ff > 0.0 && self.rls_ff <= 1.0) {
            return Err(invalid(format!("rls_ff must be in (0, 1], got {}", self.rls_ff)));
        }
        if !(self.rls_reg.is_finite() && self.rls_reg > 0.0) {
            return Err(invalid(format!("rls_reg must be positive, got {}", self.rls_reg)));
        }
        if !(self.pb_ff > 0.0 && self.pb_ff < 1.0) {
            return Err(invalid(format!("pb_ff must be in (0, 1), got {}", self.pb_ff)));
        }
        if self.pb_ref_channel >= self.nchannel {
            return Err(invalid(format!(
                "pb_ref_channel {} out of range for {} channels",
                self.pb_ref_channel, self.nchannel
            )));
        }
        if !(self.f_max.is_finite() && self.f_max > 0.0) {
            return Err(invalid(format!("f_max must be positive, got {}", self.f_max)));
        }
        if !(self.pb_den_floor.is_finite() && self.pb_den_floor > 0.0) {
            return Err(invalid(format!(
                "pb_den_floor must be positive, got {}",
                self.pb_den_floor
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> GscError {
    GscError::InvalidParameter(msg)
}

/// Builder for GscParams
#[derive(Default)]
pub struct GscParamsBuilder {
    params: GscParams,
}

impl GscParamsBuilder {
    pub fn nfft(mut self, nfft: usize) -> Self {
        self.params.nfft = nfft;
        self
    }

    pub fn sample_rate(mut self, fs: f64) -> Self {
        self.params.fs = fs;
        self
    }

    /// Input channel count and downsampled reference channel count.
    pub fn channels(mut self, nchannel: usize, nchannel_ds: usize) -> Self {
        self.params.nchannel = nchannel;
        self.params.nchannel_ds = nchannel_ds;
        self
    }

    pub fn rls(mut self, ff: f64, reg: f64) -> Self {
        self.params.rls_ff = ff;
        self.params.rls_reg = reg;
        self
    }

    pub fn projection_back(mut self, ff: f64, ref_channel: usize) -> Self {
        self.params.pb_ff = ff;
        self.params.pb_ref_channel = ref_channel;
        self
    }

    pub fn f_max(mut self, f_max: f64) -> Self {
        self.params.f_max = f_max;
        self
    }

    pub fn remainder(mut self, policy: RemainderPolicy) -> Self {
        self.params.remainder = policy;
        self
    }

    pub fn pb_den_floor(mut self, floor: f64) -> Self {
        self.params.pb_den_floor = floor;
        self
    }

    pub fn build(self) -> GscParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GscParams::default().validate().is_ok());
    }

    #[test]
    fn test_derived_sizes() {
        let p = GscParams::builder().nfft(8).channels(4, 2).build();
        assert_eq!(p.half_spectrum_len(), 5);
        assert_eq!(p.input_frame_len(), 20);
        assert_eq!(p.weight_len(), 40);
        assert_eq!(p.downsample_factor(), 2);
        assert_eq!(p.used_channels(), 4);
    }

    #[test]
    fn test_uneven_channels_drop() {
        let p = GscParams::builder().channels(7, 2).build();
        assert!(p.validate().is_ok());
        assert_eq!(p.downsample_factor(), 3);
        assert_eq!(p.used_channels(), 6);
    }

    #[test]
    fn test_uneven_channels_reject() {
        let p = GscParams::builder()
            .channels(7, 2)
            .remainder(RemainderPolicy::Reject)
            .build();
        assert!(matches!(
            p.validate(),
            Err(GscError::UnevenDownsampling {
                nchannel: 7,
                nchannel_ds: 2
            })
        ));
    }

    #[test]
    fn test_forgetting_factor_ranges() {
        assert!(GscParams::builder().rls(1.0, 1.0).build().validate().is_ok());
        assert!(GscParams::builder().rls(0.0, 1.0).build().validate().is_err());
        assert!(GscParams::builder().rls(1.01, 1.0).build().validate().is_err());
        assert!(GscParams::builder().rls(0.9, 0.0).build().validate().is_err());
        assert!(GscParams::builder()
            .projection_back(1.0, 0)
            .build()
            .validate()
            .is_err());
    }

    #[test]
    fn test_reference_channel_range() {
        let p = GscParams::builder()
            .channels(4, 2)
            .projection_back(0.9, 4)
            .build();
        assert!(matches!(p.validate(), Err(GscError::InvalidParameter(_))));
    }

    #[test]
    fn test_downsampled_channels_range() {
        assert!(GscParams::builder().channels(4, 0).build().validate().is_err());
        assert!(GscParams::builder().channels(4, 5).build().validate().is_err());
    }

    #[test]
    fn test_remainder_policy_serde() {
        let p: RemainderPolicy = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(p, RemainderPolicy::Reject);
        assert_eq!(format!("{}", RemainderPolicy::Drop), "drop");
    }
}
