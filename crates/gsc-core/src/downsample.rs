//! Channel downsampler for the adaptive branch
//!
//! Groups of `factor` consecutive blocking-matrix channels are averaged into
//! one reference channel:
//!
//! ```text
//!   ref_k = (1/factor) · Σ_{c = k·factor}^{(k+1)·factor - 1} b_c
//! ```
//!
//! Fewer references mean fewer adaptive coefficients per bin, faster
//! convergence and a smaller matrix to keep well conditioned. With
//! `factor = 1` the transform is the identity. Channels past
//! `nchannel_ds · factor` belong to no group and are dropped; whether that is
//! allowed is decided by [`RemainderPolicy`](crate::params::RemainderPolicy)
//! at construction.

use crate::params::GscParams;
use crate::types::{Complex, ZERO};

/// Averages groups of consecutive channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDownsampler {
    nchannel: usize,
    nchannel_ds: usize,
    factor: usize,
}

impl ChannelDownsampler {
    /// Parameters must already be validated.
    pub fn new(params: &GscParams) -> Self {
        let downsampler = Self {
            nchannel: params.nchannel,
            nchannel_ds: params.nchannel_ds,
            factor: params.downsample_factor(),
        };

        if downsampler.dropped_channels() > 0 {
            tracing::warn!(
                nchannel = downsampler.nchannel,
                nchannel_ds = downsampler.nchannel_ds,
                first_dropped = downsampler.used_channels(),
                "channels {}..{} excluded from the adaptive branch",
                downsampler.used_channels(),
                downsampler.nchannel
            );
        }

        downsampler
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn output_channels(&self) -> usize {
        self.nchannel_ds
    }

    /// Channels that contribute to some group.
    pub fn used_channels(&self) -> usize {
        self.nchannel_ds * self.factor
    }

    /// Trailing channels that belong to no group.
    pub fn dropped_channels(&self) -> usize {
        self.nchannel - self.used_channels()
    }

    /// Average one bin's blocking-matrix channels into `out`.
    ///
    /// `input` has `nchannel` entries, `out` has `nchannel_ds`.
    #[inline]
    pub fn apply(&self, input: &[Complex], out: &mut [Complex]) {
        if self.factor == 1 {
            out.copy_from_slice(&input[..self.nchannel_ds]);
            return;
        }

        let scale = 1.0 / self.factor as f64;
        for (o, group) in out.iter_mut().zip(input.chunks_exact(self.factor)) {
            *o = group.iter().fold(ZERO, |acc, &v| acc + v) * scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downsampler(nchannel: usize, nchannel_ds: usize) -> ChannelDownsampler {
        let params = GscParams::builder().channels(nchannel, nchannel_ds).build();
        ChannelDownsampler::new(&params)
    }

    fn ramp(n: usize) -> Vec<Complex> {
        (0..n)
            .map(|c| Complex::new(c as f64 + 1.0, -(c as f64)))
            .collect()
    }

    #[test]
    fn test_identity_when_factor_one() {
        let ds = downsampler(4, 4);
        assert_eq!(ds.factor(), 1);
        let input = ramp(4);
        let mut out = vec![ZERO; 4];
        ds.apply(&input, &mut out);
        assert_eq!(out, input);
    }

    #[test]
    fn test_mean_not_sum() {
        let ds = downsampler(4, 2);
        let input = ramp(4);
        let mut out = vec![ZERO; 2];
        ds.apply(&input, &mut out);
        assert_eq!(out[0], (input[0] + input[1]) * 0.5);
        assert_eq!(out[1], (input[2] + input[3]) * 0.5);
    }

    #[test]
    fn test_trailing_channels_dropped() {
        // 7 channels into 2 groups of 3, channel 6 is not averaged anywhere
        let ds = downsampler(7, 2);
        assert_eq!(ds.factor(), 3);
        assert_eq!(ds.used_channels(), 6);
        assert_eq!(ds.dropped_channels(), 1);

        let mut input = ramp(7);
        let mut out = vec![ZERO; 2];
        ds.apply(&input, &mut out);
        let before = out.clone();

        input[6] = Complex::new(1e6, 1e6);
        ds.apply(&input, &mut out);
        assert_eq!(out, before);

        let expected = (input[3] + input[4] + input[5]) / 3.0;
        assert!((out[1] - expected).norm() < 1e-12);
    }

    #[test]
    fn test_identity_ignores_nothing_on_even_split() {
        assert_eq!(downsampler(8, 2).dropped_channels(), 0);
        assert_eq!(downsampler(6, 3).factor(), 2);
    }
}
