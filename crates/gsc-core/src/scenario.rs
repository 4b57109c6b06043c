//! Synthetic multichannel STFT frames
//!
//! Generates reproducible frames for tests and benchmarks: a unit tone on a
//! target channel, an optional random-phase interferer on another channel
//! that leaks into the target channel from a given frame on, and complex
//! Gaussian sensor noise on every channel.
//!
//! ```rust
//! use gsc_core::scenario::{Scenario, ScenarioConfig};
//!
//! let mut scenario = Scenario::new(ScenarioConfig {
//!     nfft: 8,
//!     nchannel: 4,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let frame = scenario.next_frame();
//! assert_eq!(frame.input.len(), 4 * 5);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;

use crate::types::{Complex, GscError, GscResult, ZERO};

/// Scenario parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub nfft: usize,
    pub nchannel: usize,
    /// Channel carrying the target tone
    pub target_channel: usize,
    /// Channel carrying the interferer
    pub interferer_channel: usize,
    /// First frame containing the interferer
    pub onset_frame: u64,
    pub interferer_amplitude: f64,
    /// Fraction of the interferer that reaches the target channel
    pub leakage: f64,
    /// Standard deviation of the sensor noise per real dimension
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            nfft: 512,
            nchannel: 4,
            target_channel: 0,
            interferer_channel: 1,
            onset_frame: 10,
            interferer_amplitude: 2.0,
            leakage: 0.8,
            noise_std: 0.0,
            seed: 42,
        }
    }
}

/// One generated frame with its components, band-independent.
#[derive(Debug, Clone)]
pub struct ScenarioFrame {
    /// `nchannel × (nfft/2 + 1)` samples, bin-major
    pub input: Vec<Complex>,
    /// Target tone per bin
    pub target: Vec<Complex>,
    /// Interferer per bin (zero before onset)
    pub interferer: Vec<Complex>,
}

/// Deterministic frame source.
#[derive(Debug, Clone)]
pub struct Scenario {
    config: ScenarioConfig,
    nbin: usize,
    noise: Normal<f64>,
    rng: StdRng,
    frame: u64,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> GscResult<Self> {
        if config.nfft < 2 || config.nchannel == 0 {
            return Err(GscError::InvalidParameter(format!(
                "scenario needs nfft >= 2 and at least one channel, got nfft={} nchannel={}",
                config.nfft, config.nchannel
            )));
        }
        if config.target_channel >= config.nchannel || config.interferer_channel >= config.nchannel {
            return Err(GscError::InvalidParameter(format!(
                "scenario channels {} and {} out of range for {} channels",
                config.target_channel, config.interferer_channel, config.nchannel
            )));
        }
        let noise = Normal::new(0.0, config.noise_std)
            .map_err(|e| GscError::InvalidParameter(format!("noise_std: {}", e)))?;

        Ok(Self {
            nbin: config.nfft / 2 + 1,
            rng: StdRng::seed_from_u64(config.seed),
            noise,
            config,
            frame: 0,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Frames generated so far.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn next_frame(&mut self) -> ScenarioFrame {
        let nch = self.config.nchannel;
        let mut input = vec![ZERO; nch * self.nbin];
        let mut target = vec![ZERO; self.nbin];
        let mut interferer = vec![ZERO; self.nbin];
        let active = self.frame >= self.config.onset_frame;

        for bin in 0..self.nbin {
            // Distinct phase advance per bin
            let phase = 0.5 * (bin as f64) * (self.frame as f64) + 0.2;
            target[bin] = Complex::from_polar(1.0, phase);
            if active {
                let theta = self.rng.gen_range(0.0..TAU);
                interferer[bin] = Complex::from_polar(self.config.interferer_amplitude, theta);
            }

            let x = &mut input[bin * nch..(bin + 1) * nch];
            x[self.config.target_channel] += target[bin] + interferer[bin] * self.config.leakage;
            x[self.config.interferer_channel] += interferer[bin];
            if self.config.noise_std > 0.0 {
                for v in x.iter_mut() {
                    *v += Complex::new(
                        self.noise.sample(&mut self.rng),
                        self.noise.sample(&mut self.rng),
                    );
                }
            }
        }

        self.frame += 1;
        ScenarioFrame {
            input,
            target,
            interferer,
        }
    }

    /// Generate `n` frames.
    pub fn take_frames(&mut self, n: usize) -> Vec<ScenarioFrame> {
        (0..n).map(|_| self.next_frame()).collect()
    }

    /// Interleaved fixed weights of unit gain on the target channel, in the
    /// layout the canceller loads.
    pub fn steering_weights(&self) -> Vec<f64> {
        let nch = self.config.nchannel;
        let mut weights = vec![0.0; 2 * self.nbin * nch];
        for bin in 0..self.nbin {
            weights[2 * (bin * nch + self.config.target_channel)] = 1.0;
        }
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ScenarioConfig {
        ScenarioConfig {
            nfft: 8,
            nchannel: 4,
            onset_frame: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_onset() {
        let mut scenario = Scenario::new(small()).unwrap();
        let frames = scenario.take_frames(5);
        for frame in &frames[..3] {
            assert!(frame.interferer.iter().all(|v| *v == ZERO));
            for bin in 0..5 {
                assert_eq!(frame.input[bin * 4], frame.target[bin]);
                assert_eq!(frame.input[bin * 4 + 1], ZERO);
            }
        }
        for frame in &frames[3..] {
            for bin in 0..5 {
                assert!((frame.interferer[bin].norm() - 2.0).abs() < 1e-12);
                assert_eq!(frame.input[bin * 4 + 1], frame.interferer[bin]);
            }
        }
        assert_eq!(scenario.frame_index(), 5);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let config = ScenarioConfig {
            noise_std: 0.1,
            ..small()
        };
        let a = Scenario::new(config.clone()).unwrap().take_frames(8);
        let b = Scenario::new(config).unwrap().take_frames(8);
        for (fa, fb) in a.iter().zip(&b) {
            assert_eq!(fa.input, fb.input);
        }
    }

    #[test]
    fn test_steering_weights_layout() {
        let scenario = Scenario::new(ScenarioConfig {
            target_channel: 2,
            ..small()
        })
        .unwrap();
        let w = scenario.steering_weights();
        assert_eq!(w.len(), 2 * 5 * 4);
        assert_eq!(w.iter().filter(|&&v| v == 1.0).count(), 5);
        assert_eq!(w[2 * (3 * 4 + 2)], 1.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(Scenario::new(ScenarioConfig {
            interferer_channel: 4,
            ..small()
        })
        .is_err());
        assert!(Scenario::new(ScenarioConfig {
            noise_std: -1.0,
            ..small()
        })
        .is_err());
    }
}
