//! Frequency-domain Generalized Sidelobe Canceller (GSC)
//!
//! Each STFT frame flows through a fixed beamformer toward the target and an
//! adaptive branch that predicts and subtracts what the fixed output picked
//! up from interferers. Every processed bin is handled independently.
//!
//! Architecture (per bin):
//! ```text
//!   x ──┬── w^H ───────────────────────── y ──(+)── e ── × g ──► out
//!       │                                       (-)        ▲
//!       └── x - w y ── mean ── b ── RLS ── wa^H b ┘        │
//!                    (groups)                  projection back (x_ref)
//! ```
//!
//! `w` are the fixed weights, `wa` the RLS weights, `g` the projection-back
//! gain anchoring the output to a reference channel. Bins outside the
//! processed band are zero in the output.
//!
//! # Example
//!
//! ```
//! use gsc_core::gsc::GeneralizedSidelobeCanceller;
//! use gsc_core::params::GscParams;
//! use gsc_core::types::Complex;
//!
//! // 4 channels, 8-point FFT: 5 bins per channel
//! let params = GscParams::builder()
//!     .nfft(8)
//!     .sample_rate(8_000.0)
//!     .channels(4, 2)
//!     .rls(0.98, 1.0)
//!     .projection_back(0.9, 0)
//!     .f_max(4_000.0)
//!     .build();
//!
//! // Fixed weights selecting channel 0 in every bin
//! let mut weights = vec![0.0; params.weight_len()];
//! for bin in 0..params.half_spectrum_len() {
//!     weights[2 * bin * 4] = 1.0;
//! }
//!
//! let mut gsc = GeneralizedSidelobeCanceller::new(params, &weights).unwrap();
//! let input = vec![Complex::new(1.0, 0.0); 20];
//! let mut output = vec![Complex::new(0.0, 0.0); 5];
//! gsc.process(&input, &mut output).unwrap();
//!
//! assert_eq!(output[0], Complex::new(0.0, 0.0)); // DC is never processed
//! assert_eq!(output[4], Complex::new(0.0, 0.0)); // above the band
//! ```

use std::path::Path;

use crate::band::FrequencyBand;
use crate::beamformer::{block, fixed_output};
use crate::config::{GscConfig, WeightFile};
use crate::downsample::ChannelDownsampler;
use crate::observe::{HealthSnapshot, NumericHealth};
use crate::params::GscParams;
use crate::projback::{ProjectionBack, Rescale};
use crate::rls::RlsCanceller;
use crate::types::{Complex, GscError, GscResult, ZERO};
use crate::weights::FixedWeights;

/// Largest output energy of a bin relative to the energy of its inputs.
/// Anything above is treated as a runaway adaptive branch.
const OUTPUT_ENERGY_LIMIT: f64 = 1e6;

/// True when `out` is far outside the scale of the fixed output `y` and the
/// channel samples `x`, or not a number.
fn exceeds_input_scale(out: Complex, y: Complex, x: &[Complex]) -> bool {
    let energy = y.norm_sqr() + x.iter().map(|v| v.norm_sqr()).sum::<f64>();
    !(out.norm_sqr() <= OUTPUT_ENERGY_LIMIT * energy)
}

/// The Generalized Sidelobe Canceller.
///
/// All buffers are sized in the constructor and reused; `process` does not
/// allocate.
#[derive(Debug, Clone)]
pub struct GeneralizedSidelobeCanceller {
    params: GscParams,
    band: FrequencyBand,
    fixed_weights: FixedWeights,
    downsampler: ChannelDownsampler,
    rls: RlsCanceller,
    projback: ProjectionBack,
    /// Fixed beamformer output per band bin.
    output_fixed: Vec<Complex>,
    /// Blocking-matrix output, band bins × nchannel.
    blocked: Vec<Complex>,
    /// Downsampled references, band bins × nchannel_ds.
    refs: Vec<Complex>,
    /// Bins whose input samples were all finite this frame.
    active: Vec<bool>,
    health: NumericHealth,
}

impl GeneralizedSidelobeCanceller {
    /// Build a canceller from validated parameters and the interleaved
    /// fixed weight array (`2 × (nfft/2 + 1) × nchannel` reals).
    pub fn new(params: GscParams, fixed_weights: &[f64]) -> GscResult<Self> {
        params.validate()?;
        let band = FrequencyBand::from_params(&params)?;
        let fixed_weights =
            FixedWeights::from_interleaved(fixed_weights, &params, &band)?;
        let downsampler = ChannelDownsampler::new(&params);

        let nfreq = band.len();
        let rls = RlsCanceller::new(nfreq, params.nchannel_ds, params.rls_ff, params.rls_reg);
        let projback = ProjectionBack::new(nfreq, params.pb_ff, params.pb_den_floor);

        tracing::debug!(
            nfft = params.nfft,
            fs = params.fs,
            nchannel = params.nchannel,
            nchannel_ds = params.nchannel_ds,
            factor = downsampler.factor(),
            band_start = band.start(),
            band_end = band.end(),
            "generalized sidelobe canceller ready"
        );

        Ok(Self {
            output_fixed: vec![ZERO; nfreq],
            blocked: vec![ZERO; nfreq * params.nchannel],
            refs: vec![ZERO; nfreq * params.nchannel_ds],
            active: vec![false; nfreq],
            health: NumericHealth::new(),
            params,
            band,
            fixed_weights,
            downsampler,
            rls,
            projback,
        })
    }

    /// Build from a parsed configuration, weight file and stream geometry.
    pub fn from_config(
        config: &GscConfig,
        weights: &WeightFile,
        nfft: usize,
        fs: f64,
        nchannel: usize,
    ) -> GscResult<Self> {
        let params = GscParams::from_config(config, nfft, fs, nchannel);
        Self::new(params, &weights.fixed_weights)
    }

    /// Load the parameter and weight files and build the canceller.
    pub fn from_files(
        config_path: &Path,
        weights_path: &Path,
        nfft: usize,
        fs: f64,
        nchannel: usize,
    ) -> GscResult<Self> {
        let config = GscConfig::load_from(config_path)?;
        let weights = WeightFile::load_from(weights_path)?;
        Self::from_config(&config, &weights, nfft, fs, nchannel)
    }

    /// Process one frame.
    ///
    /// `input` holds `nchannel × (nfft/2 + 1)` samples, bin-major;
    /// `output` receives `nfft/2 + 1` samples. Frames must arrive in
    /// temporal order. A wrong buffer length is reported before any state
    /// is touched.
    pub fn process(&mut self, input: &[Complex], output: &mut [Complex]) -> GscResult<()> {
        let expected_in = self.params.input_frame_len();
        if input.len() != expected_in {
            return Err(GscError::BufferSizeMismatch {
                expected: expected_in,
                actual: input.len(),
            });
        }
        let expected_out = self.params.half_spectrum_len();
        if output.len() != expected_out {
            return Err(GscError::BufferSizeMismatch {
                expected: expected_out,
                actual: output.len(),
            });
        }

        output.fill(ZERO);

        let nch = self.params.nchannel;
        let nds = self.params.nchannel_ds;
        let start = self.band.start();

        // Fixed beamformer, blocking matrix, downsampling
        let mut nonfinite = 0;
        for f in 0..self.band.len() {
            let x = &input[(start + f) * nch..(start + f + 1) * nch];
            let blocked = &mut self.blocked[f * nch..(f + 1) * nch];
            let refs = &mut self.refs[f * nds..(f + 1) * nds];

            if !x.iter().all(|v| v.re.is_finite() && v.im.is_finite()) {
                self.active[f] = false;
                self.output_fixed[f] = ZERO;
                blocked.fill(ZERO);
                refs.fill(ZERO);
                nonfinite += 1;
                continue;
            }
            self.active[f] = true;

            let w = self.fixed_weights.row(f);
            let y = fixed_output(w, x);
            self.output_fixed[f] = y;
            block(w, x, y, blocked);
            self.downsampler.apply(blocked, refs);
        }

        // Adaptive weights
        let summary = self
            .rls
            .update_all(&self.refs, &self.output_fixed, &self.active);
        let mut rls_resets = summary.resets;

        // Output combiner and projection back
        let (mut clamps, mut pb_resets) = (0, 0);
        let ref_channel = self.params.pb_ref_channel;
        for f in 0..self.band.len() {
            if !self.active[f] {
                continue;
            }
            let x = &input[(start + f) * nch..(start + f + 1) * nch];
            let refs = &self.refs[f * nds..(f + 1) * nds];
            let y = self.output_fixed[f];
            let mut out = y - self.rls.bin(f).predict(refs);

            // Keep a runaway prediction out of the output and the
            // projection-back statistics
            if exceeds_input_scale(out, y, x) {
                self.rls.reset_bin(f);
                rls_resets += 1;
                out = y;
            }

            let reference = x[ref_channel];
            match self.projback.process(f, &mut out, reference) {
                Rescale::Applied => {}
                Rescale::Clamped => clamps += 1,
                Rescale::Reset => pb_resets += 1,
            }
            output[start + f] = out;
        }

        self.health.record_frame();
        self.health.record_nonfinite_bins(nonfinite);
        self.health.record_rls_resets(rls_resets);
        self.health.record_rls_bounded(summary.bounded);
        self.health.record_pb_clamps(clamps);
        self.health.record_pb_resets(pb_resets);

        Ok(())
    }

    /// Process a sequence of frames, returning one output frame each.
    pub fn process_batch(&mut self, frames: &[Vec<Complex>]) -> GscResult<Vec<Vec<Complex>>> {
        let out_len = self.params.half_spectrum_len();
        frames
            .iter()
            .map(|frame| {
                let mut output = vec![ZERO; out_len];
                self.process(frame, &mut output)?;
                Ok(output)
            })
            .collect()
    }

    /// Return all adaptive state to its initial values. Fixed weights and
    /// the band are kept.
    pub fn reset(&mut self) {
        self.rls.reset();
        self.projback.reset();
        self.health.reset();
        self.output_fixed.fill(ZERO);
        self.blocked.fill(ZERO);
        self.refs.fill(ZERO);
        self.active.fill(false);
    }

    pub fn params(&self) -> &GscParams {
        &self.params
    }

    pub fn band(&self) -> &FrequencyBand {
        &self.band
    }

    pub fn fixed_weights(&self) -> &FixedWeights {
        &self.fixed_weights
    }

    pub fn downsampler(&self) -> &ChannelDownsampler {
        &self.downsampler
    }

    /// Adaptive weights of a band-relative bin.
    ///
    /// # Panics
    ///
    /// Panics if `f >= band().len()`, as do the other per-bin accessors.
    pub fn adaptive_weights(&self, f: usize) -> &[Complex] {
        self.rls.bin(f).weights()
    }

    /// Inverse covariance of a band-relative bin, row-major.
    ///
    /// Panics if `f >= band().len()`.
    pub fn inverse_covariance(&self, f: usize) -> &[Complex] {
        self.rls.bin(f).inverse_covariance()
    }

    /// Cross-covariance of a band-relative bin.
    ///
    /// Panics if `f >= band().len()`.
    pub fn cross_covariance(&self, f: usize) -> &[Complex] {
        self.rls.bin(f).cross_covariance()
    }

    /// Current projection-back gain of a band-relative bin.
    ///
    /// Panics if `f >= band().len()`.
    pub fn projection_gain(&self, f: usize) -> Complex {
        self.projback.gain(f)
    }

    /// Fixed beamformer output of the last frame.
    ///
    /// Panics if `f >= band().len()`.
    pub fn last_fixed_output(&self, f: usize) -> Complex {
        self.output_fixed[f]
    }

    /// Blocking-matrix output of the last frame.
    ///
    /// Panics if `f >= band().len()`.
    pub fn last_blocking_output(&self, f: usize) -> &[Complex] {
        let nch = self.params.nchannel;
        &self.blocked[f * nch..(f + 1) * nch]
    }

    /// Downsampled references of the last frame.
    ///
    /// Panics if `f >= band().len()`.
    pub fn last_references(&self, f: usize) -> &[Complex] {
        let nds = self.params.nchannel_ds;
        &self.refs[f * nds..(f + 1) * nds]
    }

    pub fn frames_processed(&self) -> u64 {
        self.health.frames()
    }

    pub fn health(&self) -> HealthSnapshot {
        self.health.snapshot()
    }
}
