//! # Per-bin Recursive Least Squares (RLS) canceller
//!
//! Each processed bin runs its own RLS estimator predicting the fixed
//! beamformer output `y` from the downsampled references `b`. The inverse
//! covariance is tracked directly with the Sherman-Morrison identity, which
//! costs O(n²) per bin instead of an O(n³) inversion.
//!
//! ## Algorithm
//!
//! ```text
//! p  ← λ p + conj(y) b
//! u  ← P b
//! v  ← 1 / (λ + Re(b^H u))
//! P  ← (1/λ) (P - v u u^H)
//! w  ← P p
//! ```
//!
//! where λ is the forgetting factor and `P` starts at `I / reg`. `P` is the
//! inverse of `λ^k reg I + Σ λ^{k-i} b_i b_i^H`, so `w` solves the
//! exponentially weighted, regularized normal equations.
//!
//! Bins never share state, so the update can run over bins in any order or
//! in parallel (`parallel` feature).
//!
//! ## Numeric health
//!
//! `P` is re-symmetrized after every update. A bin whose gain denominator,
//! diagonal, or weights stop being finite and positive is reset to its
//! initial state and reported to the caller.
//!
//! Directions of `P` that receive no reference energy grow by `1/λ` every
//! frame (covariance windup), e.g. a reference group that is always silent
//! or any pause in the input. Diagonal entries are therefore capped at
//! [`INVERSE_COVARIANCE_LIMIT`]` / reg` with the congruence `P ← D P D`,
//! `D_ii = sqrt(limit / P_ii)` for the entries over the limit and 1
//! elsewhere. `P` stays Hermitian positive definite and the rows of excited
//! directions keep their diagonal, so converged weights survive.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::types::{Complex, ZERO};

/// Largest allowed diagonal of `P`, relative to its initial value `1 / reg`.
pub const INVERSE_COVARIANCE_LIMIT: f64 = 1e6;

/// Scalars shared by every bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RlsSettings {
    /// Forgetting factor λ in (0, 1].
    pub ff: f64,
    /// Cached 1 / λ.
    pub ff_inv: f64,
    /// Regularization; the initial inverse covariance is `I / reg`.
    pub reg: f64,
    /// Cap on each diagonal entry of `P`.
    pub max_diag: f64,
}

impl RlsSettings {
    pub fn new(ff: f64, reg: f64) -> Self {
        Self {
            ff,
            ff_inv: 1.0 / ff,
            reg,
            max_diag: INVERSE_COVARIANCE_LIMIT / reg,
        }
    }
}

/// Outcome of one bin update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinUpdate {
    /// Statistics and weights were updated.
    Updated,
    /// Updated, with unexcited directions of `P` capped at the limit.
    Bounded,
    /// The update degenerated and the bin was returned to its initial state.
    Reset,
}

impl BinUpdate {
    pub fn is_reset(self) -> bool {
        self == BinUpdate::Reset
    }

    pub fn is_bounded(self) -> bool {
        self == BinUpdate::Bounded
    }
}

/// Outcome counts of one pass over all bins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Bins returned to their initial state
    pub resets: usize,
    /// Bins whose inverse covariance hit the diagonal cap
    pub bounded: usize,
}

impl UpdateSummary {
    fn of(outcome: BinUpdate) -> Self {
        Self {
            resets: outcome.is_reset() as usize,
            bounded: outcome.is_bounded() as usize,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            resets: self.resets + other.resets,
            bounded: self.bounded + other.bounded,
        }
    }
}

/// RLS state of a single frequency bin.
#[derive(Debug, Clone)]
pub struct RlsBinState {
    n: usize,
    /// Inverse covariance P (n × n, row-major), Hermitian positive definite.
    inv_cov: Vec<Complex>,
    /// Cross-covariance between references and the fixed output.
    xcov: Vec<Complex>,
    /// Adaptive weights w = P p.
    weights: Vec<Complex>,
    /// Scratch for u = P b.
    u: Vec<Complex>,
}

impl RlsBinState {
    /// Create a bin with `n` references in its initial state.
    pub fn new(n: usize, reg: f64) -> Self {
        let mut state = Self {
            n,
            inv_cov: vec![ZERO; n * n],
            xcov: vec![ZERO; n],
            weights: vec![ZERO; n],
            u: vec![ZERO; n],
        };
        state.reset(reg);
        state
    }

    /// Return to `P = I / reg`, `p = 0`, `w = 0`.
    pub fn reset(&mut self, reg: f64) {
        let n = self.n;
        self.inv_cov.fill(ZERO);
        let diag = Complex::new(1.0 / reg, 0.0);
        for i in 0..n {
            self.inv_cov[i * n + i] = diag;
        }
        self.xcov.fill(ZERO);
        self.weights.fill(ZERO);
        self.u.fill(ZERO);
    }

    /// Number of references.
    pub fn order(&self) -> usize {
        self.n
    }

    /// Inverse covariance, row-major.
    pub fn inverse_covariance(&self) -> &[Complex] {
        &self.inv_cov
    }

    pub fn cross_covariance(&self) -> &[Complex] {
        &self.xcov
    }

    pub fn weights(&self) -> &[Complex] {
        &self.weights
    }

    /// Predicted interference `w^H b`.
    #[inline]
    pub fn predict(&self, b: &[Complex]) -> Complex {
        self.weights
            .iter()
            .zip(b)
            .fold(ZERO, |acc, (w, bi)| acc + w.conj() * *bi)
    }

    /// Fold one frame into the statistics and re-solve for the weights.
    pub fn update(&mut self, b: &[Complex], y: Complex, settings: &RlsSettings) -> BinUpdate {
        let n = self.n;
        let ff = settings.ff;

        // p ← λ p + conj(y) b
        let y_conj = y.conj();
        for (p, &bi) in self.xcov.iter_mut().zip(b) {
            *p = *p * ff + y_conj * bi;
        }

        // u ← P b
        for i in 0..n {
            let row = &self.inv_cov[i * n..(i + 1) * n];
            self.u[i] = row.iter().zip(b).fold(ZERO, |acc, (pij, bj)| acc + pij * bj);
        }

        // b^H P b is real for Hermitian P
        let bhu: f64 = b
            .iter()
            .zip(&self.u)
            .map(|(bi, ui)| (bi.conj() * ui).re)
            .sum();
        let denom = ff + bhu;
        if !(denom.is_finite() && denom > 0.0) {
            self.reset(settings.reg);
            return BinUpdate::Reset;
        }
        let v = 1.0 / denom;

        // P ← (1/λ) (P - v u u^H), upper triangle then mirrored
        let ff_inv = settings.ff_inv;
        for i in 0..n {
            let ui = self.u[i] * v;
            let diag = (self.inv_cov[i * n + i] - ui * self.u[i].conj()) * ff_inv;
            self.inv_cov[i * n + i] = Complex::new(diag.re, 0.0);
            for j in (i + 1)..n {
                let pij = (self.inv_cov[i * n + j] - ui * self.u[j].conj()) * ff_inv;
                self.inv_cov[i * n + j] = pij;
                self.inv_cov[j * n + i] = pij.conj();
            }
        }

        if !(0..n).all(|i| {
            let d = self.inv_cov[i * n + i].re;
            d.is_finite() && d > 0.0
        }) {
            self.reset(settings.reg);
            return BinUpdate::Reset;
        }

        let bounded = self.bound_windup(settings.max_diag);

        // w ← P p
        for i in 0..n {
            let row = &self.inv_cov[i * n..(i + 1) * n];
            self.weights[i] = row
                .iter()
                .zip(&self.xcov)
                .fold(ZERO, |acc, (pij, pj)| acc + pij * pj);
        }

        if !self.weights.iter().all(|w| w.re.is_finite() && w.im.is_finite()) {
            self.reset(settings.reg);
            return BinUpdate::Reset;
        }

        if bounded {
            BinUpdate::Bounded
        } else {
            BinUpdate::Updated
        }
    }

    /// Cap diagonal entries of `P` above `max_diag` by `P ← D P D`.
    /// Returns true if any entry was capped.
    fn bound_windup(&mut self, max_diag: f64) -> bool {
        let n = self.n;
        if (0..n).all(|i| self.inv_cov[i * n + i].re <= max_diag) {
            return false;
        }

        // u is free after the covariance update; reuse it for D
        for i in 0..n {
            let d = self.inv_cov[i * n + i].re;
            let scale = if d > max_diag { (max_diag / d).sqrt() } else { 1.0 };
            self.u[i] = Complex::new(scale, 0.0);
        }
        for i in 0..n {
            let di = self.u[i].re;
            for j in 0..n {
                self.inv_cov[i * n + j] *= di * self.u[j].re;
            }
            let diag = self.inv_cov[i * n + i].re;
            self.inv_cov[i * n + i] = Complex::new(diag, 0.0);
        }
        true
    }
}

/// The RLS stage over every processed bin.
#[derive(Debug, Clone)]
pub struct RlsCanceller {
    settings: RlsSettings,
    order: usize,
    bins: Vec<RlsBinState>,
}

impl RlsCanceller {
    /// Create `num_bins` independent estimators with `order` references each.
    pub fn new(num_bins: usize, order: usize, ff: f64, reg: f64) -> Self {
        let bins = (0..num_bins).map(|_| RlsBinState::new(order, reg)).collect();
        Self {
            settings: RlsSettings::new(ff, reg),
            order,
            bins,
        }
    }

    pub fn settings(&self) -> &RlsSettings {
        &self.settings
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// State of a band-relative bin.
    ///
    /// # Panics
    ///
    /// Panics if `f >= num_bins()`.
    pub fn bin(&self, f: usize) -> &RlsBinState {
        &self.bins[f]
    }

    /// Update every bin whose `active` flag is set.
    ///
    /// `refs` holds `order` references per bin, bin-major; `fixed` holds the
    /// fixed beamformer output per bin.
    pub fn update_all(
        &mut self,
        refs: &[Complex],
        fixed: &[Complex],
        active: &[bool],
    ) -> UpdateSummary {
        let settings = self.settings;
        let order = self.order;
        let step = |state: &mut RlsBinState, b: &[Complex], y: Complex, on: bool| {
            if on {
                UpdateSummary::of(state.update(b, y, &settings))
            } else {
                UpdateSummary::default()
            }
        };

        #[cfg(not(feature = "parallel"))]
        let summary = self
            .bins
            .iter_mut()
            .zip(refs.chunks_exact(order))
            .zip(fixed.iter())
            .zip(active.iter())
            .map(|(((state, b), &y), &on)| step(state, b, y, on))
            .fold(UpdateSummary::default(), UpdateSummary::merge);

        #[cfg(feature = "parallel")]
        let summary = self
            .bins
            .par_iter_mut()
            .zip(refs.par_chunks_exact(order))
            .zip(fixed.par_iter())
            .zip(active.par_iter())
            .map(|(((state, b), &y), &on)| step(state, b, y, on))
            .reduce(UpdateSummary::default, UpdateSummary::merge);

        summary
    }

    /// Return one band-relative bin to its initial state.
    ///
    /// # Panics
    ///
    /// Panics if `f >= num_bins()`.
    pub fn reset_bin(&mut self, f: usize) {
        let reg = self.settings.reg;
        self.bins[f].reset(reg);
    }

    /// Return every bin to its initial state.
    pub fn reset(&mut self) {
        let reg = self.settings.reg;
        for state in &mut self.bins {
            state.reset(reg);
        }
    }
}
