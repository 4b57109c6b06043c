//! Projection-back rescaling
//!
//! Adaptive filtering leaves each bin with an arbitrary complex gain. This
//! stage tracks a single-tap least-squares fit of the output onto a
//! reference input channel and applies it:
//!
//! ```text
//!   num ← α num + (1 - α) conj(out) x_ref
//!   den ← α den + (1 - α) |out|²
//!   out ← out · num / max(den, floor)
//! ```
//!
//! Both statistics start at 1 so the gain is neutral before any frames
//! arrive. During long silence `den` decays toward zero; the floor bounds
//! the gain and the clamp is reported.

use crate::types::{Complex, ONE};

/// Outcome of rescaling one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rescale {
    /// Gain computed from the running statistics.
    Applied,
    /// Denominator was below the floor; the floor was used instead.
    Clamped,
    /// Statistics degenerated; the bin was reset and passed with unit gain.
    Reset,
}

/// Per-bin projection-back statistics.
#[derive(Debug, Clone)]
pub struct ProjectionBack {
    ff: f64,
    one_minus_ff: f64,
    den_floor: f64,
    num: Vec<Complex>,
    den: Vec<f64>,
}

impl ProjectionBack {
    pub fn new(num_bins: usize, ff: f64, den_floor: f64) -> Self {
        Self {
            ff,
            one_minus_ff: 1.0 - ff,
            den_floor,
            num: vec![ONE; num_bins],
            den: vec![1.0; num_bins],
        }
    }

    pub fn num_bins(&self) -> usize {
        self.num.len()
    }

    /// Current gain of a band-relative bin, without updating.
    pub fn gain(&self, f: usize) -> Complex {
        self.num[f] / self.den[f].max(self.den_floor)
    }

    pub fn numerator(&self, f: usize) -> Complex {
        self.num[f]
    }

    pub fn denominator(&self, f: usize) -> f64 {
        self.den[f]
    }

    /// Update the statistics of bin `f` with the current output and the
    /// reference channel sample, then rescale `out` in place.
    #[inline]
    pub fn process(&mut self, f: usize, out: &mut Complex, reference: Complex) -> Rescale {
        let num = self.ff * self.num[f] + self.one_minus_ff * (out.conj() * reference);
        let den = self.ff * self.den[f] + self.one_minus_ff * out.norm_sqr();
        self.num[f] = num;
        self.den[f] = den;

        let (gain, outcome) = if den >= self.den_floor {
            (num / den, Rescale::Applied)
        } else {
            (num / self.den_floor, Rescale::Clamped)
        };

        if !(gain.re.is_finite() && gain.im.is_finite()) {
            self.num[f] = ONE;
            self.den[f] = 1.0;
            return Rescale::Reset;
        }

        *out *= gain;
        outcome
    }

    /// Return every bin to neutral gain.
    pub fn reset(&mut self) {
        self.num.fill(ONE);
        self.den.fill(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ZERO;

    #[test]
    fn test_initially_neutral() {
        let pb = ProjectionBack::new(4, 0.9, 1e-10);
        for f in 0..4 {
            assert_eq!(pb.gain(f), ONE);
        }
    }

    #[test]
    fn test_neutral_when_output_matches_reference() {
        let mut pb = ProjectionBack::new(1, 0.9, 1e-10);
        for k in 0..200 {
            let x = Complex::from_polar(0.5 + 0.1 * (k % 3) as f64, 0.4 * k as f64);
            let mut out = x;
            pb.process(0, &mut out, x);
            if k > 100 {
                assert!((out - x).norm() < 1e-6 * x.norm(), "frame {}: {} vs {}", k, out, x);
            }
        }
        assert!((pb.gain(0) - ONE).norm() < 1e-6);
    }

    #[test]
    fn test_recovers_scale_and_phase() {
        // Output is the reference rotated and attenuated; the gain undoes it
        let distortion = Complex::from_polar(0.25, 1.1);
        let mut pb = ProjectionBack::new(1, 0.8, 1e-10);
        let mut out = ZERO;
        let mut x = ZERO;
        for k in 0..300 {
            x = Complex::from_polar(1.0, 0.9 * k as f64);
            out = x * distortion;
            pb.process(0, &mut out, x);
        }
        assert!((out - x).norm() < 1e-6);
    }

    #[test]
    fn test_silence_clamps_denominator() {
        let mut pb = ProjectionBack::new(1, 0.5, 1e-6);
        let mut outcome = Rescale::Applied;
        for _ in 0..100 {
            let mut out = ZERO;
            outcome = pb.process(0, &mut out, ZERO);
            assert_eq!(out, ZERO);
        }
        assert_eq!(outcome, Rescale::Clamped);
        assert!(pb.denominator(0) < 1e-6);
        assert!(pb.gain(0).norm().is_finite());
    }

    #[test]
    fn test_non_finite_reference_resets() {
        let mut pb = ProjectionBack::new(2, 0.9, 1e-10);
        let mut out = Complex::new(1.0, 0.0);
        let outcome = pb.process(1, &mut out, Complex::new(f64::NAN, 0.0));
        assert_eq!(outcome, Rescale::Reset);
        assert_eq!(out, Complex::new(1.0, 0.0));
        assert_eq!(pb.numerator(1), ONE);
        assert_eq!(pb.denominator(1), 1.0);
    }
}
