//! Fixed beamformer and blocking matrix
//!
//! Per bin, with channel vector `x` and fixed weights `w`:
//!
//! ```text
//!   y   = w^H x                  (fixed beamformer output)
//!   b_c = x_c - w_c · y          (blocking-matrix residual per channel)
//! ```
//!
//! The residual removes the part of each channel explained by the steering
//! toward the target, leaving interference references for the adaptive
//! branch.

use crate::types::{Complex, ZERO};

/// Inner product: sum of conj(a_i) * b_i.
#[inline]
pub fn inner_product(a: &[Complex], b: &[Complex]) -> Complex {
    a.iter()
        .zip(b.iter())
        .fold(ZERO, |acc, (ai, bi)| acc + ai.conj() * *bi)
}

/// Fixed beamformer output `y = w^H x` for one bin.
#[inline]
pub fn fixed_output(weights: &[Complex], x: &[Complex]) -> Complex {
    inner_product(weights, x)
}

/// Blocking-matrix residual `b = x - w y` for one bin, written into `out`.
#[inline]
pub fn block(weights: &[Complex], x: &[Complex], y: Complex, out: &mut [Complex]) {
    for ((o, &xc), &wc) in out.iter_mut().zip(x).zip(weights) {
        *o = xc - wc * y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Complex, b: Complex, tol: f64) -> bool {
        (a - b).norm() < tol
    }

    #[test]
    fn test_inner_product() {
        let a = [Complex::new(1.0, 2.0), Complex::new(0.0, 1.0)];
        let b = [Complex::new(3.0, 0.0), Complex::new(1.0, 1.0)];
        // conj(1+2i)*3 + conj(i)*(1+i) = (3-6i) + (1-i) = 4-7i
        assert!(approx_eq(inner_product(&a, &b), Complex::new(4.0, -7.0), 1e-12));
    }

    #[test]
    fn test_selecting_weights_pass_channel() {
        let w = [Complex::new(1.0, 0.0), ZERO, ZERO];
        let x = [
            Complex::new(0.3, -0.2),
            Complex::new(5.0, 1.0),
            Complex::new(-2.0, 0.5),
        ];
        let y = fixed_output(&w, &x);
        assert_eq!(y, x[0]);

        let mut b = [ZERO; 3];
        block(&w, &x, y, &mut b);
        assert_eq!(b[0], ZERO);
        assert_eq!(b[1], x[1]);
        assert_eq!(b[2], x[2]);
    }

    #[test]
    fn test_blocking_removes_steered_component() {
        // Unit-norm steering vector d, target x = s * d
        let n = 4;
        let scale = 1.0 / (n as f64).sqrt();
        let d: Vec<Complex> = (0..n)
            .map(|k| Complex::from_polar(scale, 0.7 * k as f64))
            .collect();
        let s = Complex::new(0.8, -1.3);
        let x: Vec<Complex> = d.iter().map(|&dk| s * dk).collect();

        let y = fixed_output(&d, &x);
        assert!(approx_eq(y, s, 1e-12));

        let mut b = vec![ZERO; n];
        block(&d, &x, y, &mut b);
        for bc in &b {
            assert!(bc.norm() < 1e-12, "target leaked into residual: {}", bc);
        }
    }

    #[test]
    fn test_same_weight_used_both_ways() {
        // Complex weight: sum uses conj(w), subtraction uses w
        let w = [Complex::new(0.0, 1.0)];
        let x = [Complex::new(2.0, 0.0)];
        let y = fixed_output(&w, &x);
        assert!(approx_eq(y, Complex::new(0.0, -2.0), 1e-12));

        let mut b = [ZERO];
        block(&w, &x, y, &mut b);
        // x - i * (-2i) = 2 - 2 = 0
        assert!(approx_eq(b[0], ZERO, 1e-12));
    }
}
