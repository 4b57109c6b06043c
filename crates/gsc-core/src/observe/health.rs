//! # Numeric health counters
//!
//! The per-frame path has no error returns for numeric trouble. Instead each
//! recovery is counted here and logged the first time it happens:
//!
//! - **rls_resets**: bins whose inverse covariance or weights degenerated
//!   and were returned to their initial state
//! - **rls_bounded**: bin updates whose inverse covariance was capped after
//!   winding up along a direction without reference energy
//! - **pb_clamps**: projection-back divisions that used the denominator floor
//! - **pb_resets**: projection-back bins reset after a non-finite gain
//! - **nonfinite_bins**: input bins skipped because a sample was NaN or ±inf
//!
//! ## Example
//!
//! ```rust
//! use gsc_core::observe::NumericHealth;
//!
//! let mut health = NumericHealth::new();
//! health.record_frame();
//! health.record_rls_resets(2);
//!
//! let snapshot = health.snapshot();
//! assert_eq!(snapshot.frames, 1);
//! assert_eq!(snapshot.rls_resets, 2);
//! assert!(!snapshot.is_clean());
//! ```

use serde::{Deserialize, Serialize};

/// A monotonically increasing event counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counter {
    value: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self { value: 0 }
    }

    #[inline]
    pub fn inc(&mut self) {
        self.value += 1;
    }

    /// Increment by a specific amount; returns true if this was the first
    /// nonzero increment.
    #[inline]
    pub fn inc_by(&mut self, n: u64) -> bool {
        let first = self.value == 0 && n > 0;
        self.value += n;
        first
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

/// Recovery counters owned by one canceller.
#[derive(Debug, Default, Clone)]
pub struct NumericHealth {
    frames: Counter,
    rls_resets: Counter,
    rls_bounded: Counter,
    pb_clamps: Counter,
    pb_resets: Counter,
    nonfinite_bins: Counter,
}

impl NumericHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&mut self) {
        self.frames.inc();
    }

    pub fn record_rls_resets(&mut self, n: usize) {
        if self.rls_resets.inc_by(n as u64) {
            tracing::warn!(
                frame = self.frames.get(),
                bins = n,
                "RLS state degenerated, bins reset to initial conditioning"
            );
        } else if n > 0 {
            tracing::debug!(frame = self.frames.get(), bins = n, "RLS bins reset");
        }
    }

    pub fn record_rls_bounded(&mut self, n: usize) {
        if self.rls_bounded.inc_by(n as u64) {
            tracing::warn!(
                frame = self.frames.get(),
                bins = n,
                "RLS inverse covariance wound up without reference energy, capped"
            );
        }
    }

    pub fn record_pb_clamps(&mut self, n: usize) {
        if self.pb_clamps.inc_by(n as u64) {
            tracing::warn!(
                frame = self.frames.get(),
                bins = n,
                "projection-back denominator below floor, gain clamped"
            );
        }
    }

    pub fn record_pb_resets(&mut self, n: usize) {
        if self.pb_resets.inc_by(n as u64) {
            tracing::warn!(
                frame = self.frames.get(),
                bins = n,
                "projection-back gain not finite, bins reset to unit gain"
            );
        } else if n > 0 {
            tracing::debug!(frame = self.frames.get(), bins = n, "projection-back bins reset");
        }
    }

    pub fn record_nonfinite_bins(&mut self, n: usize) {
        if self.nonfinite_bins.inc_by(n as u64) {
            tracing::warn!(
                frame = self.frames.get(),
                bins = n,
                "non-finite input samples, bins skipped"
            );
        } else if n > 0 {
            tracing::debug!(frame = self.frames.get(), bins = n, "non-finite input bins skipped");
        }
    }

    /// Frames processed so far.
    pub fn frames(&self) -> u64 {
        self.frames.get()
    }

    /// Get a point-in-time copy of every counter.
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            frames: self.frames.get(),
            rls_resets: self.rls_resets.get(),
            rls_bounded: self.rls_bounded.get(),
            pb_clamps: self.pb_clamps.get(),
            pb_resets: self.pb_resets.get(),
            nonfinite_bins: self.nonfinite_bins.get(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Point-in-time copy of the health counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub frames: u64,
    pub rls_resets: u64,
    pub rls_bounded: u64,
    pub pb_clamps: u64,
    pub pb_resets: u64,
    pub nonfinite_bins: u64,
}

impl HealthSnapshot {
    /// True when no bin was reset, clamped or skipped. Capping a wound-up
    /// inverse covariance is normal for silent references and not counted.
    pub fn is_clean(&self) -> bool {
        self.rls_resets == 0 && self.pb_clamps == 0 && self.pb_resets == 0 && self.nonfinite_bins == 0
    }
}
