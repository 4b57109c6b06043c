//! Core types for spectral-domain array processing
//!
//! Every stage of the canceller works on complex short-time spectrum samples.
//! A frame is laid out bin-major, channel-minor:
//!
//! ```text
//!   input[bin * nchannel + ch]      (nchannel × (nfft/2 + 1) samples)
//!   output[bin]                     (nfft/2 + 1 samples)
//! ```
//!
//! Only the non-negative half of the spectrum is carried, since the time
//! signal is real.

use num_complex::Complex64;
use thiserror::Error;

/// Type alias for complex spectral samples using f64 precision
pub type Complex = Complex64;

/// Complex zero, handy for buffer initialization.
pub const ZERO: Complex = Complex::new(0.0, 0.0);

/// Complex one.
pub const ONE: Complex = Complex::new(1.0, 0.0);

/// Result type for canceller operations
pub type GscResult<T> = Result<T, GscError>;

/// Errors that can occur while building or driving the canceller
#[derive(Error, Debug)]
pub enum GscError {
    /// A scalar parameter is outside its admissible range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Channel count is not a multiple of the downsampled channel count
    /// and the remainder policy forbids dropping channels
    #[error("{nchannel} channels cannot be split evenly into {nchannel_ds} groups")]
    UnevenDownsampling { nchannel: usize, nchannel_ds: usize },

    /// The maximum frequency leaves no bin above DC to process
    #[error("Empty processing band: f_max = {f_max} Hz with bin width {bin_width} Hz")]
    EmptyBand { f_max: f64, bin_width: f64 },

    /// Fixed weight array has the wrong number of reals
    #[error("Fixed weight size mismatch: expected {expected} reals, got {actual}")]
    WeightSizeMismatch { expected: usize, actual: usize },

    /// Fixed weight array contains unusable values
    #[error("Invalid fixed weights: {0}")]
    InvalidWeights(String),

    /// Frame buffer has the wrong length
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read a configuration or weight file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GscError {
    /// Check if this error was raised while constructing the canceller
    pub fn is_construction_error(&self) -> bool {
        !matches!(self, GscError::BufferSizeMismatch { .. })
    }
}
