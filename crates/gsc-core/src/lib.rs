//! # Generalized Sidelobe Canceller
//!
//! Frequency-domain adaptive beamforming for microphone arrays. Each STFT
//! frame of a multichannel recording is reduced to one enhanced channel that
//! keeps the signal from the look direction and suppresses interferers.
//!
//! ## Overview
//!
//! Every bin in the processed band runs the same pipeline:
//!
//! - **Fixed beamformer**: weighted sum of the channels toward the target
//! - **Blocking matrix**: per-channel residual with the target removed
//! - **Channel downsampler**: averages groups of residual channels into
//!   fewer references
//! - **RLS canceller**: predicts the interference left in the fixed output
//!   from the references (Sherman-Morrison update of the inverse covariance)
//! - **Projection back**: rescales the result to the level of a reference
//!   microphone
//!
//! ## Signal Flow
//!
//! ```text
//! X[bin][ch] → Fixed BF → y ───────────────(+)→ e → Projection back → Y[bin]
//!            → Blocking → Downsample → RLS →(-)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use gsc_core::prelude::*;
//! use std::path::Path;
//!
//! let mut gsc = GeneralizedSidelobeCanceller::from_files(
//!     Path::new("gsc.json"),
//!     Path::new("weights.json"),
//!     512,
//!     16_000.0,
//!     4,
//! )?;
//!
//! let input = vec![Complex::new(0.0, 0.0); 4 * 257];
//! let mut output = vec![Complex::new(0.0, 0.0); 257];
//! gsc.process(&input, &mut output)?;
//! # Ok::<(), GscError>(())
//! ```

pub mod band;
pub mod beamformer;
pub mod config;
pub mod downsample;
pub mod gsc;
pub mod observe;
pub mod params;
pub mod projback;
pub mod rls;
pub mod scenario;
pub mod types;
pub mod weights;

// Re-export main types
pub use band::FrequencyBand;
pub use config::{GscConfig, WeightFile};
pub use downsample::ChannelDownsampler;
pub use gsc::GeneralizedSidelobeCanceller;
pub use observe::{HealthSnapshot, NumericHealth};
pub use params::{GscParams, RemainderPolicy};
pub use projback::ProjectionBack;
pub use rls::RlsCanceller;
pub use types::{Complex, GscError, GscResult};
pub use weights::FixedWeights;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{GscConfig, WeightFile};
    pub use crate::gsc::GeneralizedSidelobeCanceller;
    pub use crate::params::{GscParams, RemainderPolicy};
    pub use crate::types::{Complex, GscError, GscResult};
}
