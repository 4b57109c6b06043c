//! # Configuration Files
//!
//! Two files describe a canceller instance: the algorithm parameters and the
//! fixed beamforming weights. Both are JSON objects; YAML is accepted too.
//!
//! ## Parameter file
//!
//! ```json
//! {
//!   "nchannel_ds": 2,
//!   "rls_ff": 0.995,
//!   "rls_reg": 0.01,
//!   "pb_ff": 0.98,
//!   "pb_ref_channel": 0,
//!   "f_max": 7000.0,
//!   "downsample_remainder": "reject"
//! }
//! ```
//!
//! The first six keys are required. `downsample_remainder` (`"drop"` or
//! `"reject"`, default `"drop"`) and `pb_den_floor` (default `1e-10`) are
//! optional.
//!
//! ## Weight file
//!
//! ```json
//! { "fixed_weights": [0.5, 0.0, 0.5, 0.0, ...] }
//! ```
//!
//! `2 × (nfft/2 + 1) × nchannel` reals, interleaved real/imaginary,
//! bin-major then channel-minor.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::params::{RemainderPolicy, DEFAULT_PB_DEN_FLOOR};
use crate::types::{GscError, GscResult};

fn default_pb_den_floor() -> f64 {
    DEFAULT_PB_DEN_FLOOR
}

/// Algorithm parameters as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GscConfig {
    /// Number of reference channels after downsampling
    pub nchannel_ds: usize,
    /// RLS forgetting factor
    pub rls_ff: f64,
    /// RLS regularization
    pub rls_reg: f64,
    /// Projection-back forgetting factor
    pub pb_ff: f64,
    /// Projection-back reference channel
    pub pb_ref_channel: usize,
    /// Upper edge of the processed band in Hz
    pub f_max: f64,
    /// Trailing channel policy for the downsampler
    #[serde(default)]
    pub downsample_remainder: RemainderPolicy,
    /// Smallest projection-back denominator used for division
    #[serde(default = "default_pb_den_floor")]
    pub pb_den_floor: f64,
}

impl GscConfig {
    /// Load from a file; `.json`, `.yaml` and `.yml` pick the parser,
    /// anything else is sniffed.
    pub fn load_from(path: &Path) -> GscResult<Self> {
        let content = std::fs::read_to_string(path)?;
        parse_document(&content, Format::from_path(path))
            .map_err(|e| GscError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse from JSON or YAML text.
    pub fn parse(text: &str) -> GscResult<Self> {
        parse_document(text, Format::sniff(text)).map_err(GscError::Config)
    }
}

/// Fixed beamforming weights as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightFile {
    /// Interleaved real/imaginary weights for the full half spectrum
    pub fixed_weights: Vec<f64>,
}

impl WeightFile {
    pub fn load_from(path: &Path) -> GscResult<Self> {
        let content = std::fs::read_to_string(path)?;
        parse_document(&content, Format::from_path(path))
            .map_err(|e| GscError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> GscResult<Self> {
        parse_document(text, Format::sniff(text)).map_err(GscError::Config)
    }

    /// Save as JSON.
    pub fn save(&self, path: &Path) -> GscResult<()> {
        let content =
            serde_json::to_string(self).map_err(|e| GscError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Format::Json),
            Some("yaml") | Some("yml") => Some(Format::Yaml),
            _ => None,
        }
    }

    fn sniff(text: &str) -> Option<Self> {
        if text.trim_start().starts_with('{') {
            Some(Format::Json)
        } else {
            None
        }
    }
}

fn parse_document<T>(text: &str, format: Option<Format>) -> Result<T, String>
where
    T: for<'de> Deserialize<'de>,
{
    match format {
        Some(Format::Json) => serde_json::from_str(text).map_err(|e| e.to_string()),
        // YAML is a superset of JSON, so it also covers unknown extensions
        Some(Format::Yaml) | None => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    }
}
