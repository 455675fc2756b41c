//! Configuration module.
//!
//! Handles loading, validating, and merging `photo-squeeze.toml`. Stock
//! defaults are the base layer; a user config file overrides any subset of
//! keys; command-line flags override both.
//!
//! ## Config File Location
//!
//! By default `photo-squeeze.toml` is read from the current directory if it
//! exists. `--config <FILE>` points at an explicit file instead.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compression]
//! target_kb = 200           # Byte budget per output file, in KiB
//! max_width = 0             # Width cap in pixels (0 = keep source width)
//! format = "jpeg"           # jpeg | webp | png
//!
//! [search]
//! quality_floor = 0.20      # Lowest quality tried
//! quality_ceiling = 0.95    # Highest quality tried
//! iterations = 12           # Bisection steps per width pass
//! width_floor = 720         # Width fallback never goes below this
//! width_reduction = 0.85    # Width multiplier per fallback pass
//!
//! [limits]
//! max_input_bytes = 20971520  # Inputs above this are rejected (20 MiB)
//! min_target_kb = 10          # Smaller targets are raised to this
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Codec, CompressionRequest, Quality, SearchParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILENAME: &str = "photo-squeeze.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqueezeConfig {
    /// What to produce: byte target, width cap, codec.
    pub compression: CompressionConfig,
    /// Quality search and width fallback tuning.
    pub search: SearchConfig,
    /// Per-file input limits.
    pub limits: LimitsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SqueezeConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression.target_kb == 0 {
            return Err(ConfigError::Validation(
                "compression.target_kb must be positive".into(),
            ));
        }
        let s = &self.search;
        for (key, value) in [
            ("search.quality_floor", s.quality_floor),
            ("search.quality_ceiling", s.quality_ceiling),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be in (0, 1]"
                )));
            }
        }
        if s.quality_floor >= s.quality_ceiling {
            return Err(ConfigError::Validation(
                "search.quality_floor must be below search.quality_ceiling".into(),
            ));
        }
        if !(1..=32).contains(&s.iterations) {
            return Err(ConfigError::Validation(
                "search.iterations must be 1-32".into(),
            ));
        }
        if s.width_floor == 0 {
            return Err(ConfigError::Validation(
                "search.width_floor must be non-zero".into(),
            ));
        }
        if !(s.width_reduction > 0.0 && s.width_reduction < 1.0) {
            return Err(ConfigError::Validation(
                "search.width_reduction must be in (0, 1)".into(),
            ));
        }
        if self.limits.max_input_bytes == 0 {
            return Err(ConfigError::Validation(
                "limits.max_input_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The per-file request, with the target raised to `limits.min_target_kb`.
    pub fn request(&self) -> CompressionRequest {
        let kb = self.compression.target_kb.max(self.limits.min_target_kb);
        CompressionRequest {
            target_bytes: kb.saturating_mul(1024),
            max_width: self.compression.max_width,
            codec: self.compression.format,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Byte budget per output file, in KiB.
    pub target_kb: u64,
    /// Width cap in pixels; `0` keeps the source width.
    pub max_width: u32,
    /// Output codec.
    pub format: Codec,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            target_kb: 200,
            max_width: 0,
            format: Codec::Jpeg,
        }
    }
}

/// Quality search and width fallback tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub quality_floor: f64,
    pub quality_ceiling: f64,
    pub iterations: u32,
    pub width_floor: u32,
    pub width_reduction: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quality_floor: 0.20,
            quality_ceiling: 0.95,
            iterations: 12,
            width_floor: 720,
            width_reduction: 0.85,
        }
    }
}

impl SearchConfig {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            quality_floor: Quality::new(self.quality_floor as f32),
            quality_ceiling: Quality::new(self.quality_ceiling as f32),
            iterations: self.iterations,
            width_floor: self.width_floor,
            width_reduction: self.width_reduction,
        }
    }
}

/// Per-file input limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Inputs larger than this many bytes are rejected before decoding.
    pub max_input_bytes: u64,
    /// Requested targets below this many KiB are raised to it.
    pub min_target_kb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 20 * 1024 * 1024,
            min_target_kb: 10,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of files compressed at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SqueezeConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SqueezeConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SqueezeConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load an explicit config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<SqueezeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load [`CONFIG_FILENAME`] from `dir`, falling back to stock defaults when
/// the file does not exist.
pub fn load_config(dir: &Path) -> Result<SqueezeConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return resolve_config(None);
    }
    load_config_file(&config_path)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-squeeze configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Looked up as ./photo-squeeze.toml, or pass --config <FILE>.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[compression]
# Byte budget per output file, in KiB.
target_kb = 200

# Width cap in pixels. 0 keeps the source width. Images are never upscaled.
max_width = 0

# Output codec: "jpeg", "webp" or "png".
# PNG is lossless, so its size cannot be steered toward the target.
format = "jpeg"

# ---------------------------------------------------------------------------
# Quality search
# ---------------------------------------------------------------------------
[search]
# Quality range searched by bisection (0-1, higher = larger and better).
quality_floor = 0.20
quality_ceiling = 0.95

# Bisection steps per width. 10 or more gives ~0.1% quality resolution.
iterations = 12

# When even quality_floor is over target, the width is multiplied by
# width_reduction and the search repeats, down to width_floor pixels.
width_floor = 720
width_reduction = 0.85

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Inputs larger than this are rejected (20 MiB).
max_input_bytes = 20971520

# Targets below this many KiB are raised to it.
min_target_kb = 10

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum files compressed in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
