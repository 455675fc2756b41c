//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. They are the interface
//! between the high-level [`operations`](super::operations) module (which runs
//! the size search) and the [`backend`](super::backend) (which does the pixel
//! and codec work).
//!
//! ## Types
//!
//! - [`Quality`] — Fractional lossy quality (0.0–1.0). Clamped on construction.
//! - [`Codec`] — Output codec: JPEG, WebP or PNG, with extension and lossless flag.
//! - [`CompressionRequest`] — Byte target, optional max width, codec.
//! - [`SearchParams`] — Tunable constants of the quality search and width fallback.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fractional quality for lossy encoding, where higher means larger and better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 integer scale used by JPEG encoders.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Midpoint between two qualities.
    pub fn midpoint(lo: Quality, hi: Quality) -> Quality {
        Quality::new((lo.0 + hi.0) / 2.0)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Output codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Jpeg,
    Webp,
    Png,
}

impl Codec {
    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Codec::Jpeg => "jpg",
            Codec::Webp => "webp",
            Codec::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Codec::Jpeg => "image/jpeg",
            Codec::Webp => "image/webp",
            Codec::Png => "image/png",
        }
    }

    /// Lossless codecs have no quality axis, so a byte target cannot be enforced.
    pub fn is_lossless(self) -> bool {
        matches!(self, Codec::Png)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Codec::Jpeg => "JPEG",
            Codec::Webp => "WebP",
            Codec::Png => "PNG",
        };
        f.write_str(name)
    }
}

/// What the caller wants for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionRequest {
    /// Upper bound the encoder tries to meet, in bytes.
    pub target_bytes: u64,
    /// Maximum output width in pixels. `0` means unconstrained.
    pub max_width: u32,
    pub codec: Codec,
}

/// Constants driving the quality search and the width-reduction fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Lowest quality the search will try; also the unconditional fallback.
    pub quality_floor: Quality,
    /// Highest quality the search will try.
    pub quality_ceiling: Quality,
    /// Binary-search steps per width pass.
    pub iterations: u32,
    /// Width below which the fallback never shrinks.
    pub width_floor: u32,
    /// Multiplier applied to the width on each fallback pass.
    pub width_reduction: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            quality_floor: Quality::new(0.20),
            quality_ceiling: Quality::new(0.95),
            iterations: 12,
            width_floor: 720,
            width_reduction: 0.85,
        }
    }
}
