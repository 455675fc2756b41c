//! Size-targeted encoding.
//!
//! [`compress`] combines the resize policy from
//! [`calculations`](super::calculations) with backend encodes to land an
//! encoded buffer at or just under a byte target.
//!
//! ## Lossy codecs (JPEG, WebP)
//!
//! 1. Binary search over quality in `[quality_floor, quality_ceiling]` for a
//!    fixed number of steps. An encode that fits raises the lower bound and
//!    becomes the best candidate; one that does not lowers the upper bound.
//!    Size is non-decreasing in quality, so the last fit is the highest
//!    quality that fits.
//! 2. If nothing fit, encode once more at the floor quality and keep it.
//! 3. While that buffer is still over target and the width is above the
//!    width floor, shrink the width by `width_reduction` (never below the
//!    floor), re-rasterize the *original* source, and search again.
//!
//! ## Lossless codecs (PNG)
//!
//! One encode at full fidelity. The target is reported as not enforceable
//! rather than treated as an error.

use super::backend::{BackendError, Dimensions, ImageBackend, SourceImage};
use super::calculations::{compute_dimensions, next_reduced_width, scale_to_width};
use super::params::{CompressionRequest, Quality, SearchParams};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Why the returned buffer may not respect the byte target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetNote {
    /// Lossless output has no quality axis; size is whatever the codec gives.
    LosslessCodec,
    /// Even the floor quality at the floor width was over target.
    TargetUnreachable,
}

impl fmt::Display for TargetNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetNote::LosslessCodec => {
                f.write_str("lossless output cannot be sized to a target; use JPEG or WebP")
            }
            TargetNote::TargetUnreachable => {
                f.write_str("target not reachable at minimum quality and width")
            }
        }
    }
}

/// One encode performed during the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attempt {
    pub width: u32,
    pub quality: Quality,
    pub size: usize,
    pub fits: bool,
}

/// The chosen encoding and the dimensions it was produced at.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub encoded: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Quality of the chosen encode; `None` for lossless output.
    pub quality: Option<Quality>,
    pub note: Option<TargetNote>,
    /// Width-reduction passes taken after the first search.
    pub reductions: u32,
    /// Every encode in the order it happened.
    pub attempts: Vec<Attempt>,
}

impl CompressionResult {
    pub fn size(&self) -> usize {
        self.encoded.len()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

struct Candidate {
    bytes: Vec<u8>,
    quality: Quality,
    dims: Dimensions,
}

/// Re-encode `source` as close to `request.target_bytes` as the search allows.
///
/// Fails only when the backend refuses to rasterize or encode, e.g. when the
/// width cap produces a zero-height surface.
pub fn compress<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<B::Surface>,
    request: &CompressionRequest,
    params: &SearchParams,
) -> Result<CompressionResult> {
    let dims = compute_dimensions(source.dimensions(), request.max_width);

    if request.codec.is_lossless() {
        return encode_lossless(backend, source, dims, request);
    }

    let mut attempts = Vec::new();
    let mut smallest: Option<Candidate> = None;
    let mut pass_dims = dims;
    let mut reductions = 0;

    loop {
        let candidate = {
            let resized;
            let surface = if pass_dims == source.dimensions() {
                source.surface()
            } else {
                resized = rasterize(backend, source, pass_dims)?;
                &resized
            };
            search_quality(backend, surface, pass_dims, request, params, &mut attempts)?
        };

        if candidate.bytes.len() as u64 <= request.target_bytes {
            return Ok(finish(candidate, None, reductions, attempts));
        }

        if smallest
            .as_ref()
            .is_none_or(|s| candidate.bytes.len() < s.bytes.len())
        {
            smallest = Some(candidate);
        }

        match next_reduced_width(pass_dims.width, params.width_floor, params.width_reduction) {
            Some(width) => {
                pass_dims = scale_to_width(source.dimensions(), width);
                reductions += 1;
                debug!(
                    width = pass_dims.width,
                    height = pass_dims.height,
                    reductions,
                    "target missed at floor quality, reducing width"
                );
            }
            None => break,
        }
    }

    // At least one pass ran, so there is always a smallest candidate
    let smallest = smallest.ok_or_else(|| BackendError::Encode("search produced no output".into()))?;
    Ok(finish(
        smallest,
        Some(TargetNote::TargetUnreachable),
        reductions,
        attempts,
    ))
}

fn rasterize<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<B::Surface>,
    dims: Dimensions,
) -> Result<B::Surface> {
    if dims.is_empty() {
        return Err(BackendError::Encode(format!(
            "zero-area surface {}x{}",
            dims.width, dims.height
        )));
    }
    backend.rasterize(source, dims)
}

/// Binary search over quality for one surface.
fn search_quality<B: ImageBackend>(
    backend: &B,
    surface: &B::Surface,
    dims: Dimensions,
    request: &CompressionRequest,
    params: &SearchParams,
    attempts: &mut Vec<Attempt>,
) -> Result<Candidate> {
    let mut lo = params.quality_floor;
    let mut hi = params.quality_ceiling;
    let mut best: Option<Candidate> = None;

    for step in 0..params.iterations {
        let mid = Quality::midpoint(lo, hi);
        let bytes = backend.encode(surface, request.codec, mid)?;
        let fits = bytes.len() as u64 <= request.target_bytes;
        attempts.push(Attempt {
            width: dims.width,
            quality: mid,
            size: bytes.len(),
            fits,
        });
        debug!(step, quality = %mid, size = bytes.len(), fits, "encode attempt");

        if fits {
            lo = mid;
            best = Some(Candidate {
                bytes,
                quality: mid,
                dims,
            });
        } else {
            hi = mid;
        }
    }

    if let Some(best) = best {
        return Ok(best);
    }

    let floor = params.quality_floor;
    let bytes = backend.encode(surface, request.codec, floor)?;
    attempts.push(Attempt {
        width: dims.width,
        quality: floor,
        size: bytes.len(),
        fits: bytes.len() as u64 <= request.target_bytes,
    });
    debug!(quality = %floor, size = bytes.len(), "no quality fit, using floor");
    Ok(Candidate {
        bytes,
        quality: floor,
        dims,
    })
}

fn encode_lossless<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<B::Surface>,
    dims: Dimensions,
    request: &CompressionRequest,
) -> Result<CompressionResult> {
    let full = Quality::new(1.0);
    let bytes = if dims == source.dimensions() {
        backend.encode(source.surface(), request.codec, full)?
    } else {
        let surface = rasterize(backend, source, dims)?;
        backend.encode(&surface, request.codec, full)?
    };
    debug!(size = bytes.len(), codec = %request.codec, "lossless encode");

    let attempts = vec![Attempt {
        width: dims.width,
        quality: full,
        size: bytes.len(),
        fits: bytes.len() as u64 <= request.target_bytes,
    }];
    Ok(CompressionResult {
        encoded: bytes,
        width: dims.width,
        height: dims.height,
        quality: None,
        note: Some(TargetNote::LosslessCodec),
        reductions: 0,
        attempts,
    })
}

fn finish(
    candidate: Candidate,
    note: Option<TargetNote>,
    reductions: u32,
    attempts: Vec<Attempt>,
) -> CompressionResult {
    CompressionResult {
        encoded: candidate.bytes,
        width: candidate.dims.width,
        height: candidate.dims.height,
        quality: Some(candidate.quality),
        note,
        reductions,
        attempts,
    }
}
