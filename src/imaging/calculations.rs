//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// Scale `source` to exactly `width`, preserving aspect ratio.
///
/// Height is rounded half away from zero; width is exact.
pub fn scale_to_width(source: Dimensions, width: u32) -> Dimensions {
    let height = (source.height as f64 * width as f64 / source.width as f64).round() as u32;
    Dimensions { width, height }
}

/// Output dimensions for a source under an optional width cap.
///
/// A `max_width` of 0, or one at or above the source width, leaves the
/// source untouched. Never upscales.
///
/// # Examples
/// ```
/// # use photo_squeeze::imaging::{Dimensions, compute_dimensions};
/// let src = Dimensions { width: 3000, height: 2000 };
/// assert_eq!(compute_dimensions(src, 0), src);
/// assert_eq!(compute_dimensions(src, 1200), Dimensions { width: 1200, height: 800 });
/// ```
pub fn compute_dimensions(source: Dimensions, max_width: u32) -> Dimensions {
    if max_width == 0 || max_width >= source.width {
        return source;
    }
    scale_to_width(source, max_width)
}

/// Next width for the width-reduction fallback.
///
/// Returns `None` once `width` is at or below `floor`, or when the factor
/// would not shrink the width any further.
pub fn next_reduced_width(width: u32, floor: u32, factor: f64) -> Option<u32> {
    if width <= floor {
        return None;
    }
    let reduced = ((width as f64 * factor).floor() as u32).max(floor);
    (reduced < width).then_some(reduced)
}

/// Upper bound on fallback passes from `start` down to `floor`.
///
/// `ceil(log(floor / start) / log(factor)) + 1`
pub fn max_reduction_steps(start: u32, floor: u32, factor: f64) -> u32 {
    if start <= floor || floor == 0 {
        return 0;
    }
    ((floor as f64 / start as f64).ln() / factor.ln()).ceil() as u32 + 1
}
