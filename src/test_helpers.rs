//! Shared test utilities for the photo-squeeze test suite.
//!
//! Synthetic images are generated from a seeded LCG so every test run sees
//! the same pixels, which keeps encoded sizes stable across runs.

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

// =========================================================================
// Synthetic images
// =========================================================================

/// A gradient with per-pixel noise: compresses like a busy photo.
pub fn noise_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    let img = RgbImage::from_fn(width, height, |x, y| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let n = (state >> 24) as u8;
        image::Rgb([
            ((x * 255) / width.max(1)) as u8 ^ (n & 0x3F),
            ((y * 255) / height.max(1)) as u8 ^ (n >> 2),
            n,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

/// Encode an image to file bytes in `format`, as a user's input file would be.
pub fn encode_source(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}
