//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Rasterize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality 1–100) |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy, quality 0–100) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (best compression, adaptive filter) |
//!
//! Every encoder here is deterministic for identical pixels and quality,
//! which the size search relies on.

use super::backend::{BackendError, Dimensions, ImageBackend, Raster, SourceImage};
use super::params::{Codec, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that have working decoders compiled in.
///
/// Decoding itself sniffs the content; this list is only used to pick files
/// out of a directory.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

impl Raster for DynamicImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    // No alpha in JPEG
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.percent())
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::Encode(format!("JPEG: {e}")))?;
    Ok(buf)
}

fn encode_webp(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let q = quality.value() * 100.0;
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
            .encode_simple(false, q)
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height()).encode_simple(false, q)
    }
    .map_err(|e| BackendError::Encode(format!("WebP: {e:?}")))?;
    Ok(encoded.to_vec())
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilterType::Adaptive);
    let result = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        encoder.write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
    } else {
        let rgb = img.to_rgb8();
        encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
    };
    result.map_err(|e| BackendError::Encode(format!("PNG: {e}")))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    type Surface = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<SourceImage<DynamicImage>, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(BackendError::Decode("unrecognized image format".into()));
        }
        let img = reader
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(BackendError::Decode("image has zero area".into()));
        }
        Ok(SourceImage::new(img))
    }

    fn rasterize(
        &self,
        source: &SourceImage<DynamicImage>,
        dims: Dimensions,
    ) -> Result<DynamicImage, BackendError> {
        if dims.is_empty() {
            return Err(BackendError::Encode(format!(
                "cannot rasterize to {}x{}",
                dims.width, dims.height
            )));
        }
        if dims == source.dimensions() {
            return Ok(source.surface().clone());
        }
        Ok(source
            .surface()
            .resize_exact(dims.width, dims.height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        surface: &DynamicImage,
        codec: Codec,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        if surface.width() == 0 || surface.height() == 0 {
            return Err(BackendError::Encode("zero-area surface".into()));
        }
        match codec {
            Codec::Jpeg => encode_jpeg(surface, quality),
            Codec::Webp => encode_webp(surface, quality),
            Codec::Png => encode_png(surface),
        }
    }
}
