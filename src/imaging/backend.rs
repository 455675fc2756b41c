//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the size search
//! needs: decode, rasterize, and encode. Keeping them behind a trait lets the
//! search in [`operations`](super::operations) run against a deterministic
//! mock in tests, with no pixels or codecs involved.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{Codec, Quality};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Anything with pixel dimensions.
pub trait Raster {
    fn dimensions(&self) -> Dimensions;
}

/// A decoded image at its natural dimensions.
///
/// Produced once per input and dropped once no encode pass needs it.
#[derive(Debug, Clone)]
pub struct SourceImage<S> {
    surface: S,
    dims: Dimensions,
}

impl<S: Raster> SourceImage<S> {
    pub fn new(surface: S) -> Self {
        let dims = surface.dimensions();
        Self { surface, dims }
    }
}

impl<S> SourceImage<S> {
    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn width(&self) -> u32 {
        self.dims.width
    }

    pub fn height(&self) -> u32 {
        self.dims.height
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Backend-specific pixel surface.
    type Surface: Raster + Send + Sync;

    /// Parse raw file bytes into a source image. The format is sniffed from
    /// the content.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage<Self::Surface>, BackendError>;

    /// Resample the source to exactly `dims`.
    fn rasterize(
        &self,
        source: &SourceImage<Self::Surface>,
        dims: Dimensions,
    ) -> Result<Self::Surface, BackendError>;

    /// Encode a surface. `quality` is ignored by lossless codecs.
    fn encode(
        &self,
        surface: &Self::Surface,
        codec: Codec,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Fake surface: dimensions only, no pixels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MockSurface {
        pub width: u32,
        pub height: u32,
    }

    impl Raster for MockSurface {
        fn dimensions(&self) -> Dimensions {
            Dimensions {
                width: self.width,
                height: self.height,
            }
        }
    }

    /// Mock backend that records operations and sizes output with a fixed model.
    ///
    /// Lossy output is `width * height * bytes_per_pixel * quality` bytes
    /// (plus a small header), so size grows with both quality and area.
    /// PNG output is three bytes per pixel. Uses Mutex so it is Sync.
    pub struct MockBackend {
        pub source: Option<MockSurface>,
        pub bytes_per_pixel: f64,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    pub const MOCK_HEADER_BYTES: usize = 64;

    /// Inputs starting with these bytes fail to decode.
    pub const CORRUPT_MARKER: &[u8] = b"corrupt";

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(usize),
        Rasterize { width: u32, height: u32 },
        Encode {
            width: u32,
            height: u32,
            codec: Codec,
            quality: f32,
            size: usize,
        },
    }

    impl MockBackend {
        /// Decodes every input as a `width × height` image.
        pub fn with_source(width: u32, height: u32, bytes_per_pixel: f64) -> Self {
            Self {
                source: Some(MockSurface { width, height }),
                bytes_per_pixel,
                operations: Mutex::new(Vec::new()),
            }
        }

        /// Fails every decode.
        pub fn undecodable() -> Self {
            Self {
                source: None,
                bytes_per_pixel: 1.0,
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn source_image(&self) -> SourceImage<MockSurface> {
            self.decode(&[]).unwrap()
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn encode_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Encode { .. }))
                .count()
        }

        /// Size the model produces for the given surface and quality.
        pub fn model_size(&self, width: u32, height: u32, codec: Codec, quality: f32) -> usize {
            let pixels = width as f64 * height as f64;
            let body = if codec.is_lossless() {
                pixels * 3.0
            } else {
                pixels * self.bytes_per_pixel * quality as f64
            };
            MOCK_HEADER_BYTES + body.round() as usize
        }
    }

    impl ImageBackend for MockBackend {
        type Surface = MockSurface;

        fn decode(&self, bytes: &[u8]) -> Result<SourceImage<MockSurface>, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(bytes.len()));
            if bytes.starts_with(CORRUPT_MARKER) {
                return Err(BackendError::Decode("mock: corrupt input".to_string()));
            }
            let surface = self
                .source
                .ok_or_else(|| BackendError::Decode("mock: not an image".to_string()))?;
            Ok(SourceImage::new(surface))
        }

        fn rasterize(
            &self,
            _source: &SourceImage<MockSurface>,
            dims: Dimensions,
        ) -> Result<MockSurface, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Rasterize {
                width: dims.width,
                height: dims.height,
            });
            Ok(MockSurface {
                width: dims.width,
                height: dims.height,
            })
        }

        fn encode(
            &self,
            surface: &MockSurface,
            codec: Codec,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            if surface.width == 0 || surface.height == 0 {
                return Err(BackendError::Encode("mock: zero-area surface".to_string()));
            }
            let size = self.model_size(surface.width, surface.height, codec, quality.value());
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width: surface.width,
                height: surface.height,
                codec,
                quality: quality.value(),
                size,
            });
            Ok(vec![0xA5; size])
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::with_source(800, 600, 1.0);
        let source = backend.decode(b"abc").unwrap();
        assert_eq!(source.width(), 800);
        assert_eq!(source.height(), 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Decode(3)]);
    }

    #[test]
    fn mock_undecodable_errors() {
        let backend = MockBackend::undecodable();
        assert!(matches!(backend.decode(b"x"), Err(BackendError::Decode(_))));
    }

    #[test]
    fn mock_corrupt_marker_errors() {
        let backend = MockBackend::with_source(10, 10, 1.0);
        assert!(matches!(
            backend.decode(b"corrupt bytes"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn mock_lossy_size_grows_with_quality() {
        let backend = MockBackend::with_source(100, 100, 1.0);
        let surface = MockSurface {
            width: 100,
            height: 100,
        };
        let low = backend
            .encode(&surface, Codec::Jpeg, Quality::new(0.2))
            .unwrap();
        let high = backend
            .encode(&surface, Codec::Jpeg, Quality::new(0.9))
            .unwrap();
        assert!(low.len() < high.len());
        assert_eq!(backend.encode_count(), 2);
    }

    #[test]
    fn mock_rejects_zero_area() {
        let backend = MockBackend::with_source(100, 100, 1.0);
        let surface = MockSurface {
            width: 100,
            height: 0,
        };
        let result = backend.encode(&surface, Codec::Png, Quality::new(1.0));
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }

    #[test]
    fn dimensions_empty() {
        assert!(Dimensions { width: 0, height: 5 }.is_empty());
        assert!(!Dimensions { width: 1, height: 1 }.is_empty());
    }
}
