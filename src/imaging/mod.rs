//! Image processing — decode, resize, and size-targeted encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (content-sniffed) |
//! | **Resize** | Lanczos3 via `resize_exact` |
//! | **Encode** | `JpegEncoder`, libwebp, `PngEncoder` |
//! | **Size search** | [`compress`]: quality bisection + width fallback |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Codec, quality, request and search constants
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The size search, combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, Raster, SourceImage};
pub use calculations::{compute_dimensions, max_reduction_steps, next_reduced_width};
pub use operations::{Attempt, CompressionResult, TargetNote, compress};
pub use params::{Codec, CompressionRequest, Quality, SearchParams};
pub use rust_backend::{RustBackend, supported_input_extensions};
