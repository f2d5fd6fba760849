//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader` header decode |
//! | **Flatten** | alpha composite over white → 8-bit RGB |
//! | **Resize** | Lanczos3, bounded box, never enlarges |
//! | **Encode** | progressive JPEG via `jpeg-encoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ColorMode, DecodedImage, ImageBackend};
pub use calculations::calculate_bounded_dimensions;
pub use operations::{GeneratedThumbnail, create_thumbnail, plan_thumbnail};
pub use params::{CACHE_CONTROL, OUTPUT_CONTENT_TYPE, Quality, ThumbnailParams, ThumbnailSpec};
pub use rust_backend::RustBackend;
