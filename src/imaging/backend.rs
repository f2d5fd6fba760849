//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify (header-level inspection) and thumbnail (decode, flatten,
//! resize, encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate decoders and a progressive JPEG encoder.

use super::params::ThumbnailParams;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}

/// Channel layout of a decoded raster, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
    Other,
}

impl ColorMode {
    pub fn has_alpha(self) -> bool {
        matches!(self, ColorMode::LumaAlpha | ColorMode::Rgba)
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorMode::Luma => "L",
            ColorMode::LumaAlpha => "LA",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::Other => "other",
        };
        f.write_str(name)
    }
}

/// Result of an identify operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorMode,
    /// Container format sniffed from the bytes, lowercase (`"jpeg"`, `"png"`, ...).
    pub format: String,
}

/// Trait for image processing backends.
///
/// Backends work on in-memory buffers: the pipeline never holds more than
/// one source object at a time, so there is no reason to spill to disk.
pub trait ImageBackend: Sync {
    /// Inspect dimensions, color mode, and format without a full decode.
    fn identify(&self, source: &[u8]) -> Result<DecodedImage, BackendError>;

    /// Decode, flatten onto white, resize to the exact params size, encode.
    fn thumbnail(&self, params: &ThumbnailParams<'_>) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<DecodedImage>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify {
            len: usize,
        },
        Thumbnail {
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self::with_images(vec![DecodedImage {
                width,
                height,
                color: ColorMode::Rgb,
                format: "jpeg".to_string(),
            }])
        }

        pub fn with_images(images: Vec<DecodedImage>) -> Self {
            Self {
                identify_results: Mutex::new(images),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, source: &[u8]) -> Result<DecodedImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify { len: source.len() });

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::Decode("No mock image".to_string()))
        }

        fn thumbnail(&self, params: &ThumbnailParams<'_>) -> Result<Vec<u8>, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Thumbnail {
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(800, 600);

        let result = backend.identify(b"fake").unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops, vec![RecordedOp::Identify { len: 4 }]);
    }

    #[test]
    fn mock_without_images_fails_decode() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.identify(b"fake"),
            Err(BackendError::Decode(_))
        ));
    }

    #[test]
    fn mock_records_thumbnail() {
        let backend = MockBackend::new();

        backend
            .thumbnail(&ThumbnailParams {
                source: b"fake",
                width: 300,
                height: 200,
                quality: Quality::new(85),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Thumbnail {
                width: 300,
                height: 200,
                quality: 85,
            }
        ));
    }

    #[test]
    fn alpha_modes() {
        assert!(ColorMode::Rgba.has_alpha());
        assert!(ColorMode::LumaAlpha.has_alpha());
        assert!(!ColorMode::Rgb.has_alpha());
        assert!(!ColorMode::Luma.has_alpha());
    }
}
