//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a [`ThumbnailSpec`], compute parameters, and call the backend.

use super::backend::{BackendError, DecodedImage, ImageBackend};
use super::calculations::calculate_bounded_dimensions;
use super::params::{ThumbnailParams, ThumbnailSpec};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// An encoded thumbnail and what it was made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedThumbnail {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source: DecodedImage,
}

impl GeneratedThumbnail {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Plan a thumbnail operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_thumbnail<'a>(
    source: &'a [u8],
    info: &DecodedImage,
    spec: &ThumbnailSpec,
) -> ThumbnailParams<'a> {
    let (width, height) = calculate_bounded_dimensions((info.width, info.height), spec.max_edge);
    ThumbnailParams {
        source,
        width,
        height,
        quality: spec.quality,
    }
}

/// Create a thumbnail from raw source bytes.
///
/// Identifies the source, fits it inside the bounding box (never
/// enlarging), and renders an opaque progressive JPEG.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &[u8],
    spec: &ThumbnailSpec,
) -> Result<GeneratedThumbnail> {
    let info = backend.identify(source)?;
    tracing::debug!(
        width = info.width,
        height = info.height,
        mode = %info.color,
        format = %info.format,
        "decoded source image"
    );

    let params = plan_thumbnail(source, &info, spec);
    let (width, height) = (params.width, params.height);
    let bytes = backend.thumbnail(&params)?;
    tracing::debug!(width, height, bytes = bytes.len(), "encoded thumbnail");

    Ok(GeneratedThumbnail {
        bytes,
        width,
        height,
        source: info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::imaging::backend::ColorMode;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn info(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            color: ColorMode::Rgb,
            format: "jpeg".into(),
        }
    }

    #[test]
    fn plan_thumbnail_fits_box() {
        let params = plan_thumbnail(b"", &info(3000, 2000), &ThumbnailSpec::default());
        assert_eq!((params.width, params.height), (300, 200));
        assert_eq!(params.quality, Quality::new(85));
    }

    #[test]
    fn plan_thumbnail_keeps_small_images() {
        let params = plan_thumbnail(b"", &info(64, 48), &ThumbnailSpec::default());
        assert_eq!((params.width, params.height), (64, 48));
    }

    #[test]
    fn plan_thumbnail_honors_custom_spec() {
        let spec = ThumbnailSpec {
            max_edge: 100,
            quality: Quality::new(70),
        };
        let params = plan_thumbnail(b"", &info(400, 800), &spec);
        assert_eq!((params.width, params.height), (50, 100));
        assert_eq!(params.quality.value(), 70);
    }

    #[test]
    fn create_thumbnail_identifies_then_renders() {
        let backend = MockBackend::with_dimensions(2000, 3000);
        let thumb = create_thumbnail(&backend, b"source", &ThumbnailSpec::default()).unwrap();

        assert_eq!((thumb.width, thumb.height), (200, 300));
        assert_eq!(thumb.source.width, 2000);
        assert!(!thumb.is_empty());
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Identify { len: 6 },
                RecordedOp::Thumbnail {
                    width: 200,
                    height: 300,
                    quality: 85,
                },
            ]
        );
    }

    #[test]
    fn identify_failure_skips_render() {
        let backend = MockBackend::new();
        let result = create_thumbnail(&backend, b"junk", &ThumbnailSpec::default());

        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert_eq!(backend.get_operations().len(), 1);
    }
}
