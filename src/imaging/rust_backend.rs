//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, BMP, TIFF) | `image::ImageReader` with content sniffing |
//! | Identify | `ImageDecoder::dimensions` / `color_type` (header only) |
//! | Flatten | alpha blend over white, per pixel |
//! | Resize | `image::imageops::resize` with `Lanczos3` filter |
//! | Encode → JPEG | `jpeg_encoder::Encoder`, progressive + optimized Huffman |
//!
//! The format is sniffed from the bytes, not taken from the key's extension,
//! so a PNG uploaded as `photo.jpg` still decodes. Animated GIF and WebP
//! decode to their first frame.

use super::backend::{BackendError, ColorMode, DecodedImage, ImageBackend};
use super::params::{Quality, ThumbnailParams};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage};
use std::io::Cursor;

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

fn open(source: &[u8]) -> Result<(ImageReader<Cursor<&[u8]>>, String), BackendError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(format!("cannot read image header: {e}")))?;
    let format = reader
        .format()
        .map(|f| format!("{f:?}").to_ascii_lowercase())
        .ok_or_else(|| BackendError::Decode("unrecognized image format".into()))?;
    Ok((reader, format))
}

fn color_mode(color: ColorType) -> ColorMode {
    match color {
        ColorType::L8 | ColorType::L16 => ColorMode::Luma,
        ColorType::La8 | ColorType::La16 => ColorMode::LumaAlpha,
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
        _ => ColorMode::Other,
    }
}

/// Decode the full raster.
fn load_image(source: &[u8]) -> Result<DynamicImage, BackendError> {
    let (reader, format) = open(source)?;
    reader
        .decode()
        .map_err(|e| BackendError::Decode(format!("{format}: {e}")))
}

/// Collapse any color model to opaque 8-bit RGB.
///
/// Alpha-bearing images (RGBA, LA, and palette images with transparency,
/// which decode as RGBA) are composited over white using alpha as the mask.
/// Everything else is converted channel-wise.
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Encode as progressive JPEG with optimized Huffman tables.
fn encode_jpeg(img: &RgbImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let width = u16::try_from(img.width())
        .map_err(|_| BackendError::Encode(format!("width {} exceeds JPEG limit", img.width())))?;
    let height = u16::try_from(img.height()).map_err(|_| {
        BackendError::Encode(format!("height {} exceeds JPEG limit", img.height()))
    })?;

    let mut buf = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buf, quality.value() as u8);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(img.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<DecodedImage, BackendError> {
        let (reader, format) = open(source)?;
        let decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::Decode(format!("{format}: {e}")))?;
        let (width, height) = decoder.dimensions();
        Ok(DecodedImage {
            width,
            height,
            color: color_mode(decoder.color_type()),
            format,
        })
    }

    fn thumbnail(&self, params: &ThumbnailParams<'_>) -> Result<Vec<u8>, BackendError> {
        if params.width == 0 || params.height == 0 {
            return Err(BackendError::ProcessingFailed(format!(
                "invalid target size {}x{}",
                params.width, params.height
            )));
        }

        let img = load_image(params.source)?;
        let flat = flatten_onto_white(&img);
        drop(img);

        let sized = if flat.dimensions() == (params.width, params.height) {
            flat
        } else {
            image::imageops::resize(&flat, params.width, params.height, FilterType::Lanczos3)
        };

        encode_jpeg(&sized, params.quality)
    }
}
