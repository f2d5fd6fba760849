//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the output geometry) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`ThumbnailSpec`]: The fixed derivation contract: bounding box, quality, output format, cache policy.
//! - [`ThumbnailParams`]: One concrete render: source bytes, exact output dimensions, quality.

/// Content type of every derived artifact.
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// Cache directive for derived artifacts: public, one year.
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// What every derived artifact looks like.
///
/// The output format is fixed to progressive JPEG; only the box edge and
/// quality are tunable through config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSpec {
    /// Edge of the square bounding box, in pixels.
    pub max_edge: u32,
    pub quality: Quality,
}

impl ThumbnailSpec {
    pub fn content_type(&self) -> &'static str {
        OUTPUT_CONTENT_TYPE
    }

    pub fn cache_control(&self) -> &'static str {
        CACHE_CONTROL
    }
}

impl Default for ThumbnailSpec {
    fn default() -> Self {
        Self {
            max_edge: 300,
            quality: Quality::default(),
        }
    }
}

/// Parameters for a single render: decode `source`, flatten, resize to
/// exactly `width`×`height`, encode.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams<'a> {
    pub source: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
