//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate dimensions that fit `source` inside a `max_edge`×`max_edge` box.
///
/// Aspect ratio is preserved and images are never enlarged: a source whose
/// longer edge already fits is returned unchanged. Otherwise the longer edge
/// becomes exactly `max_edge` and the shorter edge is rounded, never below 1.
///
/// # Examples
/// ```
/// # use thumbnailer::imaging::calculate_bounded_dimensions;
/// assert_eq!(calculate_bounded_dimensions((3000, 2000), 300), (300, 200));
/// assert_eq!(calculate_bounded_dimensions((120, 80), 300), (120, 80));
/// ```
pub fn calculate_bounded_dimensions(source: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let longer_edge = src_w.max(src_h);

    if longer_edge <= max_edge || longer_edge == 0 {
        return source;
    }

    let scale = |edge: u32| -> u32 {
        let scaled = (edge as f64 * max_edge as f64 / longer_edge as f64).round() as u32;
        scaled.clamp(1, max_edge)
    };

    if src_w >= src_h {
        // Landscape or square: width is the longer edge
        (max_edge, scale(src_h))
    } else {
        // Portrait
        (scale(src_w), max_edge)
    }
}
