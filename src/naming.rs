//! Centralized key naming for source and derived objects.
//!
//! Derived artifacts live at a fixed prefix applied to the full source key:
//!
//! - `photo.jpg` → `thumb-photo.jpg`
//! - `albums/2024/dawn.png` → `thumb-albums/2024/dawn.png`
//!
//! The mapping is injective (prefixing never merges two keys), which is what
//! makes redelivered and duplicated notifications converge on the same object.
//! The gallery listing handler relies on the same prefix to find thumbnails.
//!
//! Note that the derived key keeps the source extension even though the
//! artifact is always JPEG, so `photo.png` yields a JPEG stored at
//! `thumb-photo.png`.

use std::path::Path;

/// Prefix applied to every derived key.
pub const DERIVED_PREFIX: &str = "thumb-";

/// Prefixes that mark a key as derived output. `resized-` was written by an
/// earlier deployment sharing the namespace.
pub const RESERVED_PREFIXES: &[&str] = &[DERIVED_PREFIX, "resized-"];

/// Raster extensions accepted as source material (compared lowercased).
pub const RECOGNIZED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"];

/// Compute the derived key for a source key.
pub fn derived_key(source_key: &str) -> String {
    format!("{DERIVED_PREFIX}{source_key}")
}

/// Whether `key` already carries a reserved derived prefix.
pub fn is_derived_key(key: &str) -> bool {
    RESERVED_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

/// Lowercased filename extension of the last path component, if any.
///
/// Dot-files (`.jpg`) and trailing dots (`photo.`) have no extension.
pub fn extension(key: &str) -> Option<String> {
    Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Whether `key` names a recognized raster format.
pub fn has_recognized_extension(key: &str) -> bool {
    extension(key).is_some_and(|ext| RECOGNIZED_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_key_prefixes_full_key() {
        assert_eq!(derived_key("photo.jpg"), "thumb-photo.jpg");
        assert_eq!(derived_key("albums/dawn.png"), "thumb-albums/dawn.png");
    }

    #[test]
    fn derived_key_keeps_source_extension() {
        // Output is always JPEG; the key is not rewritten.
        assert_eq!(derived_key("photo.png"), "thumb-photo.png");
        assert_eq!(derived_key("scan.tiff"), "thumb-scan.tiff");
    }

    #[test]
    fn derived_key_is_injective_over_distinct_keys() {
        let keys = ["a.jpg", "A.jpg", "a.jpeg", "dir/a.jpg", "thumb-a.jpg"];
        let derived: std::collections::HashSet<String> =
            keys.iter().map(|k| derived_key(k)).collect();
        assert_eq!(derived.len(), keys.len());
    }

    #[test]
    fn derived_key_is_always_recognized_as_derived() {
        for key in ["photo.jpg", "x", "albums/a.png", ""] {
            assert!(is_derived_key(&derived_key(key)));
        }
    }

    #[test]
    fn legacy_prefix_is_reserved() {
        assert!(is_derived_key("resized-photo.jpg"));
        assert!(is_derived_key("thumb-photo.jpg"));
        assert!(!is_derived_key("photo-thumb-.jpg"));
        assert!(!is_derived_key("albums/thumb-photo.jpg"));
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension("Photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(extension("a/b/c.TiFf").as_deref(), Some("tiff"));
    }

    #[test]
    fn extension_uses_last_component_only() {
        assert_eq!(extension("dir.jpg/readme"), None);
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
    }

    #[test]
    fn dotfiles_and_bare_names_have_no_extension() {
        assert_eq!(extension(".jpg"), None);
        assert_eq!(extension("photo"), None);
        assert_eq!(extension("photo."), None);
    }

    #[test]
    fn recognized_extensions_any_case() {
        for ext in RECOGNIZED_EXTENSIONS {
            assert!(has_recognized_extension(&format!("p.{ext}")));
            assert!(has_recognized_extension(&format!(
                "p.{}",
                ext.to_ascii_uppercase()
            )));
        }
    }

    #[test]
    fn unrecognized_extensions_rejected() {
        for key in ["document.pdf", "clip.mp4", "photo.tif", "photo.avif", "notes.txt"] {
            assert!(!has_recognized_extension(key), "{key} should be rejected");
        }
    }
}
