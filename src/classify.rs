//! Process-or-skip decision for one notified object.
//!
//! Checks run cheapest first and stop at the first skip:
//!
//! 1. key carries a reserved derived prefix (loop prevention)
//! 2. extension is not a recognized raster format
//! 3. the derived artifact already exists (idempotency guard)
//!
//! Skips are successful no-ops. The existence probe is advisory only: two
//! concurrent deliveries may both pass it and both write the same artifact,
//! which is harmless because the write is a deterministic overwrite.

use crate::naming;
use crate::pipeline::PipelineError;
use crate::publish::META_DERIVED;
use crate::storage::{Metadata, ObjectLocator, ObjectStore};
use serde::Serialize;
use std::fmt;

/// Why a record completed without producing an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Key starts with a reserved derived prefix.
    DerivedKey,
    /// Extension outside the recognized raster set.
    UnsupportedExtension,
    /// Derived artifact is already present at the destination.
    AlreadyExists,
    /// Source object's own metadata marks it as derived output.
    DerivedSource,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::DerivedKey => "already a thumbnail",
            SkipReason::UnsupportedExtension => "not an image",
            SkipReason::AlreadyExists => "thumbnail exists",
            SkipReason::DerivedSource => "source is derived output",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Derive an artifact at `derived`.
    Process { derived: ObjectLocator },
    Skip(SkipReason),
}

/// Key-only checks (steps 1 and 2). No storage access.
pub fn classify_key(key: &str) -> Option<SkipReason> {
    if naming::is_derived_key(key) {
        Some(SkipReason::DerivedKey)
    } else if !naming::has_recognized_extension(key) {
        Some(SkipReason::UnsupportedExtension)
    } else {
        None
    }
}

/// Full classification, including the existence probe in `destination_bucket`.
///
/// A probe error other than "absent" fails the record instead of skipping it.
pub fn classify(
    store: &(impl ObjectStore + ?Sized),
    source: &ObjectLocator,
    destination_bucket: &str,
) -> Result<Decision, PipelineError> {
    if let Some(reason) = classify_key(&source.key) {
        return Ok(Decision::Skip(reason));
    }

    let derived = ObjectLocator::new(destination_bucket, naming::derived_key(&source.key));
    match store.head_object(&derived) {
        Ok(Some(_)) => Ok(Decision::Skip(SkipReason::AlreadyExists)),
        Ok(None) => Ok(Decision::Process { derived }),
        Err(err) => Err(PipelineError::Probe {
            locator: derived,
            source: err,
        }),
    }
}

/// Whether object metadata carries the derived marker written on publish.
pub fn is_derived_source(metadata: &Metadata) -> bool {
    metadata
        .get(META_DERIVED)
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Fault, MemoryStore, OpKind, StoreOp};

    const DEST: &str = "thumbs";

    fn src(key: &str) -> ObjectLocator {
        ObjectLocator::new("uploads", key)
    }

    #[test]
    fn recognized_extensions_proceed_in_any_case() {
        let store = MemoryStore::new();
        for ext in ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"] {
            for key in [format!("a.{ext}"), format!("a.{}", ext.to_uppercase())] {
                let decision = classify(&store, &src(&key), DEST).unwrap();
                assert_eq!(
                    decision,
                    Decision::Process {
                        derived: ObjectLocator::new(DEST, format!("thumb-{key}"))
                    }
                );
            }
        }
    }

    #[test]
    fn other_extensions_skip_without_probe() {
        let store = MemoryStore::new();
        for key in ["document.pdf", "movie.mov", "README", ".png", "photo.tif"] {
            assert_eq!(
                classify(&store, &src(key), DEST).unwrap(),
                Decision::Skip(SkipReason::UnsupportedExtension),
                "{key}"
            );
        }
        assert!(store.operations().is_empty());
    }

    #[test]
    fn derived_prefix_skips_regardless_of_extension() {
        let store = MemoryStore::new();
        for key in ["thumb-photo.jpg", "thumb-document.pdf", "resized-photo.png"] {
            assert_eq!(
                classify(&store, &src(key), DEST).unwrap(),
                Decision::Skip(SkipReason::DerivedKey),
                "{key}"
            );
        }
        assert!(store.operations().is_empty());
    }

    #[test]
    fn existing_artifact_skips() {
        let store = MemoryStore::new();
        store.insert(ObjectLocator::new(DEST, "thumb-photo.jpg"), vec![0]);

        assert_eq!(
            classify(&store, &src("photo.jpg"), DEST).unwrap(),
            Decision::Skip(SkipReason::AlreadyExists)
        );
        assert_eq!(
            store.operations(),
            vec![StoreOp::Head(ObjectLocator::new(DEST, "thumb-photo.jpg"))]
        );
    }

    #[test]
    fn probe_error_is_failure_not_skip() {
        let store = MemoryStore::new();
        store.fail(
            OpKind::Head,
            ObjectLocator::new(DEST, "thumb-photo.jpg"),
            Fault::AccessDenied,
        );

        let err = classify(&store, &src("photo.jpg"), DEST).unwrap_err();
        assert!(matches!(err, PipelineError::Probe { .. }));
    }

    #[test]
    fn derived_marker_detection() {
        let mut metadata = Metadata::new();
        assert!(!is_derived_source(&metadata));
        metadata.insert(META_DERIVED.into(), "true".into());
        assert!(is_derived_source(&metadata));
        metadata.insert(META_DERIVED.into(), "false".into());
        assert!(!is_derived_source(&metadata));
    }
}
