//! Derived artifact persistence.
//!
//! Every artifact is written with the same headers so that the gallery and
//! any CDN in front of it can cache aggressively:
//!
//! | Field | Value |
//! |---|---|
//! | Content-Type | `image/jpeg` |
//! | Cache-Control | `public, max-age=31536000` |
//! | `original-bucket` | source bucket |
//! | `original-key` | source key (decoded) |
//! | `thumbnail-created` | `true` |
//!
//! The metadata fields belong to this pipeline; peers may read them but
//! never write them.

use crate::imaging::ThumbnailSpec;
use crate::pipeline::PipelineError;
use crate::storage::{Metadata, ObjectLocator, ObjectStore, PutObject};

pub const META_ORIGINAL_BUCKET: &str = "original-bucket";
pub const META_ORIGINAL_KEY: &str = "original-key";
pub const META_DERIVED: &str = "thumbnail-created";

/// An encoded thumbnail ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedArtifact {
    pub locator: ObjectLocator,
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
    pub metadata: Metadata,
}

impl DerivedArtifact {
    pub fn new(
        source: &ObjectLocator,
        destination: ObjectLocator,
        bytes: Vec<u8>,
        spec: &ThumbnailSpec,
    ) -> Self {
        Self {
            locator: destination,
            bytes,
            content_type: spec.content_type().to_string(),
            cache_control: spec.cache_control().to_string(),
            metadata: provenance_metadata(source),
        }
    }
}

/// Provenance fields recorded on every artifact.
pub fn provenance_metadata(source: &ObjectLocator) -> Metadata {
    Metadata::from([
        (META_ORIGINAL_BUCKET.to_string(), source.bucket.clone()),
        (META_ORIGINAL_KEY.to_string(), source.key.clone()),
        (META_DERIVED.to_string(), "true".to_string()),
    ])
}

/// Write `artifact`, overwriting whatever is at its locator.
pub fn publish(
    store: &(impl ObjectStore + ?Sized),
    artifact: DerivedArtifact,
) -> Result<(), PipelineError> {
    let locator = artifact.locator.clone();
    tracing::info!(%locator, bytes = artifact.bytes.len(), "uploading thumbnail");

    store
        .put_object(PutObject {
            locator: artifact.locator,
            body: artifact.bytes,
            content_type: artifact.content_type,
            cache_control: artifact.cache_control,
            metadata: artifact.metadata,
        })
        .map_err(|source| PipelineError::Persist { locator, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Fault, MemoryStore, OpKind};

    fn artifact() -> DerivedArtifact {
        DerivedArtifact::new(
            &ObjectLocator::new("uploads", "albums/photo.jpg"),
            ObjectLocator::new("thumbs", "thumb-albums/photo.jpg"),
            vec![0xFF, 0xD8, 0xFF, 0xD9],
            &ThumbnailSpec::default(),
        )
    }

    #[test]
    fn artifact_carries_fixed_headers() {
        let a = artifact();
        assert_eq!(a.content_type, "image/jpeg");
        assert_eq!(a.cache_control, "public, max-age=31536000");
    }

    #[test]
    fn provenance_records_source_and_marker() {
        let metadata = provenance_metadata(&ObjectLocator::new("uploads", "a b.jpg"));
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata[META_ORIGINAL_BUCKET], "uploads");
        assert_eq!(metadata[META_ORIGINAL_KEY], "a b.jpg");
        assert_eq!(metadata[META_DERIVED], "true");
    }

    #[test]
    fn publish_writes_everything() {
        let store = MemoryStore::new();
        publish(&store, artifact()).unwrap();

        let stored = store
            .object(&ObjectLocator::new("thumbs", "thumb-albums/photo.jpg"))
            .unwrap();
        assert_eq!(stored.body, vec![0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(stored.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(
            stored.cache_control.as_deref(),
            Some("public, max-age=31536000")
        );
        assert_eq!(stored.metadata[META_ORIGINAL_KEY], "albums/photo.jpg");
    }

    #[test]
    fn publish_is_an_idempotent_overwrite() {
        let store = MemoryStore::new();
        publish(&store, artifact()).unwrap();
        publish(&store, artifact()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn write_failure_is_persist_error() {
        let store = MemoryStore::new();
        store.fail(
            OpKind::Put,
            ObjectLocator::new("thumbs", "thumb-albums/photo.jpg"),
            Fault::Transient,
        );

        let err = publish(&store, artifact()).unwrap_err();
        assert!(matches!(err, PipelineError::Persist { .. }));
        assert!(store.is_empty());
    }
}
