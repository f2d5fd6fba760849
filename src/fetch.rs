//! Source retrieval.
//!
//! One `get_object` per record, no retry: a failed read fails the record and
//! the platform's batch redelivery is the only recovery path.

use crate::pipeline::PipelineError;
use crate::storage::{Metadata, ObjectLocator, ObjectStore};

/// Raw bytes of one source object plus what the store claimed about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub bytes: Vec<u8>,
    pub declared_length: u64,
    pub metadata: Metadata,
}

impl ImageBuffer {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Read the full content of `locator`.
///
/// A body shorter or longer than the declared length is treated as a failed
/// read rather than handed to the decoder.
pub fn fetch(
    store: &(impl ObjectStore + ?Sized),
    locator: &ObjectLocator,
) -> Result<ImageBuffer, PipelineError> {
    tracing::info!(%locator, "downloading source image");
    let object = store
        .get_object(locator)
        .map_err(|source| PipelineError::Retrieval {
            locator: locator.clone(),
            source,
        })?;

    let actual = object.body.len() as u64;
    if actual != object.content_length {
        return Err(PipelineError::Truncated {
            locator: locator.clone(),
            declared: object.content_length,
            actual,
        });
    }

    Ok(ImageBuffer {
        bytes: object.body,
        declared_length: object.content_length,
        metadata: object.metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Fault, MemoryObject, MemoryStore, OpKind, StoreError};

    fn loc() -> ObjectLocator {
        ObjectLocator::new("uploads", "photo.jpg")
    }

    #[test]
    fn fetch_returns_bytes_and_length() {
        let store = MemoryStore::new();
        store.insert(loc(), vec![1, 2, 3, 4]);

        let buffer = fetch(&store, &loc()).unwrap();
        assert_eq!(buffer.bytes, vec![1, 2, 3, 4]);
        assert_eq!(buffer.declared_length, 4);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn fetch_carries_source_metadata() {
        let store = MemoryStore::new();
        let mut object = MemoryObject::new(vec![0]);
        object.metadata.insert("owner".into(), "ana".into());
        store.insert_object(loc(), object);

        let buffer = fetch(&store, &loc()).unwrap();
        assert_eq!(buffer.metadata.get("owner").map(String::as_str), Some("ana"));
    }

    #[test]
    fn missing_source_is_retrieval_failure() {
        let store = MemoryStore::new();
        let err = fetch(&store, &loc()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Retrieval {
                source: StoreError::NotFound(_),
                ..
            }
        ));
    }

    #[test]
    fn access_denied_is_retrieval_failure() {
        let store = MemoryStore::new();
        store.insert(loc(), vec![0]);
        store.fail(OpKind::Get, loc(), Fault::AccessDenied);

        let err = fetch(&store, &loc()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Retrieval {
                source: StoreError::AccessDenied(_),
                ..
            }
        ));
    }

    #[test]
    fn length_mismatch_is_truncated() {
        let store = MemoryStore::new();
        let mut object = MemoryObject::new(vec![0; 10]);
        object.declared_length = 64;
        store.insert_object(loc(), object);

        let err = fetch(&store, &loc()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Truncated {
                declared: 64,
                actual: 10,
                ..
            }
        ));
    }
}
