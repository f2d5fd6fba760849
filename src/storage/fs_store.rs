//! Filesystem-backed object store.
//!
//! ```text
//! <root>/
//! ├── uploads/                       # bucket
//! │   └── albums/photo.jpg           # object body, key used as relative path
//! ├── photo-share-buck-resized/
//! │   └── thumb-albums/photo.jpg
//! └── .meta/                         # sidecars (never a valid bucket name)
//!     └── photo-share-buck-resized/
//!         └── thumb-albums/photo.jpg.json
//! ```
//!
//! Writes go through a temp file in the destination directory followed by an
//! atomic rename, so a concurrent reader sees either the old artifact or the
//! new one, never a torn file. Objects without a sidecar (dropped in by hand)
//! read back with no content type and empty metadata.

use super::{
    ObjectHead, ObjectLocator, ObjectStore, PutObject, StoreError, StoredObject, etag_for,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SIDECAR_DIR: &str = ".meta";

pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn body_path(&self, locator: &ObjectLocator) -> Result<PathBuf, StoreError> {
        validate_locator(locator)?;
        Ok(self.root.join(&locator.bucket).join(&locator.key))
    }

    fn sidecar_path(&self, locator: &ObjectLocator) -> Result<PathBuf, StoreError> {
        validate_locator(locator)?;
        Ok(self
            .root
            .join(SIDECAR_DIR)
            .join(&locator.bucket)
            .join(format!("{}.json", locator.key)))
    }

    fn read_sidecar(&self, locator: &ObjectLocator) -> Result<Option<ObjectHead>, StoreError> {
        let path = self.sidecar_path(locator)?;
        match std::fs::read_to_string(&path) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(e, locator)),
        }
    }
}

/// Reject names that would escape the bucket directory or collide with the
/// sidecar tree.
fn validate_locator(locator: &ObjectLocator) -> Result<(), StoreError> {
    let bucket = &locator.bucket;
    if bucket.is_empty() || bucket.starts_with('.') || bucket.contains(['/', '\\']) {
        return Err(StoreError::InvalidName(format!("bucket {bucket:?}")));
    }

    let key = &locator.key;
    let bad_component = key
        .split('/')
        .any(|part| part.is_empty() || part == "." || part == "..");
    if bad_component || key.contains('\\') {
        return Err(StoreError::InvalidName(format!("key {key:?}")));
    }
    Ok(())
}

fn map_io(err: io::Error, locator: &ObjectLocator) -> StoreError {
    match err.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound(locator.clone()),
        io::ErrorKind::PermissionDenied => StoreError::AccessDenied(locator.clone()),
        _ => StoreError::Io(err),
    }
}

/// Write `bytes` to `path` via a sibling temp file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl ObjectStore for FsStore {
    fn get_object(&self, locator: &ObjectLocator) -> Result<StoredObject, StoreError> {
        let path = self.body_path(locator)?;
        let declared = std::fs::metadata(&path).map_err(|e| map_io(e, locator))?;
        if !declared.is_file() {
            return Err(StoreError::NotFound(locator.clone()));
        }
        let body = std::fs::read(&path).map_err(|e| map_io(e, locator))?;
        let sidecar = self.read_sidecar(locator)?;

        Ok(StoredObject {
            body,
            content_length: declared.len(),
            content_type: sidecar.as_ref().and_then(|s| s.content_type.clone()),
            metadata: sidecar.map(|s| s.metadata).unwrap_or_default(),
        })
    }

    fn head_object(&self, locator: &ObjectLocator) -> Result<Option<ObjectHead>, StoreError> {
        let path = self.body_path(locator)?;
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_io(e, locator)),
        }

        match self.read_sidecar(locator)? {
            Some(head) => Ok(Some(head)),
            None => {
                let body = std::fs::read(&path).map_err(|e| map_io(e, locator))?;
                Ok(Some(ObjectHead {
                    content_length: body.len() as u64,
                    content_type: None,
                    cache_control: None,
                    metadata: Default::default(),
                    etag: etag_for(&body),
                }))
            }
        }
    }

    fn put_object(&self, request: PutObject) -> Result<(), StoreError> {
        let locator = &request.locator;
        let body_path = self.body_path(locator)?;
        let sidecar_path = self.sidecar_path(locator)?;

        let head = ObjectHead {
            content_length: request.body.len() as u64,
            content_type: Some(request.content_type.clone()),
            cache_control: Some(request.cache_control.clone()),
            metadata: request.metadata.clone(),
            etag: etag_for(&request.body),
        };
        let sidecar = serde_json::to_vec_pretty(&head)?;

        write_atomic(&body_path, &request.body).map_err(|e| map_io(e, locator))?;
        write_atomic(&sidecar_path, &sidecar).map_err(|e| map_io(e, locator))?;
        Ok(())
    }
}
