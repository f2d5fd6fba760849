//! Object storage capability.
//!
//! Every component that touches storage receives an [`ObjectStore`] by
//! reference instead of reaching for a process-wide client. That keeps the
//! pipeline stateless between invocations and lets tests swap in the
//! [`MemoryStore`] double.
//!
//! | Operation | Meaning |
//! |---|---|
//! | [`get_object`](ObjectStore::get_object) | Full body + declared length + metadata |
//! | [`head_object`](ObjectStore::head_object) | Existence probe: `Ok(None)` when absent |
//! | [`put_object`](ObjectStore::put_object) | Idempotent overwrite with content type, cache directive, metadata |
//!
//! Two implementations ship with the crate:
//!
//! - [`FsStore`]: buckets are directories under a root; metadata lives in JSON
//!   sidecars. Used by the CLI.
//! - [`MemoryStore`]: a `Mutex<HashMap>` with an operation log and fault
//!   injection. Used by tests and dry runs.

pub mod fs_store;
pub mod memory;

pub use fs_store::FsStore;
pub use memory::{Fault, MemoryObject, MemoryStore, OpKind, StoreOp};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(ObjectLocator),
    #[error("access denied: {0}")]
    AccessDenied(ObjectLocator),
    #[error("transient storage fault on {locator}: {reason}")]
    Transient {
        locator: ObjectLocator,
        reason: String,
    },
    #[error("invalid object name: {0}")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata sidecar error: {0}")]
    Sidecar(#[from] serde_json::Error),
}

/// A `(bucket, key)` pair identifying one stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectLocator {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocator {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// User metadata attached to an object. Ordered so sidecars and logs are stable.
pub type Metadata = BTreeMap<String, String>;

/// Result of a successful `get_object`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    /// Length the store claims for the object, independent of `body.len()`.
    pub content_length: u64,
    pub content_type: Option<String>,
    pub metadata: Metadata,
}

/// Result of a successful `head_object` on an existing object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectHead {
    pub content_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// SHA-256 of the body, hex encoded.
    pub etag: String,
}

/// A complete write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub locator: ObjectLocator,
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
    pub metadata: Metadata,
}

/// Storage access used by every pipeline component.
///
/// `Sync` so one store can be shared across rayon workers.
pub trait ObjectStore: Sync {
    /// Read the full object.
    fn get_object(&self, locator: &ObjectLocator) -> Result<StoredObject, StoreError>;

    /// Probe for an object. Absence is `Ok(None)`, not an error.
    fn head_object(&self, locator: &ObjectLocator) -> Result<Option<ObjectHead>, StoreError>;

    /// Write (or overwrite) an object.
    fn put_object(&self, request: PutObject) -> Result<(), StoreError>;
}

/// SHA-256 of a body, returned as a hex string.
pub fn etag_for(body: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(body))
}
