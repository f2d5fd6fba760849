//! In-memory object store.
//!
//! Records every operation and supports per-operation fault injection, so
//! tests can assert *what* the pipeline touched (e.g. that a redelivered
//! record never fetched its source) and simulate partial batch failures.
//! Uses `Mutex` (not `RefCell`) so it is `Sync` and works under rayon.

use super::{
    Metadata, ObjectHead, ObjectLocator, ObjectStore, PutObject, StoreError, StoredObject,
    etag_for,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Which store operation a fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Get,
    Head,
    Put,
}

/// Injected failure returned instead of performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    AccessDenied,
    Transient,
}

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(ObjectLocator),
    Head(ObjectLocator),
    Put(ObjectLocator),
}

/// A stored object with everything a `put_object` carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    pub body: Vec<u8>,
    /// Length reported by `get_object`/`head_object`. Normally `body.len()`.
    pub declared_length: u64,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub metadata: Metadata,
}

impl MemoryObject {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            declared_length: body.len() as u64,
            body,
            content_type: None,
            cache_control: None,
            metadata: Metadata::new(),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<ObjectLocator, MemoryObject>>,
    faults: Mutex<HashMap<(OpKind, ObjectLocator), Fault>>,
    operations: Mutex<Vec<StoreOp>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `body` at `locator` with no content type or metadata.
    pub fn insert(&self, locator: ObjectLocator, body: Vec<u8>) {
        self.insert_object(locator, MemoryObject::new(body));
    }

    pub fn insert_object(&self, locator: ObjectLocator, object: MemoryObject) {
        lock(&self.objects).insert(locator, object);
    }

    /// Snapshot of the object at `locator`, bypassing the operation log.
    pub fn object(&self, locator: &ObjectLocator) -> Option<MemoryObject> {
        lock(&self.objects).get(locator).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every future `op` on `locator` fail with `fault`.
    pub fn fail(&self, op: OpKind, locator: ObjectLocator, fault: Fault) {
        lock(&self.faults).insert((op, locator), fault);
    }

    pub fn operations(&self) -> Vec<StoreOp> {
        lock(&self.operations).clone()
    }

    pub fn clear_operations(&self) {
        lock(&self.operations).clear();
    }

    fn record(&self, op: StoreOp) {
        lock(&self.operations).push(op);
    }

    fn check_fault(&self, op: OpKind, locator: &ObjectLocator) -> Result<(), StoreError> {
        match lock(&self.faults).get(&(op, locator.clone())) {
            None => Ok(()),
            Some(Fault::AccessDenied) => Err(StoreError::AccessDenied(locator.clone())),
            Some(Fault::Transient) => Err(StoreError::Transient {
                locator: locator.clone(),
                reason: "injected fault".to_string(),
            }),
        }
    }
}

impl ObjectStore for MemoryStore {
    fn get_object(&self, locator: &ObjectLocator) -> Result<StoredObject, StoreError> {
        self.record(StoreOp::Get(locator.clone()));
        self.check_fault(OpKind::Get, locator)?;

        let objects = lock(&self.objects);
        let object = objects
            .get(locator)
            .ok_or_else(|| StoreError::NotFound(locator.clone()))?;
        Ok(StoredObject {
            body: object.body.clone(),
            content_length: object.declared_length,
            content_type: object.content_type.clone(),
            metadata: object.metadata.clone(),
        })
    }

    fn head_object(&self, locator: &ObjectLocator) -> Result<Option<ObjectHead>, StoreError> {
        self.record(StoreOp::Head(locator.clone()));
        self.check_fault(OpKind::Head, locator)?;

        Ok(lock(&self.objects).get(locator).map(|object| ObjectHead {
            content_length: object.declared_length,
            content_type: object.content_type.clone(),
            cache_control: object.cache_control.clone(),
            metadata: object.metadata.clone(),
            etag: etag_for(&object.body),
        }))
    }

    fn put_object(&self, request: PutObject) -> Result<(), StoreError> {
        self.record(StoreOp::Put(request.locator.clone()));
        self.check_fault(OpKind::Put, &request.locator)?;

        let object = MemoryObject {
            declared_length: request.body.len() as u64,
            body: request.body,
            content_type: Some(request.content_type),
            cache_control: Some(request.cache_control),
            metadata: request.metadata,
        };
        lock(&self.objects).insert(request.locator, object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(key: &str) -> ObjectLocator {
        ObjectLocator::new("bucket", key)
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        let result = store.get_object(&loc("missing.jpg"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn head_missing_is_none_not_error() {
        let store = MemoryStore::new();
        assert_eq!(store.head_object(&loc("missing.jpg")).unwrap(), None);
    }

    #[test]
    fn put_then_head_reports_headers_and_metadata() {
        let store = MemoryStore::new();
        let mut metadata = Metadata::new();
        metadata.insert("k".into(), "v".into());
        store
            .put_object(PutObject {
                locator: loc("a.jpg"),
                body: vec![1, 2, 3],
                content_type: "image/jpeg".into(),
                cache_control: "no-cache".into(),
                metadata: metadata.clone(),
            })
            .unwrap();

        let head = store.head_object(&loc("a.jpg")).unwrap().unwrap();
        assert_eq!(head.content_length, 3);
        assert_eq!(head.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(head.cache_control.as_deref(), Some("no-cache"));
        assert_eq!(head.metadata, metadata);
        assert_eq!(head.etag, etag_for(&[1, 2, 3]));
    }

    #[test]
    fn injected_faults_apply_per_operation() {
        let store = MemoryStore::new();
        store.insert(loc("a.jpg"), vec![0]);
        store.fail(OpKind::Get, loc("a.jpg"), Fault::AccessDenied);

        assert!(matches!(
            store.get_object(&loc("a.jpg")),
            Err(StoreError::AccessDenied(_))
        ));
        // Head on the same locator is unaffected
        assert!(store.head_object(&loc("a.jpg")).unwrap().is_some());
    }

    #[test]
    fn operations_are_recorded_in_order() {
        let store = MemoryStore::new();
        store.insert(loc("a.jpg"), vec![0]);
        let _ = store.head_object(&loc("a.jpg"));
        let _ = store.get_object(&loc("a.jpg"));

        assert_eq!(
            store.operations(),
            vec![StoreOp::Head(loc("a.jpg")), StoreOp::Get(loc("a.jpg"))]
        );
    }
}
