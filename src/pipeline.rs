//! Per-object derivation pipeline.
//!
//! ```text
//! classify ──skip──────────────────────────────▶ Outcome::Skipped
//!    │
//!    └─process─▶ fetch ─▶ create_thumbnail ─▶ publish ─▶ Outcome::Derived
//! ```
//!
//! Every step's failure is terminal for the record and is logged with the
//! implicated locator before it propagates. There is no retry here; the
//! caller redelivers the whole batch and relies on the idempotency guard.

use crate::classify::{self, Decision, SkipReason};
use crate::config::PipelineConfig;
use crate::fetch::fetch;
use crate::imaging::{BackendError, ImageBackend, ThumbnailSpec, create_thumbnail};
use crate::publish::{DerivedArtifact, publish};
use crate::storage::{ObjectLocator, ObjectStore, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid object key {raw:?} in bucket {bucket}: {reason}")]
    InvalidKey {
        bucket: String,
        raw: String,
        reason: String,
    },
    #[error("existence check failed for {locator}: {source}")]
    Probe {
        locator: ObjectLocator,
        source: StoreError,
    },
    #[error("cannot read {locator}: {source}")]
    Retrieval {
        locator: ObjectLocator,
        source: StoreError,
    },
    #[error("short read on {locator}: declared {declared} bytes, received {actual}")]
    Truncated {
        locator: ObjectLocator,
        declared: u64,
        actual: u64,
    },
    #[error("cannot derive thumbnail for {locator}: {source}")]
    Imaging {
        locator: ObjectLocator,
        source: BackendError,
    },
    #[error("cannot write {locator}: {source}")]
    Persist {
        locator: ObjectLocator,
        source: StoreError,
    },
}

/// What a successful derivation produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedSummary {
    pub derived: ObjectLocator,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub source_width: u32,
    pub source_height: u32,
    pub source_format: String,
}

/// Successful completion of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Derived(DerivedSummary),
    Skipped(SkipReason),
}

/// Classifier → Fetcher → ThumbnailEngine → Publisher for one object.
///
/// Holds only borrowed capabilities and immutable settings, so one pipeline
/// can be shared by every worker of a batch.
pub struct Pipeline<'a, S: ?Sized, B> {
    store: &'a S,
    backend: &'a B,
    destination_bucket: String,
    spec: ThumbnailSpec,
}

impl<'a, S: ObjectStore + ?Sized, B: ImageBackend> Pipeline<'a, S, B> {
    pub fn new(store: &'a S, backend: &'a B, config: &PipelineConfig) -> Self {
        Self {
            store,
            backend,
            destination_bucket: config.destination_bucket.clone(),
            spec: config.thumbnail_spec(),
        }
    }

    pub fn destination_bucket(&self) -> &str {
        &self.destination_bucket
    }

    pub fn spec(&self) -> &ThumbnailSpec {
        &self.spec
    }

    /// Run only the classifier for `source`.
    pub fn classify(&self, source: &ObjectLocator) -> Result<Decision, PipelineError> {
        classify::classify(self.store, source, &self.destination_bucket)
    }

    /// Process one object end to end.
    pub fn process(&self, source: &ObjectLocator) -> Result<Outcome, PipelineError> {
        let result = self.run(source);
        if let Err(e) = &result {
            tracing::error!(%source, error = %e, "failed to process record");
        }
        result
    }

    fn run(&self, source: &ObjectLocator) -> Result<Outcome, PipelineError> {
        tracing::info!(%source, "processing image");

        let derived = match self.classify(source)? {
            Decision::Skip(reason) => {
                tracing::info!(%source, %reason, "skipping");
                return Ok(Outcome::Skipped(reason));
            }
            Decision::Process { derived } => derived,
        };

        if source.bucket == self.destination_bucket {
            tracing::warn!(
                bucket = %source.bucket,
                "source and destination bucket are the same; loop prevention relies on the key prefix"
            );
        }

        let buffer = fetch(self.store, source)?;
        if classify::is_derived_source(&buffer.metadata) {
            tracing::info!(%source, "skipping: source metadata carries the derived marker");
            return Ok(Outcome::Skipped(SkipReason::DerivedSource));
        }

        let thumb = create_thumbnail(self.backend, &buffer.bytes, &self.spec).map_err(|e| {
            PipelineError::Imaging {
                locator: source.clone(),
                source: e,
            }
        })?;
        drop(buffer);

        let summary = DerivedSummary {
            derived: derived.clone(),
            width: thumb.width,
            height: thumb.height,
            bytes: thumb.len(),
            source_width: thumb.source.width,
            source_height: thumb.source.height,
            source_format: thumb.source.format.clone(),
        };

        publish(
            self.store,
            DerivedArtifact::new(source, derived, thumb.bytes, &self.spec),
        )?;

        tracing::info!(
            %source,
            derived = %summary.derived,
            width = summary.width,
            height = summary.height,
            "thumbnail created"
        );
        Ok(Outcome::Derived(summary))
    }
}
