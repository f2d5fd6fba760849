//! Change-notification dispatch.
//!
//! Decodes a batch of storage write events into locators and runs the
//! [`Pipeline`] once per record. Records are independent: they run on a local
//! rayon pool and every record is attempted even after a sibling fails.
//!
//! The caller only sees an aggregate [`InvocationResult`]:
//!
//! | Batch | Status | Body |
//! |---|---|---|
//! | every record processed or skipped | 200 | `{"message": "All thumbnails processed successfully", "processedRecords": N}` |
//! | any record failed, or the payload is malformed | 500 | `{"error": "<first failure>", "message": "Failed to process image"}` |
//!
//! "First failure" is first in record order, not in completion order, so the
//! result does not depend on scheduling. Per-record detail is available to an
//! in-process observer through the optional [`RecordEvent`] channel.

use crate::classify::SkipReason;
use crate::imaging::ImageBackend;
use crate::pipeline::{DerivedSummary, Outcome, Pipeline, PipelineError};
use crate::storage::{ObjectLocator, ObjectStore};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;
use thiserror::Error;

pub const SUCCESS_MESSAGE: &str = "All thumbnails processed successfully";
pub const FAILURE_MESSAGE: &str = "Failed to process image";

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("malformed notification: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A batch of storage write events.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeNotification {
    #[serde(rename = "Records")]
    pub records: Vec<NotificationRecord>,
}

impl ChangeNotification {
    pub fn parse(payload: &str) -> Result<Self, DispatchError> {
        Ok(serde_json::from_str(payload)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    pub s3: StorageEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageEntity {
    pub bucket: BucketEntity,
    pub object: ObjectEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketEntity {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntity {
    /// URL-encoded, with `+` standing for a space.
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl NotificationRecord {
    /// Locator with the key decoded.
    pub fn locator(&self) -> Result<ObjectLocator, PipelineError> {
        let bucket = &self.s3.bucket.name;
        let raw = &self.s3.object.key;
        decode_key(raw)
            .map(|key| ObjectLocator::new(bucket.clone(), key))
            .map_err(|e| PipelineError::InvalidKey {
                bucket: bucket.clone(),
                raw: raw.clone(),
                reason: e.to_string(),
            })
    }

    /// Locator with the key exactly as delivered.
    pub fn raw_locator(&self) -> ObjectLocator {
        ObjectLocator::new(self.s3.bucket.name.clone(), self.s3.object.key.clone())
    }
}

/// Percent-decode an event key, treating `+` as a literal space.
///
/// A literal plus in the original key arrives as `%2B` and survives.
pub fn decode_key(raw: &str) -> Result<String, std::string::FromUtf8Error> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map(|key| key.into_owned())
}

/// Aggregate outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    /// JSON document, serialized as a string.
    pub body: String,
}

impl InvocationResult {
    pub fn success(processed_records: usize) -> Self {
        let body = serde_json::json!({
            "message": SUCCESS_MESSAGE,
            "processedRecords": processed_records,
        });
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    pub fn failure(error: &str) -> Self {
        let body = serde_json::json!({
            "error": error,
            "message": FAILURE_MESSAGE,
        });
        Self {
            status_code: 500,
            body: body.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// How one record ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Derived(DerivedSummary),
    Skipped(SkipReason),
    Failed(String),
}

/// Progress event emitted once per record as it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEvent {
    /// Zero-based position in the batch.
    pub index: usize,
    pub total: usize,
    pub locator: ObjectLocator,
    pub status: RecordStatus,
}

/// Parse `payload` and dispatch it. A malformed payload is a 500.
pub fn handle_payload<S, B>(
    payload: &str,
    pipeline: &Pipeline<'_, S, B>,
    workers: usize,
    progress: Option<Sender<RecordEvent>>,
) -> InvocationResult
where
    S: ObjectStore + ?Sized,
    B: ImageBackend,
{
    match ChangeNotification::parse(payload) {
        Ok(notification) => dispatch(&notification, pipeline, workers, progress),
        Err(e) => {
            tracing::error!(error = %e, "rejecting invocation");
            InvocationResult::failure(&e.to_string())
        }
    }
}

/// Run every record of `notification` through `pipeline`.
///
/// `workers` bounds the pool; 1 runs the records sequentially on the calling
/// thread. Progress events are sent in completion order and the channel is
/// closed when this returns.
pub fn dispatch<S, B>(
    notification: &ChangeNotification,
    pipeline: &Pipeline<'_, S, B>,
    workers: usize,
    progress: Option<Sender<RecordEvent>>,
) -> InvocationResult
where
    S: ObjectStore + ?Sized,
    B: ImageBackend,
{
    let records = &notification.records;
    let total = records.len();
    tracing::info!(records = total, workers, "dispatching notification");

    let run = |index: usize, record: &NotificationRecord| {
        run_record(pipeline, index, total, record, progress.as_ref())
    };

    let results: Vec<Result<Outcome, PipelineError>> = if workers <= 1 || total <= 1 {
        records.iter().enumerate().map(|(i, r)| run(i, r)).collect()
    } else {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| {
                records
                    .par_iter()
                    .enumerate()
                    .map(|(i, r)| run(i, r))
                    .collect()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "worker pool unavailable, running sequentially");
                records.iter().enumerate().map(|(i, r)| run(i, r)).collect()
            }
        }
    };

    match results.into_iter().find_map(Result::err) {
        None => InvocationResult::success(total),
        Some(e) => InvocationResult::failure(&e.to_string()),
    }
}

fn run_record<S, B>(
    pipeline: &Pipeline<'_, S, B>,
    index: usize,
    total: usize,
    record: &NotificationRecord,
    progress: Option<&Sender<RecordEvent>>,
) -> Result<Outcome, PipelineError>
where
    S: ObjectStore + ?Sized,
    B: ImageBackend,
{
    tracing::debug!(
        event = record.event_name.as_deref().unwrap_or("unknown"),
        size = record.s3.object.size,
        index,
        "record received"
    );

    let (locator, result) = match record.locator() {
        Ok(locator) => {
            let result = pipeline.process(&locator);
            (locator, result)
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot decode object key");
            (record.raw_locator(), Err(e))
        }
    };

    if let Some(tx) = progress {
        let status = match &result {
            Ok(Outcome::Derived(summary)) => RecordStatus::Derived(summary.clone()),
            Ok(Outcome::Skipped(reason)) => RecordStatus::Skipped(*reason),
            Err(e) => RecordStatus::Failed(e.to_string()),
        };
        // A dropped receiver only means nobody is watching.
        let _ = tx.send(RecordEvent {
            index,
            total,
            locator,
            status,
        });
    }

    result
}
