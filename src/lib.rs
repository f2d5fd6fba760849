//! # Thumbnailer
//!
//! Derives bounded JPEG thumbnails from images as they land in object
//! storage. Every write notification for a raw upload yields at most one
//! preview artifact, named deterministically after its source, written once
//! and never looped on.
//!
//! # Architecture: Per-Record Pipeline
//!
//! A notification batch is fanned out into independent records. Each record
//! runs through four stages; any stage can end the record early:
//!
//! ```text
//! Records ─▶ classify ─▶ fetch ─▶ thumbnail ─▶ publish
//!               │           │          │           │
//!             skip        fail       fail        fail
//! ```
//!
//! Skips are successes. Failures are collected per record and the batch
//! reports the first one; records never abort their siblings.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`dispatch`] | Notification parsing, key decoding, parallel fan-out, aggregate result |
//! | [`pipeline`] | Per-object sequencing and the pipeline error taxonomy |
//! | [`classify`] | Process-or-skip decision: reserved prefixes, extensions, existence probe |
//! | [`fetch`] | Source retrieval with length verification |
//! | [`imaging`] | Decode, flatten onto white, Lanczos3 resize, progressive JPEG encode |
//! | [`publish`] | Artifact write with cache headers and provenance metadata |
//! | [`naming`] | `thumb-` derived-key convention and recognized extensions |
//! | [`storage`] | `ObjectStore` trait, filesystem store, in-memory store |
//! | [`config`] | `thumbnailer.toml` loading, validation, environment overlay |
//! | [`output`] | CLI output formatting for progress and results |
//!
//! # Design Decisions
//!
//! ## Idempotence Without Coordination
//!
//! The derived key is a pure function of the source key, the encoder is
//! deterministic, and writes are whole-object overwrites. Redelivered or
//! concurrent notifications therefore converge on identical bytes, and the
//! existence probe is only an optimization: it saves the fetch and encode,
//! not correctness.
//!
//! ## Loop Prevention
//!
//! Artifacts may land in a bucket that itself emits notifications. Keys with
//! a reserved prefix (`thumb-`, and the legacy `resized-`) are never
//! processed, and an object whose metadata carries `thumbnail-created = true`
//! is skipped even under an unexpected key.
//!
//! ## Injected Storage
//!
//! No component reaches for a global client. The [`storage::ObjectStore`]
//! trait is passed by reference, which keeps invocations stateless and lets
//! the same pipeline run against the filesystem, memory, or a remote store.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding uses the `image` crate; encoding uses `jpeg-encoder` for
//! progressive output with optimized Huffman tables. No system libraries.

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod storage;
