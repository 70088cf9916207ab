//! A reachability-sweeping, deduplicating, linearizing PDF document
//! serializer. Given an in-memory [`Document`] (a numbered object table
//! plus a trailer), [`save`] emits a byte-exact PDF file, optionally
//! garbage-collected, deduplicated, linearized for web viewing, or
//! appended as an incremental update.
//!
//! This crate does not parse PDF files, interpret content streams, decode
//! images or fonts, perform cryptographic signing, or implement general
//! compression codecs — those remain the caller's collaborators. It also
//! does not rebalance page trees, encrypt, or render.

pub mod classify;
pub mod config;
pub mod dedupe;
pub mod document;
pub mod error;
pub mod finalize;
pub mod hints;
pub mod linearize;
pub mod object;
pub mod orchestrator;
pub mod renumber;
pub mod sweep;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ExpandPolicy, GarbageLevel, SaveOptions};
pub use document::{Document, ObjectSource, Trailer, XrefEntry};
pub use error::{PdfWriteError, Result};
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use orchestrator::save;
