//! Document intake: base64, URL and upload acquisition, payload model, and
//! file-name based format classification.

pub mod acquire;
pub mod error;
pub mod format;
pub mod payload;

pub use {
    acquire::{Acquirer, DocumentSource, FetchOptions, from_base64, from_path, from_url},
    error::{Error, Result},
    format::{ProcessorKind, classify, extension},
    payload::{DocumentPayload, SourceKind},
};
