//! Host ↔ viewer envelope protocol.
//!
//! All communication uses JSON text frames over the host channel. Every frame
//! is an object tagged by its `type` field:
//! - `LOAD_DOCUMENT`: host → viewer, carries a base64 encoded document
//! - `READY`: viewer → host, the viewer is listening
//! - `LOADED`: viewer → host, a document finished rendering
//! - `WEB_ERROR`: viewer → host, a request failed

pub mod codec;
pub mod error;

pub use {
    codec::{Decoded, EnvelopeCodec, NoiseFilter, encode},
    error::{DecodeError, Result},
};

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// Largest inbound frame accepted by the codec (64 MiB of base64 text).
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// Diagnostics the rendering library posts on the same channel. Frames that
/// mention these are dropped instead of being reported as malformed.
pub const DEFAULT_NOISE_PATTERNS: &[&str] = &[
    "setImmediate",
    "setTimeout",
    "requestAnimationFrame",
    "queueMicrotask",
    "webpackHotUpdate",
];

// ── Message types ────────────────────────────────────────────────────────────

pub mod message_types {
    pub const LOAD_DOCUMENT: &str = "LOAD_DOCUMENT";
    pub const READY: &str = "READY";
    pub const LOADED: &str = "LOADED";
    pub const WEB_ERROR: &str = "WEB_ERROR";

    pub const ALL: &[&str] = &[LOAD_DOCUMENT, READY, LOADED, WEB_ERROR];

    #[must_use]
    pub fn is_known(tag: &str) -> bool {
        ALL.contains(&tag)
    }
}

// ── Messages ─────────────────────────────────────────────────────────────────

/// Discriminated union of every frame exchanged over the host channel.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolMessage {
    /// Host → viewer: render this document.
    #[serde(rename = "LOAD_DOCUMENT")]
    LoadDocument {
        #[serde(rename = "fileData")]
        file_data: String,
        #[serde(rename = "fileName")]
        file_name: String,
    },
    /// Viewer → host: the viewer is attached and listening.
    #[serde(rename = "READY")]
    Ready,
    /// Viewer → host: `file_name` was rendered.
    #[serde(rename = "LOADED")]
    Loaded {
        #[serde(rename = "fileName")]
        file_name: String,
    },
    /// Viewer → host: the current request failed.
    #[serde(rename = "WEB_ERROR")]
    WebError { message: String },
}

impl ProtocolMessage {
    /// Wire tag of this message.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::LoadDocument { .. } => message_types::LOAD_DOCUMENT,
            Self::Ready => message_types::READY,
            Self::Loaded { .. } => message_types::LOADED,
            Self::WebError { .. } => message_types::WEB_ERROR,
        }
    }

    /// Whether the message travels host → viewer.
    #[must_use]
    pub fn is_inbound(&self) -> bool {
        matches!(self, Self::LoadDocument { .. })
    }
}

// Document payloads can be tens of megabytes; keep them out of logs.
impl std::fmt::Debug for ProtocolMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadDocument {
                file_data,
                file_name,
            } => f
                .debug_struct("LoadDocument")
                .field("file_name", file_name)
                .field("file_data_len", &file_data.len())
                .finish(),
            Self::Ready => f.write_str("Ready"),
            Self::Loaded { file_name } => f
                .debug_struct("Loaded")
                .field("file_name", file_name)
                .finish(),
            Self::WebError { message } => {
                f.debug_struct("WebError").field("message", message).finish()
            },
        }
    }
}
