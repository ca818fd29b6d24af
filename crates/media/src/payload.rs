use {bytes::Bytes, serde::Serialize};

use crate::{
    error::{Error, Result},
    format::{ProcessorKind, classify},
};

/// Where a document's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A file picked locally.
    Upload,
    /// Fetched from `fileUrl`.
    Url,
    /// Delivered inline over the host channel.
    Channel,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Url => "url",
            Self::Channel => "channel",
        }
    }
}

/// Raw document bytes plus the name they were delivered under.
///
/// Both fields are non-empty; the value is immutable once built.
#[derive(Clone)]
pub struct DocumentPayload {
    bytes: Bytes,
    file_name: String,
    source: SourceKind,
}

impl DocumentPayload {
    pub fn new(
        bytes: impl Into<Bytes>,
        file_name: impl Into<String>,
        source: SourceKind,
    ) -> Result<Self> {
        let bytes = bytes.into();
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(Error::EmptyFileName);
        }
        if bytes.is_empty() {
            return Err(Error::EmptyDocument { file_name });
        }
        Ok(Self {
            bytes,
            file_name,
            source,
        })
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn source(&self) -> SourceKind {
        self.source
    }

    #[must_use]
    pub fn kind(&self) -> ProcessorKind {
        classify(&self.file_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for DocumentPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPayload")
            .field("file_name", &self.file_name)
            .field("source", &self.source)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_bytes() {
        let err = DocumentPayload::new(Vec::new(), "a.docx", SourceKind::Channel).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument { ref file_name } if file_name == "a.docx"));
    }

    #[test]
    fn rejects_blank_file_name() {
        let err = DocumentPayload::new(vec![1, 2, 3], " ", SourceKind::Upload).unwrap_err();
        assert!(matches!(err, Error::EmptyFileName));
    }

    #[test]
    fn classifies_from_file_name() {
        let payload = DocumentPayload::new(vec![0x50, 0x4b], "Q3.XLSX", SourceKind::Url).unwrap();
        assert_eq!(payload.kind(), ProcessorKind::Excel);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.source().as_str(), "url");
    }
}
