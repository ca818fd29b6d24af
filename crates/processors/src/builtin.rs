//! Processors that ship with the viewer.

use {async_trait::async_trait, docbridge_media::ProcessorKind, tracing::debug};

use crate::processor::{DocumentProcessor, MountTarget, ProcessedResult, ProcessorFailure};

/// Office Open XML documents are zip archives.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
/// Legacy `.doc`/`.xls`/`.ppt` files are OLE compound files.
const CFB_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Presentation renderer stand-in: acknowledges every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentationAck;

#[async_trait]
impl DocumentProcessor for PresentationAck {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::PowerPoint
    }

    fn name(&self) -> &str {
        "presentation-ack"
    }

    async fn process(
        &self,
        bytes: &[u8],
        _mount: &MountTarget,
    ) -> Result<ProcessedResult, ProcessorFailure> {
        debug!(bytes = bytes.len(), "acknowledged presentation");
        Ok(ProcessedResult::Acknowledged)
    }
}

/// Checks that the bytes are an office container (zip or compound file)
/// without rendering them. Used by hosts that have no renderer of their own.
#[derive(Debug, Clone, Copy)]
pub struct ContainerProbe {
    kind: ProcessorKind,
}

impl ContainerProbe {
    #[must_use]
    pub fn new(kind: ProcessorKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl DocumentProcessor for ContainerProbe {
    fn kind(&self) -> ProcessorKind {
        self.kind
    }

    fn name(&self) -> &str {
        "container-probe"
    }

    async fn process(
        &self,
        bytes: &[u8],
        _mount: &MountTarget,
    ) -> Result<ProcessedResult, ProcessorFailure> {
        if bytes.starts_with(ZIP_SIGNATURE) || bytes.starts_with(CFB_SIGNATURE) {
            Ok(ProcessedResult::Acknowledged)
        } else {
            Err(ProcessorFailure::new(
                "not an office document (no zip or compound file signature)",
            ))
        }
    }
}
