//! Format-specific document processors and the dispatch pipeline.
//!
//! Each renderer (word, spreadsheet, presentation) implements
//! [`DocumentProcessor`]. The [`ProcessorRegistry`] maps a
//! [`ProcessorKind`](docbridge_media::ProcessorKind) to its processor and the
//! [`Dispatcher`] routes a payload to it, normalizing every outcome into this
//! crate's [`Error`].

pub mod builtin;
pub mod dispatch;
pub mod error;
pub mod processor;
pub mod registry;

pub use {
    builtin::{ContainerProbe, PresentationAck},
    dispatch::Dispatcher,
    error::{Error, Result},
    processor::{
        CellValue, DocumentProcessor, MountTarget, ProcessedResult, ProcessorFailure, Sheet,
        Workbook,
    },
    registry::ProcessorRegistry,
};
