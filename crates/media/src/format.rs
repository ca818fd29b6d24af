//! File-name based format classification.

use serde::{Deserialize, Serialize};

/// Renderer family a document is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    Word,
    Excel,
    PowerPoint,
    Unknown,
}

impl ProcessorKind {
    /// Every kind that has a renderer.
    pub const RENDERABLE: [Self; 3] = [Self::Word, Self::Excel, Self::PowerPoint];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Excel => "excel",
            Self::PowerPoint => "powerpoint",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text after the last `.` of `file_name`, if there is a dot at all.
#[must_use]
pub fn extension(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Map a file name to the processor that renders it.
#[must_use]
pub fn classify(file_name: &str) -> ProcessorKind {
    let Some(ext) = extension(file_name) else {
        return ProcessorKind::Unknown;
    };
    match ext.to_ascii_lowercase().as_str() {
        "docx" | "doc" => ProcessorKind::Word,
        "xlsx" | "xls" => ProcessorKind::Excel,
        "pptx" | "ppt" => ProcessorKind::PowerPoint,
        _ => ProcessorKind::Unknown,
    }
}
