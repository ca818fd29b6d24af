use {async_trait::async_trait, docbridge_media::ProcessorKind, serde::Serialize};

// ── Mount target ────────────────────────────────────────────────────────────

/// Presentation-layer surface the word renderer draws into.
///
/// Lent by reference for a single [`DocumentProcessor::process`] call;
/// processors must not keep anything derived from it afterwards.
#[derive(Debug)]
pub struct MountTarget {
    id: String,
}

impl MountTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

// ── Results ─────────────────────────────────────────────────────────────────

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// A named sheet: ordered rows of ordered cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

/// Spreadsheet processor output, sheets in workbook order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// What a processor produced for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessedResult {
    /// The document was rendered into the mount target with this id.
    Mounted { target: String },
    /// Parsed spreadsheet contents.
    Workbook(Workbook),
    /// The processor accepted the bytes without producing output.
    Acknowledged,
}

// ── Processor trait ─────────────────────────────────────────────────────────

/// Failure raised by a processor, carrying only its message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProcessorFailure {
    pub message: String,
}

impl ProcessorFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A format-specific renderer. Implementations live with the presentation
/// layer; the built-ins in [`crate::builtin`] cover hosts without one.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Kind of document this processor handles.
    fn kind(&self) -> ProcessorKind;

    /// Human-readable processor name, used in logs.
    fn name(&self) -> &str;

    /// Render or parse `bytes`. `mount` is only meaningful to the word
    /// renderer.
    async fn process(
        &self,
        bytes: &[u8],
        mount: &MountTarget,
    ) -> Result<ProcessedResult, ProcessorFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workbook_lookup_preserves_order() {
        let workbook = Workbook {
            sheets: vec![
                Sheet {
                    name: "Summary".into(),
                    rows: vec![vec![CellValue::Text("total".into()), CellValue::Number(3.0)]],
                },
                Sheet {
                    name: "Raw".into(),
                    rows: vec![vec![CellValue::Bool(true), CellValue::Empty]],
                },
            ],
        };
        assert_eq!(workbook.sheet_names(), vec!["Summary", "Raw"]);
        assert_eq!(
            workbook.sheet("Raw").map(|s| s.rows[0][0].clone()),
            Some(CellValue::Bool(true))
        );
        assert!(workbook.sheet("Missing").is_none());
    }
}
