use docbridge_media::ProcessorKind;

/// Crate-wide result type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed dispatch errors. Processor failures never escape unwrapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The file name does not map to any processor.
    #[error("unsupported document format: {}", describe_extension(.file_name, .extension.as_deref()))]
    UnsupportedFormat {
        file_name: String,
        extension: Option<String>,
    },

    /// The processor for `kind` failed, or none is registered.
    #[error("failed to process {kind} document: {message}")]
    Processing {
        kind: ProcessorKind,
        message: String,
    },
}

fn describe_extension(file_name: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("'.{ext}' ({file_name})"),
        None => format!("'{file_name}' has no extension"),
    }
}

impl Error {
    #[must_use]
    pub fn unsupported(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let extension = docbridge_media::extension(&file_name).map(str::to_owned);
        Self::UnsupportedFormat {
            file_name,
            extension,
        }
    }

    #[must_use]
    pub fn processing(kind: ProcessorKind, message: impl std::fmt::Display) -> Self {
        Self::Processing {
            kind,
            message: message.to_string(),
        }
    }
}
