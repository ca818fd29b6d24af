use std::{error::Error as StdError, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document data is not valid base64.
    #[error("failed to decode document data: {reason}")]
    Decode { reason: String },

    /// Decoding succeeded but produced no bytes.
    #[error("document '{file_name}' is empty")]
    EmptyDocument { file_name: String },

    #[error("document file name is empty")]
    EmptyFileName,

    /// URL acquisition failed: bad URL, transport error or non-success status.
    #[error("failed to fetch document from {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn decode(reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn network(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether the failure came from the network path.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
