use std::time::Duration;

/// Crate-wide result type for viewer setup.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP client for URL acquisition could not be built.
    #[error(transparent)]
    Media(#[from] docbridge_media::Error),

    /// The page URL could not be turned into a document request.
    #[error("invalid launch url '{url}': {reason}")]
    InvalidLaunchUrl { url: String, reason: String },

    /// The viewer was built outside a Tokio runtime and given no handle.
    #[error("no Tokio runtime to run load requests on; build inside one or pass a handle")]
    NoRuntime,
}

impl Error {
    #[must_use]
    pub fn invalid_launch_url(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidLaunchUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

// ── Load failures ───────────────────────────────────────────────────────────

/// Broad class of a failed load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// Inline document data was not valid base64, or decoded to nothing.
    Decode,
    /// The document URL could not be fetched.
    Network,
    /// A locally picked file could not be read.
    Read,
    UnsupportedFormat,
    Processing,
    TimedOut,
}

impl FailureCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Network => "network",
            Self::Read => "read",
            Self::UnsupportedFormat => "unsupported_format",
            Self::Processing => "processing",
            Self::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request ended in `Error`. The message is what the host sees in
/// `WEB_ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoadFailure {
    pub category: FailureCategory,
    pub message: String,
}

impl LoadFailure {
    #[must_use]
    pub fn new(category: FailureCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timed_out(phase: &str, limit: Duration) -> Self {
        Self::new(
            FailureCategory::TimedOut,
            format!("timed out after {} ms while {phase}", limit.as_millis()),
        )
    }
}

impl From<&docbridge_media::Error> for LoadFailure {
    fn from(err: &docbridge_media::Error) -> Self {
        use docbridge_media::Error as E;

        let category = match err {
            E::Decode { .. } | E::EmptyDocument { .. } | E::EmptyFileName => {
                FailureCategory::Decode
            },
            E::Network { .. } | E::External { .. } => FailureCategory::Network,
            E::Io { .. } => FailureCategory::Read,
        };
        Self::new(category, err.to_string())
    }
}

impl From<&docbridge_processors::Error> for LoadFailure {
    fn from(err: &docbridge_processors::Error) -> Self {
        use docbridge_processors::Error as E;

        let category = match err {
            E::UnsupportedFormat { .. } => FailureCategory::UnsupportedFormat,
            E::Processing { .. } => FailureCategory::Processing,
        };
        Self::new(category, err.to_string())
    }
}
