/// Crate-wide result type for envelope decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// A frame that looks like a protocol message but cannot be used as one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The frame exceeds the configured size limit.
    #[error("malformed protocol message: frame of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    /// Text names a message type but is not valid JSON.
    #[error("malformed protocol message: {message_type} frame is not valid JSON: {reason}")]
    Syntax {
        message_type: String,
        reason: String,
    },

    /// A known message type with missing or mistyped fields.
    #[error("malformed protocol message: invalid {message_type} envelope: {reason}")]
    InvalidEnvelope {
        message_type: String,
        reason: String,
    },

    /// A required string field is present but empty.
    #[error("malformed protocol message: {message_type} has an empty `{field}`")]
    EmptyField {
        message_type: String,
        field: &'static str,
    },

    /// Document fields without a recognised `type` tag.
    #[error("malformed protocol message: document fields present but `type` is {found}")]
    MissingType { found: String },
}

impl DecodeError {
    #[must_use]
    pub fn syntax(message_type: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Syntax {
            message_type: message_type.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_envelope(
        message_type: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidEnvelope {
            message_type: message_type.into(),
            reason: reason.to_string(),
        }
    }
}
