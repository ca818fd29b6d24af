//! Wire encoding and decoding of [`ProtocolMessage`] frames.

use serde_json::{Map, Value};

use crate::{
    DEFAULT_NOISE_PATTERNS, MAX_MESSAGE_BYTES, ProtocolMessage,
    error::{DecodeError, Result},
    message_types,
};

/// Keys that only ever appear on document-carrying frames.
const DOCUMENT_FIELDS: &[&str] = &["fileData", "fileName"];

/// Outcome of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Message(ProtocolMessage),
    /// Recognised channel chatter; callers drop it without reporting.
    Noise,
}

// ── Noise filter ─────────────────────────────────────────────────────────────

/// Substring allowlist for chatter that shares the host channel.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    patterns: Vec<String>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_PATTERNS.iter().copied())
    }
}

impl NoiseFilter {
    /// Build a filter; blank patterns are discarded.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.trim().is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        self.patterns.iter().any(|p| raw.contains(p.as_str()))
    }

    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

// ── Codec ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EnvelopeCodec {
    noise: NoiseFilter,
    max_message_bytes: usize,
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new(NoiseFilter::default(), MAX_MESSAGE_BYTES)
    }
}

impl EnvelopeCodec {
    #[must_use]
    pub fn new(noise: NoiseFilter, max_message_bytes: usize) -> Self {
        Self {
            noise,
            max_message_bytes,
        }
    }

    /// Decode one raw frame.
    ///
    /// A well-formed envelope always decodes to [`Decoded::Message`]. Anything
    /// else is [`Decoded::Noise`] when it matches the noise filter or carries
    /// no sign of being a protocol message, and a [`DecodeError`] when it
    /// looks like a deliberate but malformed envelope. Oversized frames are
    /// rejected unless they match the noise filter.
    pub fn decode(&self, raw: &str) -> Result<Decoded> {
        if raw.len() > self.max_message_bytes {
            if self.noise.matches(raw) {
                return Ok(Decoded::Noise);
            }
            return Err(DecodeError::TooLarge {
                size: raw.len(),
                limit: self.max_message_bytes,
            });
        }

        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(Value::Object(map)) => self.decode_object(raw, map),
            // Bare strings, numbers and arrays are never envelopes.
            Ok(_) => Ok(Decoded::Noise),
            Err(e) => self.decode_text(raw, &e),
        }
    }

    fn decode_object(&self, raw: &str, map: Map<String, Value>) -> Result<Decoded> {
        let tag = map.get("type").and_then(Value::as_str).map(str::to_owned);

        let Some(tag) = tag.filter(|t| message_types::is_known(t)) else {
            if DOCUMENT_FIELDS.iter().any(|k| map.contains_key(*k)) {
                let found = match map.get("type") {
                    None => "missing".to_owned(),
                    Some(other) => other.to_string(),
                };
                return self.noise_or(raw, DecodeError::MissingType { found });
            }
            return Ok(Decoded::Noise);
        };

        let message = match serde_json::from_value::<ProtocolMessage>(Value::Object(map)) {
            Ok(message) => message,
            Err(e) => return self.noise_or(raw, DecodeError::invalid_envelope(tag, e)),
        };

        match validate(message) {
            Ok(message) => Ok(Decoded::Message(message)),
            Err(e) => self.noise_or(raw, e),
        }
    }

    fn decode_text(&self, raw: &str, parse_error: &serde_json::Error) -> Result<Decoded> {
        if self.noise.matches(raw) {
            return Ok(Decoded::Noise);
        }
        match message_types::ALL.iter().find(|t| raw.contains(**t)) {
            Some(tag) => Err(DecodeError::syntax(*tag, parse_error)),
            None => Ok(Decoded::Noise),
        }
    }

    fn noise_or(&self, raw: &str, error: DecodeError) -> Result<Decoded> {
        if self.noise.matches(raw) {
            Ok(Decoded::Noise)
        } else {
            Err(error)
        }
    }
}

fn validate(message: ProtocolMessage) -> Result<ProtocolMessage> {
    if let ProtocolMessage::LoadDocument { file_name, .. } = &message
        && file_name.trim().is_empty()
    {
        return Err(DecodeError::EmptyField {
            message_type: message_types::LOAD_DOCUMENT.to_owned(),
            field: "fileName",
        });
    }
    Ok(message)
}

/// Encode a message to its wire form.
#[must_use]
pub fn encode(message: &ProtocolMessage) -> String {
    // Only string fields under string keys, so serialization cannot fail.
    serde_json::to_string(message).unwrap_or_default()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn codec() -> EnvelopeCodec {
        EnvelopeCodec::default()
    }

    #[rstest]
    #[case(ProtocolMessage::Ready)]
    #[case(ProtocolMessage::Loaded { file_name: "quarterly report.xlsx".into() })]
    #[case(ProtocolMessage::WebError { message: "failed: \"quoted\" \n newline".into() })]
    fn outbound_messages_survive_the_wire(#[case] message: ProtocolMessage) {
        let decoded = codec().decode(&encode(&message)).unwrap();
        assert_eq!(decoded, Decoded::Message(message));
    }

    #[test]
    fn decodes_load_document() {
        let raw = r#"{"type":"LOAD_DOCUMENT","fileData":"UEsDBA==","fileName":"a.xlsx"}"#;
        assert_eq!(
            codec().decode(raw).unwrap(),
            Decoded::Message(ProtocolMessage::LoadDocument {
                file_data: "UEsDBA==".into(),
                file_name: "a.xlsx".into(),
            })
        );
    }

    #[test]
    fn ignores_unknown_fields_on_known_types() {
        let raw = r#"{"type":"LOADED","fileName":"a.doc","extra":true}"#;
        assert!(matches!(
            codec().decode(raw).unwrap(),
            Decoded::Message(ProtocolMessage::Loaded { .. })
        ));
    }

    #[rstest]
    #[case("setImmediate is not defined")]
    #[case(r#"{"source":"react-devtools","payload":{"event":"setTimeout"}}"#)]
    #[case(r#"{"type":"LOAD_DOCUMENT","fileName":"a.doc","trace":"setImmediate"}"#)]
    fn noise_patterns_are_dropped(#[case] raw: &str) {
        assert_eq!(codec().decode(raw).unwrap(), Decoded::Noise);
    }

    #[rstest]
    #[case(r#"{"type":"PING"}"#)]
    #[case(r#"{"hello":"world"}"#)]
    #[case("[1,2,3]")]
    #[case("\"just a string\"")]
    #[case("plain console chatter")]
    #[case("")]
    fn unrelated_traffic_is_noise(#[case] raw: &str) {
        assert_eq!(codec().decode(raw).unwrap(), Decoded::Noise);
    }

    #[test]
    fn known_type_with_missing_field_is_an_error() {
        let err = codec()
            .decode(r#"{"type":"LOAD_DOCUMENT","fileName":"a.doc"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidEnvelope { .. }));
        assert!(err.to_string().contains("fileData"));
    }

    #[test]
    fn known_type_with_wrong_field_type_is_an_error() {
        let err = codec()
            .decode(r#"{"type":"LOAD_DOCUMENT","fileData":42,"fileName":"a.doc"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidEnvelope { .. }));
    }

    #[test]
    fn empty_file_name_is_an_error() {
        let err = codec()
            .decode(r#"{"type":"LOAD_DOCUMENT","fileData":"AA==","fileName":"  "}"#)
            .unwrap_err();
        assert_eq!(err, DecodeError::EmptyField {
            message_type: "LOAD_DOCUMENT".into(),
            field: "fileName",
        });
    }

    #[test]
    fn document_fields_without_type_are_an_error() {
        let err = codec()
            .decode(r#"{"fileData":"AA==","fileName":"a.doc"}"#)
            .unwrap_err();
        assert_eq!(err, DecodeError::MissingType {
            found: "missing".into()
        });

        let err = codec()
            .decode(r#"{"type":"LOAD","fileData":"AA==","fileName":"a.doc"}"#)
            .unwrap_err();
        assert_eq!(err, DecodeError::MissingType {
            found: "\"LOAD\"".into()
        });
    }

    #[test]
    fn truncated_envelope_is_a_syntax_error() {
        let err = codec()
            .decode(r#"{"type":"LOAD_DOCUMENT","fileData":"AA"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::Syntax { ref message_type, .. } if message_type == "LOAD_DOCUMENT"));
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let codec = EnvelopeCodec::new(NoiseFilter::default(), 16);
        let err = codec
            .decode(r#"{"type":"READY","padding":"xxxxxxxx"}"#)
            .unwrap_err();
        assert!(matches!(err, DecodeError::TooLarge { limit: 16, .. }));
    }

    #[rstest]
    #[case(format!("setImmediate {}", "x".repeat(64)))]
    #[case(format!(r#"{{"source":"devtools","event":"setTimeout","pad":"{}"}}"#, "x".repeat(64)))]
    #[case(format!("{} webpackHotUpdate", "LOAD_DOCUMENT ".repeat(8)))]
    fn oversized_noise_is_still_noise(#[case] raw: String) {
        let codec = EnvelopeCodec::new(NoiseFilter::default(), 32);
        assert!(raw.len() > 32);
        assert_eq!(codec.decode(&raw).unwrap(), Decoded::Noise);
    }

    #[test]
    fn custom_noise_filter_replaces_defaults() {
        let codec = EnvelopeCodec::new(NoiseFilter::new(["[HMR]", " "]), MAX_MESSAGE_BYTES);
        assert_eq!(codec.decode("[HMR] connected").unwrap(), Decoded::Noise);
        // Defaults no longer apply, but the text still names no message type.
        assert_eq!(codec.decode("setImmediate").unwrap(), Decoded::Noise);
        assert!(codec.decode("LOAD_DOCUMENT {").is_err());
    }

    #[test]
    fn decode_errors_read_as_malformed_messages() {
        let err = codec().decode("LOAD_DOCUMENT oops").unwrap_err();
        assert!(err.to_string().starts_with("malformed protocol message"));
    }
}
