//! Semantic checks on a loaded [`DocbridgeConfig`].

use crate::schema::DocbridgeConfig;

/// Settle delays beyond this are almost certainly a unit mistake.
const MAX_REASONABLE_SETTLE_MS: u64 = 10_000;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "viewer.request_timeout_ms"
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_owned(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &DocbridgeConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let viewer = &config.viewer;
    if viewer.ready_settle_ms > MAX_REASONABLE_SETTLE_MS {
        result.push(
            Severity::Warning,
            "viewer.ready_settle_ms",
            format!(
                "{} ms delays READY noticeably; values are milliseconds",
                viewer.ready_settle_ms
            ),
        );
    }
    if viewer.request_timeout_ms == Some(0) {
        result.push(
            Severity::Error,
            "viewer.request_timeout_ms",
            "must be positive; omit it to wait indefinitely",
        );
    }
    if viewer.mount_target.trim().is_empty() {
        result.push(Severity::Error, "viewer.mount_target", "must not be empty");
    }

    let protocol = &config.protocol;
    if protocol.max_message_bytes == 0 {
        result.push(
            Severity::Error,
            "protocol.max_message_bytes",
            "must be positive",
        );
    }
    for (i, pattern) in protocol.noise_patterns.iter().enumerate() {
        if pattern.trim().is_empty() {
            result.push(
                Severity::Warning,
                &format!("protocol.noise_patterns[{i}]"),
                "blank pattern is ignored",
            );
        }
    }

    if config.fetch.timeout_secs == 0 {
        result.push(Severity::Error, "fetch.timeout_secs", "must be positive");
    }

    if config.metrics.labels.keys().any(|k| k.trim().is_empty()) {
        result.push(Severity::Error, "metrics.labels", "label keys must not be empty");
    }

    result.diagnostics.sort_by_key(|d| d.severity);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_clean() {
        let result = validate(&DocbridgeConfig::default());
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn reports_each_problem_errors_first() {
        let mut cfg = DocbridgeConfig::default();
        cfg.viewer.ready_settle_ms = 60_000;
        cfg.viewer.request_timeout_ms = Some(0);
        cfg.protocol.noise_patterns.push("  ".into());
        cfg.fetch.timeout_secs = 0;

        let result = validate(&cfg);
        assert!(result.has_errors());
        assert_eq!(result.count(Severity::Error), 2);
        assert_eq!(result.count(Severity::Warning), 2);
        assert_eq!(result.diagnostics[0].severity, Severity::Error);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path.starts_with("protocol.noise_patterns["))
        );
    }

    #[test]
    fn diagnostics_render_with_path() {
        let mut cfg = DocbridgeConfig::default();
        cfg.viewer.mount_target = String::new();
        let result = validate(&cfg);
        assert_eq!(
            result.diagnostics[0].to_string(),
            "error: viewer.mount_target: must not be empty"
        );
    }
}
