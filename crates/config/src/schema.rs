/// Config schema types (viewer, protocol, fetch, metrics).
use std::{collections::BTreeMap, time::Duration};

use {
    docbridge_protocol::{DEFAULT_NOISE_PATTERNS, MAX_MESSAGE_BYTES},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocbridgeConfig {
    pub viewer: ViewerConfig,
    pub protocol: ProtocolConfig,
    pub fetch: FetchConfig,
    pub metrics: MetricsConfig,
}

/// Viewer session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Running inside a native shell: announce `READY` after startup.
    pub embedded: bool,
    /// Delay before the `READY` announcement, giving the host time to attach
    /// its listener.
    pub ready_settle_ms: u64,
    /// Force a request into `Error` when acquisition or processing takes
    /// longer than this. Unset means wait indefinitely.
    pub request_timeout_ms: Option<u64>,
    /// Identifier of the surface the word renderer mounts into.
    pub mount_target: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            embedded: true,
            ready_settle_ms: 500,
            request_timeout_ms: None,
            mount_target: "document-viewer".into(),
        }
    }
}

impl ViewerConfig {
    #[must_use]
    pub fn ready_settle(&self) -> Duration {
        Duration::from_millis(self.ready_settle_ms)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Envelope decoding limits and the channel noise allowlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub noise_patterns: Vec<String>,
    pub max_message_bytes: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            noise_patterns: DEFAULT_NOISE_PATTERNS
                .iter()
                .map(|p| (*p).to_owned())
                .collect(),
            max_message_bytes: MAX_MESSAGE_BYTES,
        }
    }
}

/// HTTP client settings for `fileUrl` acquisition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Overrides the default `docbridge/<version>` user agent.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Labels attached to every exported series.
    pub labels: BTreeMap<String, String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: DocbridgeConfig = toml::from_str("").unwrap();
        assert!(cfg.viewer.embedded);
        assert_eq!(cfg.viewer.ready_settle(), Duration::from_millis(500));
        assert_eq!(cfg.viewer.request_timeout(), None);
        assert_eq!(cfg.protocol.max_message_bytes, MAX_MESSAGE_BYTES);
        assert!(cfg.protocol.noise_patterns.iter().any(|p| p == "setImmediate"));
        assert!(!cfg.metrics.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: DocbridgeConfig = toml::from_str(
            r#"
            [viewer]
            embedded = false
            request_timeout_ms = 15000

            [fetch]
            user_agent = "acme-viewer"
            "#,
        )
        .unwrap();
        assert!(!cfg.viewer.embedded);
        assert_eq!(cfg.viewer.ready_settle_ms, 500);
        assert_eq!(
            cfg.viewer.request_timeout(),
            Some(Duration::from_secs(15))
        );
        assert_eq!(cfg.fetch.timeout_secs, 30);
        assert_eq!(cfg.fetch.user_agent.as_deref(), Some("acme-viewer"));
    }
}
