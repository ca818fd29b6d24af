use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::DocbridgeConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "docbridge.toml",
    "docbridge.yaml",
    "docbridge.yml",
    "docbridge.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<DocbridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./docbridge.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/docbridge/docbridge.{toml,yaml,yml,json}` (user-global)
///
/// Returns `DocbridgeConfig::default()` if no config file is found or the
/// one found cannot be parsed.
pub fn discover_and_load() -> DocbridgeConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    DocbridgeConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/docbridge/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "docbridge").map(|d| d.config_dir().to_path_buf())
}

/// Apply `DOCBRIDGE_*` environment overrides on top of a loaded config.
///
/// Recognised: `DOCBRIDGE_EMBEDDED`, `DOCBRIDGE_READY_SETTLE_MS`,
/// `DOCBRIDGE_REQUEST_TIMEOUT_MS`. Unparseable values are ignored with a
/// warning.
pub fn apply_env_overrides(config: DocbridgeConfig) -> DocbridgeConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: DocbridgeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> DocbridgeConfig {
    if let Some(value) = lookup("DOCBRIDGE_EMBEDDED") {
        match parse_bool(&value) {
            Some(embedded) => config.viewer.embedded = embedded,
            None => warn!(%value, "ignoring invalid DOCBRIDGE_EMBEDDED"),
        }
    }

    if let Some(value) = lookup("DOCBRIDGE_READY_SETTLE_MS") {
        match value.trim().parse() {
            Ok(ms) => config.viewer.ready_settle_ms = ms,
            Err(_) => warn!(%value, "ignoring invalid DOCBRIDGE_READY_SETTLE_MS"),
        }
    }

    if let Some(value) = lookup("DOCBRIDGE_REQUEST_TIMEOUT_MS") {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("none") {
            config.viewer.request_timeout_ms = None;
        } else {
            match value.parse() {
                Ok(ms) => config.viewer.request_timeout_ms = Some(ms),
                Err(_) => warn!(%value, "ignoring invalid DOCBRIDGE_REQUEST_TIMEOUT_MS"),
            }
        }
    }

    config
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<DocbridgeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    fn write_config(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_toml() {
        let (_dir, path) = write_config(
            "docbridge.toml",
            "[viewer]\nembedded = false\nready_settle_ms = 250\n",
        );
        let cfg = load_config(&path).unwrap();
        assert!(!cfg.viewer.embedded);
        assert_eq!(cfg.viewer.ready_settle_ms, 250);
    }

    #[test]
    fn loads_yaml_and_json() {
        let (_dir, path) = write_config(
            "docbridge.yaml",
            "protocol:\n  noise_patterns: [\"[HMR]\"]\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.protocol.noise_patterns, vec!["[HMR]".to_string()]);

        let (_dir, path) = write_config(
            "docbridge.json",
            r#"{"metrics":{"enabled":true,"labels":{"host":"ios"}}}"#,
        );
        let cfg = load_config(&path).unwrap();
        assert!(cfg.metrics.enabled);
        assert_eq!(cfg.metrics.labels.get("host").map(String::as_str), Some("ios"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let (_dir, path) = write_config("docbridge.ini", "embedded=true");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/docbridge.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/docbridge.toml"));
    }

    #[test]
    fn env_overrides_apply_on_top_of_file() {
        let lookup = |name: &str| match name {
            "DOCBRIDGE_EMBEDDED" => Some("off".to_string()),
            "DOCBRIDGE_READY_SETTLE_MS" => Some("1000".to_string()),
            "DOCBRIDGE_REQUEST_TIMEOUT_MS" => Some("20000".to_string()),
            _ => None,
        };
        let cfg = apply_env_overrides_with(DocbridgeConfig::default(), lookup);
        assert!(!cfg.viewer.embedded);
        assert_eq!(cfg.viewer.ready_settle_ms, 1000);
        assert_eq!(cfg.viewer.request_timeout_ms, Some(20_000));
    }

    #[test]
    fn invalid_env_overrides_are_ignored() {
        let lookup = |name: &str| match name {
            "DOCBRIDGE_EMBEDDED" => Some("maybe".to_string()),
            "DOCBRIDGE_READY_SETTLE_MS" => Some("soon".to_string()),
            "DOCBRIDGE_REQUEST_TIMEOUT_MS" => Some("none".to_string()),
            _ => None,
        };
        let mut base = DocbridgeConfig::default();
        base.viewer.request_timeout_ms = Some(5);
        let cfg = apply_env_overrides_with(base, lookup);
        assert!(cfg.viewer.embedded);
        assert_eq!(cfg.viewer.ready_settle_ms, 500);
        assert_eq!(cfg.viewer.request_timeout_ms, None);
    }
}
