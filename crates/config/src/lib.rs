//! Configuration loading, validation, env substitution and overrides.
//!
//! Config files: `docbridge.toml`, `docbridge.yaml` or `docbridge.json`,
//! searched in `./` then `~/.config/docbridge/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file text.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{DocbridgeConfig, FetchConfig, MetricsConfig, ProtocolConfig, ViewerConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
