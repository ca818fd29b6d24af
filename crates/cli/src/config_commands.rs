use std::path::PathBuf;

use {anyhow::Result, clap::Subcommand};

use docbridge_config::{
    find_config_file,
    validate::{self, Severity},
};

use crate::resolve_config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file, then env overrides) as TOML.
    Show,
    /// Validate the configuration and report errors/warnings.
    Check,
}

pub fn handle_config(action: ConfigAction, explicit: Option<&PathBuf>) -> Result<()> {
    match action {
        ConfigAction::Show => show(explicit),
        ConfigAction::Check => check(explicit),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn show(explicit: Option<&PathBuf>) -> Result<()> {
    let config = resolve_config(explicit)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn check(explicit: Option<&PathBuf>) -> Result<()> {
    let path = explicit.cloned().or_else(find_config_file);
    match &path {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let config = resolve_config(path.as_ref())?;
    let result = validate::validate(&config);

    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !result.diagnostics.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
