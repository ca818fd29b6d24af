mod config_commands;
mod document_commands;
mod stdio;

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    docbridge_config::DocbridgeConfig,
    docbridge_metrics::{MetricsHandle, MetricsRecorderConfig},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "docbridge", about = "Embedded document viewer bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the standard locations.
    #[arg(long, global = true, env = "DOCBRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Act as the viewer behind a stdio host channel: one JSON envelope per
    /// line on stdin, status envelopes on stdout.
    Serve {
        /// Do not announce READY on startup.
        #[arg(long)]
        standalone: bool,
    },
    /// Load a single document and print the final state.
    Open {
        /// Local file, document URL, or viewer page URL carrying `fileUrl`.
        source: String,
        /// File name used for classification (defaults to the source's).
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the processor kind for each file name.
    Classify {
        #[arg(required = true)]
        file_names: Vec<String>,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Logs go to stderr; stdout carries the host channel.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Explicit `--config` must load; otherwise discovery falls back to
/// defaults. Environment overrides apply last.
pub(crate) fn resolve_config(explicit: Option<&PathBuf>) -> anyhow::Result<DocbridgeConfig> {
    let config = match explicit {
        Some(path) => docbridge_config::load_config(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => docbridge_config::discover_and_load(),
    };
    Ok(docbridge_config::apply_env_overrides(config))
}

fn init_metrics(config: &DocbridgeConfig) -> anyhow::Result<MetricsHandle> {
    let handle = docbridge_metrics::init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: config
            .metrics
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })?;
    Ok(handle)
}

fn dump_metrics(handle: &MetricsHandle) {
    let rendered = handle.render();
    if !rendered.is_empty() {
        eprintln!("{rendered}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "docbridge starting");

    match cli.command {
        Commands::Serve { standalone } => {
            let config = resolve_config(cli.config.as_ref())?;
            let metrics = init_metrics(&config)?;
            info!(embedded = config.viewer.embedded && !standalone, "serving on stdio");
            document_commands::serve(&config, standalone).await?;
            dump_metrics(&metrics);
            Ok(())
        },
        Commands::Open { source, name } => {
            let config = resolve_config(cli.config.as_ref())?;
            let metrics = init_metrics(&config)?;
            let ok = document_commands::open(&config, &source, name).await?;
            dump_metrics(&metrics);
            if !ok {
                std::process::exit(1);
            }
            Ok(())
        },
        Commands::Classify { file_names } => {
            document_commands::classify(&file_names);
            Ok(())
        },
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_ref())
        },
    }
}
