use std::path::Path;

use {
    anyhow::{Result, bail},
    docbridge_config::DocbridgeConfig,
    docbridge_media::{ProcessorKind, classify as classify_name},
    docbridge_processors::{ContainerProbe, ProcessedResult, ProcessorRegistry},
    docbridge_viewer::{LaunchParams, LoadState, ViewerBuilder, ViewerSettings},
    tracing::info,
};

use crate::stdio::{StdoutChannel, spawn_stdin_reader};

/// Without a presentation layer the word and spreadsheet slots only check
/// that the bytes are an office container.
fn registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::with_defaults();
    registry.register(Box::new(ContainerProbe::new(ProcessorKind::Word)));
    registry.register(Box::new(ContainerProbe::new(ProcessorKind::Excel)));
    registry
}

pub async fn serve(config: &DocbridgeConfig, standalone: bool) -> Result<()> {
    let mut settings = ViewerSettings::from(&config.viewer);
    settings.embedded &= !standalone;

    let viewer = ViewerBuilder::from_config(config)
        .settings(settings)
        .registry(registry())
        .channel(StdoutChannel)
        .build()?;

    let announcer = viewer.start();
    viewer.run(spawn_stdin_reader()).await;

    // Let the last request finish before exiting.
    if let Some(request) = viewer.latest_request() {
        let state = viewer.settled(request).await;
        info!(%state, "final state");
    }
    if let Some(announcer) = announcer {
        announcer.abort();
    }
    Ok(())
}

/// Returns whether the document loaded.
pub async fn open(config: &DocbridgeConfig, source: &str, name: Option<String>) -> Result<bool> {
    let mut settings = ViewerSettings::from(&config.viewer);
    settings.embedded = false;

    let viewer = ViewerBuilder::from_config(config)
        .settings(settings)
        .registry(registry())
        .build()?;

    let request = if source.starts_with("http://") || source.starts_with("https://") {
        let params = match LaunchParams::from_page_url(source)? {
            Some(mut params) => {
                if let Some(name) = name {
                    params.file_name = name;
                }
                params
            },
            None => LaunchParams::new(source, name)?,
        };
        viewer.load_launch(params)
    } else {
        let path = Path::new(source);
        let file_name = match name {
            Some(name) => name,
            None => match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_owned(),
                None => bail!("cannot derive a file name from {source}; pass --name"),
            },
        };
        viewer.load_upload(path, file_name)
    };

    let state = viewer.settled(request).await;
    println!("{state}");
    if let LoadState::Ready { output, .. } = &state {
        describe_output(output);
    }
    Ok(matches!(state, LoadState::Ready { .. }))
}

fn describe_output(output: &ProcessedResult) {
    match output {
        ProcessedResult::Mounted { target } => println!("  mounted into '{target}'"),
        ProcessedResult::Workbook(workbook) => {
            for sheet in &workbook.sheets {
                println!("  sheet '{}': {} row(s)", sheet.name, sheet.rows.len());
            }
        },
        ProcessedResult::Acknowledged => println!("  acknowledged"),
    }
}

pub fn classify(file_names: &[String]) {
    for name in file_names {
        println!("{name}\t{}", classify_name(name));
    }
}
