use std::process::ExitCode;

use anyhow::Result;
use rive_cache::logging::{ensure_log_error, init_logging};
use rive_cache::runtime::fs::FsRuntime;
use rive_cache::{FileCache, RiveFileParams};

use output::FileReport;
use settings::{OutputFormat, Settings};

mod output;
mod settings;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            ensure_log_error(&error);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let Settings {
        config,
        sources,
        output_format,
    } = Settings::get()?;
    init_logging(&config);

    let cache = FileCache::new(FsRuntime::from_config(&config));
    tracing::debug!(base_dir = %cache.runtime().base_dir().display(), "Loading {} Rive files", sources.len());

    // Start all loads before waiting on any of them.
    let loads: Vec<_> = sources
        .iter()
        .map(|src| {
            let params = RiveFileParams::src(src.as_str());
            let watch = cache.load_file(&params);
            (src, params, watch)
        })
        .collect();

    let mut reports = Vec::with_capacity(loads.len());
    for (src, _, watch) in &loads {
        let state = watch.settled().await;
        reports.push(FileReport::new(src, &state));
    }

    match output_format {
        OutputFormat::Json => output::print_json(&reports)?,
        OutputFormat::Compact => output::print_compact(&reports),
    }

    for (_, params, _) in &loads {
        cache.release_file(params);
    }
    if !cache.is_empty() {
        tracing::warn!(remaining = cache.len(), "Rive files still cached after release");
    }
    cache.clear_cache();

    let failed = reports.iter().filter(|report| report.failed()).count();
    if failed > 0 {
        tracing::error!("{failed} of {} Rive files failed to load", reports.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
