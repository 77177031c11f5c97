use std::path::Path;

use anyhow::Result;
use label_splitter::{PrepConfig, run};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => PrepConfig::from_file(Path::new(&path))?,
        None => PrepConfig::default(),
    };

    let report = run(&config).inspect_err(|e| log::error!("failed to process train data: {e:#}"))?;

    log::info!("processed files:");
    for path in [&report.features_path, &report.target_path, &report.identifier_path]
        .into_iter()
        .flatten()
    {
        log::info!("  {}", path.display());
    }
    if !report.diagnostics.is_empty() {
        log::warn!("finished with {} warning(s)", report.diagnostics.len());
    }
    Ok(())
}
