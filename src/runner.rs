use anyhow::{Context, Result};

use crate::config::ScryConfig;
use crate::core::{RepoSummary, ScanEvent};
use crate::parse::ParseCache;
use crate::summarize::{AnalyzeOptions, analyze_with_events};

/// Main entry point for the scry CLI.
///
/// Runs the analysis on a background thread, consumes progress events on
/// the calling thread when `verbose` is enabled, and writes the summary
/// as pretty-printed JSON to the configured output path.
pub fn run(config: ScryConfig, options: AnalyzeOptions) -> Result<RepoSummary> {
    let (tx, rx) = crossbeam_channel::unbounded();

    let config_clone = config.clone();
    let options_clone = options.clone();
    let handle = std::thread::spawn(move || {
        let cache = ParseCache::new();
        analyze_with_events(&config_clone, &options_clone, &cache, Some(tx))
    });

    for event in rx {
        match event {
            ScanEvent::StartScanning => {
                if config.verbose {
                    println!("Scanning started...")
                }
            }
            ScanEvent::FilesFound(n) => {
                if config.verbose {
                    println!("Found {} files.", n)
                }
            }
            ScanEvent::FileParsed(path) => {
                if config.verbose {
                    println!("Parsed: {}", path)
                }
            }
            ScanEvent::Warning(msg) => eprintln!("Warning: {}", msg),
            ScanEvent::Complete(msg) => {
                if config.verbose {
                    println!("{}", msg)
                }
            }
            ScanEvent::Error(e) => eprintln!("Error: {}", e),
        }
    }

    let summary = handle
        .join()
        .map_err(|_| anyhow::anyhow!("analysis thread panicked"))??;

    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    std::fs::write(&config.output, json)
        .with_context(|| format!("Failed to write output: {:?}", config.output))?;

    Ok(summary)
}
