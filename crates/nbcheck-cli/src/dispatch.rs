//! Run dispatcher for nbcheck.
//!
//! Resolves the documents in scope, then drives each one through
//! load → execute → save (or the read-only check) and collects results.

use std::path::{Path, PathBuf};

use anyhow::Context;
use nbcheck_core::{
    CellExecutor, DocumentResult, Kernel, LoggingCallback, ResultCollector, RunConfig, RunMode,
    RunSummary, Scope, ScriptKernel,
};

use crate::output::{Format, Reporter};

/// Documents named by the configuration, in processing order.
fn resolve_targets(config: &RunConfig) -> anyhow::Result<Vec<PathBuf>> {
    match &config.scope {
        Scope::All { root } => nbcheck_ipynb::discover(root)
            .with_context(|| format!("Failed to search {}", root.display())),
        Scope::Targets(targets) => Ok(targets.clone()),
    }
}

/// Execute one document and persist its fresh outputs.
///
/// Every failure ends up in the returned result; nothing is propagated.
fn run_document<K: Kernel>(
    executor: &CellExecutor<K>,
    path: &Path,
    save_results: bool,
) -> DocumentResult {
    let document = match nbcheck_ipynb::load(path) {
        Ok(document) => document,
        Err(err) => return DocumentResult::from_error(path, &nbcheck_core::Error::from(err)),
    };

    let (document, result) = executor.execute(document);

    if save_results {
        if let Err(err) = nbcheck_ipynb::save(&document) {
            tracing::warn!("Could not save {}: {}", path.display(), err);
            // An execution failure is the more useful report; keep it.
            if result.is_pass() {
                return DocumentResult::from_error(path, &nbcheck_core::Error::from(err));
            }
        }
    }
    result
}

/// Run every document in scope and report as we go.
pub fn execute(config: &RunConfig, format: Format) -> anyhow::Result<RunSummary> {
    config.validate()?;

    let reporter = Reporter::new(format, config.mode);
    let targets = resolve_targets(config)?;
    let mut collector = ResultCollector::new();

    if targets.is_empty() {
        reporter.no_documents();
        let summary = collector.summarize();
        if format == Format::Json {
            reporter.finish(&summary)?;
        }
        return Ok(summary);
    }

    tracing::debug!(
        "Processing {} notebook(s), mode {:?}, saving: {}",
        targets.len(),
        config.mode,
        config.writes_documents()
    );
    reporter.header(targets.len());

    let mut executor = CellExecutor::new(ScriptKernel::new());
    executor.set_callback(LoggingCallback);

    process(config, &targets, &executor, &reporter, &mut collector);

    let summary = collector.summarize();
    reporter.finish(&summary)?;
    Ok(summary)
}

/// Drive each target through the configured mode, in order.
fn process<K: Kernel>(
    config: &RunConfig,
    targets: &[PathBuf],
    executor: &CellExecutor<K>,
    reporter: &Reporter,
    collector: &mut ResultCollector,
) {
    for path in targets {
        reporter.document_started(path);
        let result = match config.mode {
            RunMode::Execute => run_document(executor, path, config.writes_documents()),
            RunMode::Check => nbcheck_ipynb::check(path),
        };
        reporter.document_finished(&result);
        collector.record(result);
    }
}
