//! nbcheck CLI - Execute tutorial notebooks and verify no cell raises.

mod colors;
mod dispatch;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nbcheck_core::{RunConfig, RunMode};

use crate::output::Format;

#[derive(Parser)]
#[command(name = "nbcheck")]
#[command(about = "Execute notebooks and verify that no cell raises")]
#[command(version)]
struct Cli {
    /// Notebooks to process (default: every notebook under --root)
    notebooks: Vec<PathBuf>,

    /// Check saved outputs only; nothing is executed or written
    #[arg(long)]
    check: bool,

    /// Directory searched when no notebooks are named
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Execute without saving fresh outputs
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> RunConfig {
        let config = if self.notebooks.is_empty() {
            RunConfig::all(&self.root)
        } else {
            RunConfig::targets(self.notebooks.clone())
        };
        let mode = if self.check {
            RunMode::Check
        } else {
            RunMode::Execute
        };
        config.with_mode(mode).with_dry_run(self.dry_run)
    }

    fn format(&self) -> Format {
        if self.json { Format::Json } else { Format::Human }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let summary = dispatch::execute(&cli.config(), cli.format())?;

    Ok(if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbcheck_core::Scope;

    #[test]
    fn test_no_arguments_means_all_under_current_dir() {
        let cli = Cli::parse_from(["nbcheck"]);
        let config = cli.config();
        assert_eq!(
            config.scope,
            Scope::All {
                root: PathBuf::from(".")
            }
        );
        assert_eq!(config.mode, RunMode::Execute);
        assert!(config.writes_documents());
    }

    #[test]
    fn test_named_notebooks_keep_their_order() {
        let cli = Cli::parse_from(["nbcheck", "b.ipynb", "a.ipynb", "--check"]);
        let config = cli.config();
        assert_eq!(
            config.scope,
            Scope::Targets(vec![PathBuf::from("b.ipynb"), PathBuf::from("a.ipynb")])
        );
        assert_eq!(config.mode, RunMode::Check);
        assert!(!config.writes_documents());
    }

    #[test]
    fn test_dry_run_conflicts_with_check() {
        assert!(Cli::try_parse_from(["nbcheck", "--check", "--dry-run"]).is_err());
    }

    #[test]
    fn test_json_flag_selects_format() {
        assert_eq!(Cli::parse_from(["nbcheck", "--json"]).format(), Format::Json);
        assert_eq!(Cli::parse_from(["nbcheck"]).format(), Format::Human);
    }
}
