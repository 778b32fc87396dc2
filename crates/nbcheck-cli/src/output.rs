//! Progress and summary output for nbcheck.

use std::path::Path;

use nbcheck_core::{DocumentResult, MAX_FAILURE_MESSAGE, RunMode, RunSummary};

use crate::colors::{self, Style, mark, paint};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Progress lines and a closing verdict.
    Human,
    /// A single JSON summary on stdout.
    Json,
}

/// Prints progress for one run.
pub struct Reporter {
    format: Format,
    mode: RunMode,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

impl Reporter {
    pub fn new(format: Format, mode: RunMode) -> Self {
        Self { format, mode }
    }

    fn human(&self) -> bool {
        self.format == Format::Human
    }

    pub fn no_documents(&self) {
        if self.human() {
            println!("No notebooks found.");
        }
    }

    pub fn header(&self, count: usize) {
        if !self.human() {
            return;
        }
        let action = match self.mode {
            RunMode::Execute => "Running",
            RunMode::Check => "Checking saved outputs of",
        };
        println!("{}\n", paint(Style::Bold, format!("{} {} notebook(s)...", action, count)));
    }

    pub fn document_started(&self, path: &Path) {
        if self.human() && self.mode == RunMode::Execute {
            print!("  Running {}... ", file_name(path));
            colors::flush_stdout();
        }
    }

    pub fn document_finished(&self, result: &DocumentResult) {
        if !self.human() {
            return;
        }
        let name = file_name(result.path());
        match (self.mode, result.failure()) {
            (RunMode::Execute, None) => println!("{}", mark(true)),
            (RunMode::Execute, Some(failure)) => {
                println!("{}", mark(false));
                let location = match result.failing_cell_index() {
                    Some(index) => format!("cell {}: ", index),
                    None => String::new(),
                };
                println!(
                    "    {} {}{}",
                    paint(Style::Fail, "Error:"),
                    location,
                    failure.describe(MAX_FAILURE_MESSAGE)
                );
            }
            (RunMode::Check, None) => println!("{} {}: OK", mark(true), name),
            (RunMode::Check, Some(_)) => {
                println!("{} {}: {} error(s)", mark(false), name, result.failure_count());
                for line in result.failure_lines() {
                    // Drop the leading path; the header line already names the file.
                    let detail = line
                        .strip_prefix(&format!("{}: ", result.path().display()))
                        .unwrap_or(&line)
                        .to_string();
                    println!("   {}", paint(Style::Dim, detail));
                }
            }
        }
    }

    /// Print the closing report.
    pub fn finish(&self, summary: &RunSummary) -> anyhow::Result<()> {
        if !self.human() {
            println!("{}", serde_json::to_string_pretty(summary)?);
            return Ok(());
        }

        println!();
        if summary.all_passed() {
            println!("{}", paint(Style::Pass, "All notebooks passed! ✓"));
            return Ok(());
        }

        println!("{}", paint(Style::Bold, "Failures:"));
        for line in summary.failure_lines() {
            println!("  {}", line);
        }
        println!();
        println!(
            "{} ({} passed, {} failed)",
            paint(Style::Fail, "Some notebooks have errors."),
            summary.passed,
            summary.failed
        );
        Ok(())
    }
}
