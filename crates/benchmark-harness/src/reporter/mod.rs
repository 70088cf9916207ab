//! Benchmark result reporting
//!
//! This module handles formatting and outputting benchmark results in various formats
//! including JSON, human-readable text, and HTML reports.
//!
//! # Output Formats
//!
//! - **JSON**: Machine-readable format for CI/CD integration
//! - **Console**: Human-readable format with colors and tables
//! - **Markdown**: Documentation-friendly format for reports
//!
//! # Example
//!
//! ```no_run
//! use benchmark_harness::reporter::{Reporter, OutputFormat};
//! use benchmark_harness::runner::BenchmarkResults;
//!
//! # fn example(results: BenchmarkResults) -> anyhow::Result<()> {
//! let reporter = Reporter::new(OutputFormat::Console);
//! reporter.report(&results)?;
//!
//! // Or write to a file
//! Reporter::new(OutputFormat::Json)
//!     .write_to_file(&results, "results.json")?;
//! # Ok(())
//! # }
//! ```

mod console;
mod json;
mod markdown;

use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::runner::BenchmarkResults;

pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use markdown::MarkdownReporter;

/// Output format for benchmark results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format for machine parsing
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Console output with colors and formatting
    Console,
    /// Markdown format for documentation
    Markdown,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Console
    }
}

/// Reporter for benchmark results
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    /// Create a new reporter with the specified output format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Report results to stdout
    pub fn report(&self, results: &BenchmarkResults) -> Result<()> {
        let output = self.format_results(results)?;
        print!("{}", output);
        io::stdout().flush()?;
        Ok(())
    }

    /// Write results to a file
    pub fn write_to_file<P: AsRef<Path>>(
        &self,
        results: &BenchmarkResults,
        path: P,
    ) -> Result<()> {
        let output = self.format_results(results)?;
        fs::write(path, output)?;
        Ok(())
    }

    /// Format results as a string
    pub fn format_results(&self, results: &BenchmarkResults) -> Result<String> {
        match self.format {
            OutputFormat::Json => JsonReporter::format(results, false),
            OutputFormat::JsonPretty => JsonReporter::format(results, true),
            OutputFormat::Console => ConsoleReporter::format(results),
            OutputFormat::Markdown => MarkdownReporter::format(results),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}
