//! Output formatting for verification results.

use std::fmt::Write;

use anyhow::Result;
use clap::ValueEnum;

use crate::verify::{ReportLine, Verification};

/// Output style for the `check` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn formatter(&self) -> &'static dyn ReportFormatter {
        match self {
            Format::Text => &TextFormatter,
            Format::Json => &JsonFormatter,
        }
    }
}

/// Trait for formatting verification results.
pub trait ReportFormatter {
    fn format(&self, verification: &Verification) -> Result<String>;
}

/// Plain text, one line per function and package, with aligned columns.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, verification: &Verification) -> Result<String> {
        let mut out = String::new();

        if verification.packages.is_empty() {
            out.push_str("No Go packages found.\n");
            return Ok(out);
        }

        let name_width = verification
            .packages
            .iter()
            .map(|p| p.coverage.package.len())
            .max()
            .unwrap_or(0);

        for line in verification.lines() {
            match line {
                ReportLine::Function(_) => writeln!(out, "  {line}")?,
                ReportLine::Package(verdict) => {
                    let cov = &verdict.coverage;
                    writeln!(
                        out,
                        "pkg {:<name_width$}  coverage {:>6}%  minimum {:>6}%  statements {}/{}",
                        cov.package,
                        cov.percent,
                        verdict.minimum,
                        cov.executed_count,
                        cov.statement_count,
                    )?;
                }
            }
        }

        let failed = verification.failures().count();
        let total = verification.packages.len();
        if failed == 0 {
            writeln!(out, "\nAll {total} packages meet their minimum coverage.")?;
        } else {
            writeln!(out, "\n{failed} of {total} packages are below their minimum coverage:")?;
            for verdict in verification.failures() {
                writeln!(
                    out,
                    "  {} ({}% < {}%)",
                    verdict.coverage.package, verdict.coverage.percent, verdict.minimum
                )?;
            }
        }

        Ok(out)
    }
}

/// The full verification as a JSON document.
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, verification: &Verification) -> Result<String> {
        let mut out = serde_json::to_string_pretty(verification)?;
        out.push('\n');
        Ok(out)
    }
}
