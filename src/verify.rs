//! Compares package coverage against the configured minimums.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::aggregate::CoverageAggregator;
use crate::config::Config;
use crate::model::{FunctionCoverage, PackageCoverage};

/// Threshold settings for one run.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    /// Minimum applied to packages that the config does not list.
    pub default_minimum: f64,
    /// Emit one line per function ahead of its package line.
    pub print_functions: bool,
}

/// Outcome for a single package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageVerdict {
    #[serde(flatten)]
    pub coverage: PackageCoverage,
    pub minimum: f64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionCoverage>,
}

/// The result of checking every package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub packages: Vec<PackageVerdict>,
    pub passed: bool,
}

/// One line of the plain report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine<'a> {
    Function(&'a FunctionCoverage),
    Package(&'a PackageVerdict),
}

impl fmt::Display for ReportLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLine::Function(function) => write!(
                f,
                "function {} has {} statements of which {} were executed for a percent of {}",
                function.name,
                function.statement_count,
                function.covered_count,
                function.percent()
            ),
            ReportLine::Package(verdict) => write!(
                f,
                "pkg {} coverage {}% minimum {}% statements {}/{}",
                verdict.coverage.package,
                verdict.coverage.percent,
                verdict.minimum,
                verdict.coverage.executed_count,
                verdict.coverage.statement_count
            ),
        }
    }
}

impl Verifier {
    pub fn new(default_minimum: f64, print_functions: bool) -> Self {
        Self {
            default_minimum,
            print_functions,
        }
    }

    /// Minimum for `package`: the config entry with that exact name, else the default.
    pub fn minimum_for(&self, package: &str, config: Option<&Config>) -> f64 {
        match config.and_then(|c| c.get_package(package)) {
            Some(entry) => entry.min_coverage_percentage,
            None => {
                debug!(
                    "no minimum configured for {package}, using {}",
                    self.default_minimum
                );
                self.default_minimum
            }
        }
    }

    /// Check every package. A package fails only when its percentage is
    /// strictly below its minimum; no package is skipped on failure.
    pub fn verify(&self, aggregator: &CoverageAggregator, config: Option<&Config>) -> Verification {
        let packages: Vec<PackageVerdict> = aggregator
            .package_coverages()
            .into_iter()
            .map(|coverage| {
                let minimum = self.minimum_for(&coverage.package, config);
                let functions = if self.print_functions {
                    aggregator
                        .functions(&coverage.package)
                        .into_iter()
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                PackageVerdict {
                    passed: coverage.percent >= minimum,
                    minimum,
                    functions,
                    coverage,
                }
            })
            .collect();

        let passed = packages.iter().all(|p| p.passed);
        Verification { packages, passed }
    }
}

impl Verification {
    /// Report lines in output order: each package's functions, then the package.
    pub fn lines(&self) -> Vec<ReportLine<'_>> {
        self.packages
            .iter()
            .flat_map(|verdict| {
                verdict
                    .functions
                    .iter()
                    .map(ReportLine::Function)
                    .chain(std::iter::once(ReportLine::Package(verdict)))
            })
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PackageVerdict> {
        self.packages.iter().filter(|p| !p.passed)
    }
}
