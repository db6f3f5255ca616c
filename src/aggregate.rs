//! Rolls function coverage up to packages.

use std::collections::BTreeMap;

use crate::model::{FunctionCoverage, PackageCoverage};

/// Collects [`FunctionCoverage`] values per package key.
///
/// Packages are kept in key order and every registered package is reported,
/// including those without any functions.
#[derive(Debug, Default, Clone)]
pub struct CoverageAggregator {
    packages: BTreeMap<String, Vec<FunctionCoverage>>,
}

impl CoverageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `package` shows up in the results even if no function is added.
    pub fn register_package(&mut self, package: &str) {
        self.packages.entry(package.to_string()).or_default();
    }

    pub fn add(&mut self, package: &str, function: FunctionCoverage) {
        self.packages
            .entry(package.to_string())
            .or_default()
            .push(function);
    }

    pub fn extend(&mut self, package: &str, functions: impl IntoIterator<Item = FunctionCoverage>) {
        self.packages
            .entry(package.to_string())
            .or_default()
            .extend(functions);
    }

    /// Functions of one package ordered by name, then source path.
    pub fn functions(&self, package: &str) -> Vec<&FunctionCoverage> {
        let mut functions: Vec<&FunctionCoverage> = self
            .packages
            .get(package)
            .map(|fs| fs.iter().collect())
            .unwrap_or_default();
        functions.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.source_path.cmp(&b.source_path))
        });
        functions
    }

    pub fn coverage(&self, package: &str) -> Option<PackageCoverage> {
        let functions = self.packages.get(package)?;
        Some(summarize(package, functions))
    }

    /// Coverage of every package, ordered by package key.
    pub fn package_coverages(&self) -> Vec<PackageCoverage> {
        self.packages
            .iter()
            .map(|(package, functions)| summarize(package, functions))
            .collect()
    }
}

fn summarize(package: &str, functions: &[FunctionCoverage]) -> PackageCoverage {
    let (statements, executed) = functions.iter().fold((0u64, 0u64), |(s, e), f| {
        (
            s.saturating_add(f.statement_count),
            e.saturating_add(f.covered_count),
        )
    });
    PackageCoverage::new(package.to_string(), statements, executed)
}
