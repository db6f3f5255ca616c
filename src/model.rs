//! In-memory representation of everything the engine computes: extracted
//! functions and statements, coverage profile blocks, and the derived
//! per-function and per-package counts.

use std::path::PathBuf;

use serde::Serialize;

use crate::position::Range;

/// Percentage of `covered` over `total`, truncated to two decimals.
///
/// An empty total is vacuously fully covered. The division is done in
/// integers so that values like 29/100 cannot drift below their exact
/// two-decimal representation.
#[must_use]
pub fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let covered = covered.min(total) as u128;
    let basis_points = covered * 10_000 / total as u128;
    basis_points as f64 / 100.0
}

/// One atomic executable statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub range: Range,
    /// Sum of hit counts of every coverage block overlapping the statement.
    pub executed_count: u64,
}

impl Statement {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            executed_count: 0,
        }
    }
}

/// A named function or method together with its statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub name: String,
    pub source_path: PathBuf,
    pub range: Range,
    pub statements: Vec<Statement>,
}

impl Function {
    /// Statements hit at least once.
    pub fn executed_statements(&self) -> u64 {
        self.statements
            .iter()
            .filter(|s| s.executed_count > 0)
            .count() as u64
    }
}

/// A single block from a coverage profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageBlock {
    pub range: Range,
    /// Number of statements the profiling tool attributes to the block.
    pub statement_count: u64,
    pub hit_count: u64,
}

/// Counting mode declared on the first line of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Set,
    Count,
    Atomic,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Set => "set",
            Mode::Count => "count",
            Mode::Atomic => "atomic",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "set" => Ok(Mode::Set),
            "count" => Ok(Mode::Count),
            "atomic" => Ok(Mode::Atomic),
            _ => Err(format!(
                "unknown mode '{s}'. Supported: set, count, atomic"
            )),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coverage blocks recorded for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProfile {
    /// File name exactly as written in the profile (usually an import path).
    pub path: String,
    /// Blocks sorted by start position.
    pub blocks: Vec<CoverageBlock>,
}

/// The complete result of parsing one coverage profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileData {
    pub mode: Mode,
    /// Files sorted by path.
    pub files: Vec<FileProfile>,
}

impl ProfileData {
    /// Blocks recorded for `path`, if the profile mentions it.
    pub fn blocks_for(&self, path: &str) -> Option<&[CoverageBlock]> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|idx| self.files[idx].blocks.as_slice())
    }
}

/// Statement counts for one function after matching against the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FunctionCoverage {
    pub name: String,
    pub source_path: PathBuf,
    pub statement_count: u64,
    pub covered_count: u64,
}

impl FunctionCoverage {
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.covered_count, self.statement_count)
    }
}

/// Rolled-up counts for one package.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageCoverage {
    pub package: String,
    pub statement_count: u64,
    pub executed_count: u64,
    pub percent: f64,
}

impl PackageCoverage {
    pub fn new(package: String, statement_count: u64, executed_count: u64) -> Self {
        Self {
            package,
            statement_count,
            executed_count,
            percent: percent(executed_count, statement_count),
        }
    }
}
