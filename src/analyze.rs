//! Per-file analysis: parse, extract, match against the profile, aggregate.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::aggregate::CoverageAggregator;
use crate::discover::{Discovery, SourceFile};
use crate::error::{CheckError, Result};
use crate::extract::extract_functions;
use crate::matcher::BlockMatcher;
use crate::model::{CoverageBlock, FunctionCoverage, ProfileData};
use crate::syntax::go::parse_source;

/// What to do with a file that does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Log a warning and leave the file out.
    #[default]
    Warn,
    /// Abort the run.
    Strict,
}

/// Result of analyzing a set of files.
#[derive(Debug, Default)]
pub struct Analysis {
    pub aggregator: CoverageAggregator,
    pub function_count: usize,
    /// Files left out because they did not parse.
    pub skipped: Vec<PathBuf>,
}

/// Coverage of every function in one source text.
pub fn function_coverages(
    path: &Path,
    source: &str,
    blocks: Option<&[CoverageBlock]>,
) -> Result<Vec<FunctionCoverage>> {
    let unit = parse_source(path, source)?;
    let matcher = BlockMatcher::new(blocks);
    let coverages = extract_functions(&unit)?
        .iter_mut()
        .map(|function| matcher.record(function))
        .collect();
    Ok(coverages)
}

/// Read a source file. Content that is not UTF-8 cannot be Go source and is
/// reported as a parse error of that file alone.
fn read_source(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| CheckError::Parse {
        path: path.to_path_buf(),
        line: 1,
        column: 1,
        message: format!("source is not valid UTF-8: {e}"),
    })
}

fn analyze_file(file: &SourceFile, profile: &ProfileData) -> Result<Vec<FunctionCoverage>> {
    let source = read_source(&file.path)?;
    let blocks = profile
        .blocks_for(&file.import_path)
        .or_else(|| profile.blocks_for(&file.path.to_string_lossy()));
    if blocks.is_none() {
        debug!("no coverage data for {}", file.import_path);
    }
    function_coverages(&file.path, &source, blocks)
}

/// Analyze every discovered file against `profile`.
///
/// Files are processed on the rayon pool; results are folded in discovery
/// order. Every discovered package is registered, so a package whose files
/// all failed to parse or hold no functions still reports.
pub fn analyze(
    discovery: &Discovery,
    profile: &ProfileData,
    policy: ParsePolicy,
) -> Result<Analysis> {
    let results: Vec<(&SourceFile, Result<Vec<FunctionCoverage>>)> = discovery
        .files
        .par_iter()
        .map(|file| (file, analyze_file(file, profile)))
        .collect();

    let mut analysis = Analysis::default();
    for package in &discovery.packages {
        analysis.aggregator.register_package(package);
    }

    for (file, result) in results {
        match result {
            Ok(functions) => {
                analysis.function_count += functions.len();
                analysis.aggregator.extend(&file.package, functions);
            }
            Err(e) if e.is_recoverable() && policy == ParsePolicy::Warn => {
                warn!("skipping {}: {e}", file.path.display());
                analysis.skipped.push(file.path.clone());
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Analyzed {} functions in {} files ({} skipped)",
        analysis.function_count,
        discovery.files.len() - analysis.skipped.len(),
        analysis.skipped.len()
    );
    Ok(analysis)
}
