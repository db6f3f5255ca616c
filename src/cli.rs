//! Command handler functions for the stmtcov CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;

use crate::analyze::{analyze, Analysis, ParsePolicy};
use crate::config::{Config, ConfigPackage, DEFAULT_CONFIG_FILE};
use crate::discover::discover;
use crate::model::ProfileData;
use crate::parsers::gocover::GocoverParser;
use crate::parsers::ProfileParser;
use crate::report::Format;
use crate::verify::Verifier;

/// Where `check` reads its configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `.stmtcov.yml` in the working directory, if present.
    Default,
    /// A file that must exist.
    Explicit(PathBuf),
    Disabled,
}

/// Inputs shared by `check` and `init`.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub path: PathBuf,
    pub profile: PathBuf,
    pub skip_dirs: Vec<String>,
    pub src_root: Option<PathBuf>,
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub analysis: AnalysisOptions,
    pub minimum: Option<f64>,
    pub config: ConfigSource,
    pub print_functions: bool,
    pub format: Format,
}

/// Rendered report plus whether every package met its minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub output: String,
    pub passed: bool,
}

fn load_profile(path: &Path) -> Result<ProfileData> {
    GocoverParser
        .parse_file(path)
        .with_context(|| format!("Failed to read coverage profile {}", path.display()))
}

fn load_config(source: &ConfigSource) -> Result<Option<Config>> {
    match source {
        ConfigSource::Disabled => Ok(None),
        ConfigSource::Default => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            if config.is_none() {
                debug!("no {DEFAULT_CONFIG_FILE} in the working directory");
            }
            Ok(config)
        }
        ConfigSource::Explicit(path) => match Config::load(path) {
            Ok(Some(config)) => Ok(Some(config)),
            Ok(None) => bail!("Config file {} does not exist", path.display()),
            Err(e) => Err(e).with_context(|| format!("Failed to load config {}", path.display())),
        },
    }
}

fn run_analysis(options: &AnalysisOptions) -> Result<Analysis> {
    let profile = load_profile(&options.profile)?;
    let discovery = discover(&options.path, &options.skip_dirs, options.src_root.as_deref())
        .with_context(|| format!("Failed to discover Go sources in {}", options.path.display()))?;
    let policy = if options.strict {
        ParsePolicy::Strict
    } else {
        ParsePolicy::Warn
    };
    Ok(analyze(&discovery, &profile, policy)?)
}

/// Analyze, verify against the minimums and render the report.
pub fn cmd_check(options: &CheckOptions) -> Result<CheckOutcome> {
    // Config and minimum errors surface before any analysis work.
    let config = load_config(&options.config)?;
    let default_minimum = options
        .minimum
        .or_else(|| config.as_ref().and_then(|c| c.min_coverage_percentage))
        .unwrap_or(0.0);
    if !(0.0..=100.0).contains(&default_minimum) {
        bail!("Minimum coverage {default_minimum} is not between 0 and 100");
    }

    let analysis = run_analysis(&options.analysis)?;

    let verification = Verifier::new(default_minimum, options.print_functions)
        .verify(&analysis.aggregator, config.as_ref());
    let output = options.format.formatter().format(&verification)?;

    Ok(CheckOutcome {
        output,
        passed: verification.passed,
    })
}

/// Write a config whose per-package minimums are the current coverage.
pub fn cmd_init(options: &AnalysisOptions, output: &Path, force: bool) -> Result<String> {
    if output.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            output.display()
        );
    }

    let analysis = run_analysis(options)?;
    let config = Config {
        min_coverage_percentage: None,
        packages: analysis
            .aggregator
            .package_coverages()
            .into_iter()
            .map(|cov| ConfigPackage {
                name: cov.package,
                min_coverage_percentage: cov.percent,
            })
            .collect(),
    };

    std::fs::write(output, config.to_yaml()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(format!(
        "Wrote minimums for {} packages to {}\n",
        config.packages.len(),
        output.display()
    ))
}
