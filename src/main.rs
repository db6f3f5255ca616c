use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use stmtcov::cli::{self, AnalysisOptions, CheckOptions, ConfigSource};
use stmtcov::config::DEFAULT_CONFIG_FILE;
use stmtcov::discover::{parse_skip_dirs, DEFAULT_SKIP_DIRS};
use stmtcov::logging;
use stmtcov::report::Format;

/// Statement coverage checks for Go packages.
#[derive(Parser)]
#[command(name = "stmtcov", version, about)]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info", value_parser = logging::parse_level)]
    log_level: LevelFilter,

    /// Shorthand for --log-level debug.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AnalysisArgs {
    /// Directory (or file) to analyze.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Go coverage profile, as written by `go test -coverprofile`.
    #[arg(short, long)]
    profile: PathBuf,

    /// Comma separated directory names to skip.
    #[arg(short, long, default_value = DEFAULT_SKIP_DIRS)]
    skip_dirs: String,

    /// GOPATH source root used when no go.mod is found (default: $GOPATH/src).
    #[arg(long)]
    src_root: Option<PathBuf>,

    /// Fail on source files that do not parse instead of skipping them.
    #[arg(long)]
    strict: bool,
}

impl From<AnalysisArgs> for AnalysisOptions {
    fn from(args: AnalysisArgs) -> Self {
        AnalysisOptions {
            path: args.path,
            profile: args.profile,
            skip_dirs: parse_skip_dirs(&args.skip_dirs),
            src_root: args.src_root,
            strict: args.strict,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether package coverage meets the configured minimums.
    Check {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Minimum coverage percentage for packages the config does not list.
        #[arg(short, long)]
        minimum_coverage: Option<f64>,

        /// Configuration file (default: ./.stmtcov.yml if present).
        #[arg(short, long, conflicts_with = "no_config")]
        config_file: Option<PathBuf>,

        /// Do not read a configuration file.
        #[arg(long)]
        no_config: bool,

        /// Print coverage for individual functions.
        #[arg(long)]
        print_functions: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write a config file that pins every package at its current coverage.
    Init {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Where to write the config.
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,

        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Check {
            analysis,
            minimum_coverage,
            config_file,
            no_config,
            print_functions,
            format,
        } => {
            let config = match (no_config, config_file) {
                (true, _) => ConfigSource::Disabled,
                (false, Some(path)) => ConfigSource::Explicit(path),
                (false, None) => ConfigSource::Default,
            };
            let outcome = cli::cmd_check(&CheckOptions {
                analysis: analysis.into(),
                minimum: minimum_coverage,
                config,
                print_functions,
                format,
            })?;
            print!("{}", outcome.output);
            Ok(outcome.passed)
        }
        Commands::Init {
            analysis,
            output,
            force,
        } => {
            print!("{}", cli::cmd_init(&analysis.into(), &output, force)?);
            Ok(true)
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        cli.log_level
    };
    logging::init_logging(level).context("Failed to initialize logging")?;

    if run(cli.command)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
