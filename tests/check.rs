mod common;

use pretty_assertions::assert_eq;

use common::{GoProject, MEOW};
use stmtcov::analyze::{analyze, ParsePolicy};
use stmtcov::cli::{self, AnalysisOptions, CheckOptions, ConfigSource};
use stmtcov::config::Config;
use stmtcov::discover::discover;
use stmtcov::error::CheckError;
use stmtcov::parsers::gocover;
use stmtcov::report::Format;
use stmtcov::verify::{Verification, Verifier};

fn run(project: &GoProject, profile: &str, verifier: Verifier, config: Option<&Config>) -> Verification {
    let discovery = discover(&project.root(), &[], None).unwrap();
    let profile = gocover::parse(profile.as_bytes()).unwrap();
    let analysis = analyze(&discovery, &profile, ParsePolicy::Warn).unwrap();
    verifier.verify(&analysis.aggregator, config)
}

#[test]
fn meow_with_whole_function_block() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);

    let result = run(
        &project,
        "mode: set\nexample.com/cat/foo/foo.go:4.26,9.2 3 1\n",
        Verifier::new(100.0, true),
        None,
    );

    assert!(result.passed);
    let pkg = &result.packages[0];
    assert_eq!(pkg.coverage.package, "example.com/cat/foo");
    assert_eq!(pkg.coverage.statement_count, 3);
    assert_eq!(pkg.coverage.executed_count, 3);
    assert_eq!(pkg.coverage.percent, 100.0);

    let lines: Vec<String> = result.lines().iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "function Meow has 3 statements of which 3 were executed for a percent of 100",
            "pkg example.com/cat/foo coverage 100% minimum 100% statements 3/3",
        ]
    );
}

#[test]
fn meow_without_profile_data() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);

    let result = run(&project, "mode: set\n", Verifier::new(50.0, false), None);

    assert!(!result.passed);
    let pkg = &result.packages[0];
    assert_eq!(pkg.coverage.statement_count, 3);
    assert_eq!(pkg.coverage.executed_count, 0);
    assert_eq!(pkg.coverage.percent, 0.0);
    assert!(!pkg.passed);
}

#[test]
fn meow_with_go_cover_blocks() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);

    // What `go test -coverprofile` writes when only the false branch runs.
    let result = run(
        &project,
        "mode: count\n\
         example.com/cat/foo/foo.go:4.26,5.12 1 4\n\
         example.com/cat/foo/foo.go:5.12,7.3 1 0\n\
         example.com/cat/foo/foo.go:8.2,8.14 1 4\n",
        Verifier::new(66.66, false),
        None,
    );

    assert_eq!(result.packages[0].coverage.executed_count, 2);
    assert_eq!(result.packages[0].coverage.percent, 66.66);
    assert!(result.passed);
}

#[test]
fn configured_minimum_fails_uncovered_package() {
    let project = GoProject::new("foo");
    project.write("bar/foo.go", MEOW);
    let config = Config::from_yaml(
        "packages:\n- name: foo/bar\n  min_coverage_percentage: 10\n",
    )
    .unwrap();

    let result = run(&project, "mode: set\n", Verifier::default(), Some(&config));

    assert!(!result.passed);
    assert_eq!(
        result.lines()[0].to_string(),
        "pkg foo/bar coverage 0% minimum 10% statements 0/3"
    );
}

#[test]
fn package_without_functions_reports_full_coverage() {
    let project = GoProject::new("github.com/foo/bar");
    project.write("pkg/baz/types.go", "package baz\n\ntype Baz struct{ N int }\n\nconst Size = 3\n");
    project.write("pkg/cat/cat.go", MEOW);

    let result = run(&project, "mode: set\n", Verifier::new(0.0, false), None);

    let names: Vec<&str> = result
        .packages
        .iter()
        .map(|p| p.coverage.package.as_str())
        .collect();
    assert_eq!(names, vec!["github.com/foo/bar/pkg/baz", "github.com/foo/bar/pkg/cat"]);
    let baz = &result.packages[0];
    assert_eq!(baz.coverage.statement_count, 0);
    assert_eq!(baz.coverage.percent, 100.0);
    assert!(baz.passed);
}

#[test]
fn unparsable_file_is_skipped_but_package_reports() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);
    project.write("broken/broken.go", "package broken\n\nfunc Oops( {\n");

    let discovery = discover(&project.root(), &[], None).unwrap();
    let profile = gocover::parse(b"mode: set\n").unwrap();

    let analysis = analyze(&discovery, &profile, ParsePolicy::Warn).unwrap();
    assert_eq!(analysis.skipped.len(), 1);
    assert_eq!(analysis.function_count, 1);
    let broken = analysis.aggregator.coverage("example.com/cat/broken").unwrap();
    assert_eq!(broken.percent, 100.0);

    let err = analyze(&discovery, &profile, ParsePolicy::Strict).unwrap_err();
    assert!(matches!(err, CheckError::Parse { .. }), "got {err:?}");
}

#[test]
fn non_utf8_file_is_skipped_but_package_reports() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);
    let bad = project.write("bad/bad.go", "");
    std::fs::write(&bad, b"\xff\xfe").unwrap();

    let discovery = discover(&project.root(), &[], None).unwrap();
    let profile = gocover::parse(b"mode: set\n").unwrap();

    let analysis = analyze(&discovery, &profile, ParsePolicy::Warn).unwrap();
    assert_eq!(analysis.skipped, vec![bad]);
    assert_eq!(analysis.function_count, 1);
    assert!(analysis.aggregator.coverage("example.com/cat/bad").is_some());

    let err = analyze(&discovery, &profile, ParsePolicy::Strict).unwrap_err();
    assert!(matches!(err, CheckError::Parse { .. }), "got {err:?}");
}

#[test]
fn profile_may_name_files_by_absolute_path() {
    let project = GoProject::new("example.com/cat");
    let file = project.write("foo/foo.go", MEOW);

    let profile = format!("mode: set\n{}:4.26,9.2 3 1\n", file.display());
    let result = run(&project, &profile, Verifier::new(100.0, false), None);
    assert!(result.passed);
}

#[test]
fn vendor_and_tests_are_ignored() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);
    project.write("foo/foo_test.go", "package foo\n\nfunc helper() int {\n\treturn 1\n}\n");
    project.write("vendor/dep/dep.go", MEOW.replace("package foo", "package dep").as_str());

    let discovery = discover(&project.root(), &["vendor".to_string()], None).unwrap();
    assert_eq!(discovery.files.len(), 1);
    assert_eq!(discovery.packages.len(), 1);
}

#[test]
fn check_command_emits_json() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);
    let profile = project.profile("mode: set\nexample.com/cat/foo/foo.go:4.26,9.2 3 1\n");

    let outcome = cli::cmd_check(&CheckOptions {
        analysis: AnalysisOptions {
            path: project.root(),
            profile,
            skip_dirs: vec![],
            src_root: None,
            strict: false,
        },
        minimum: Some(90.0),
        config: ConfigSource::Disabled,
        print_functions: true,
        format: Format::Json,
    })
    .unwrap();

    assert!(outcome.passed);
    let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
    assert_eq!(value["packages"][0]["package"], "example.com/cat/foo");
    assert_eq!(value["packages"][0]["functions"][0]["covered_count"], 3);
}

#[test]
fn init_then_check_passes() {
    let project = GoProject::new("example.com/cat");
    project.write("foo/foo.go", MEOW);
    let profile = project.profile(
        "mode: set\n\
         example.com/cat/foo/foo.go:4.26,5.12 1 1\n\
         example.com/cat/foo/foo.go:5.12,7.3 1 0\n\
         example.com/cat/foo/foo.go:8.2,8.14 1 1\n",
    );
    let analysis = AnalysisOptions {
        path: project.root(),
        profile,
        skip_dirs: vec![],
        src_root: None,
        strict: false,
    };
    let config_path = project.root().join("stmtcov.yml");

    cli::cmd_init(&analysis, &config_path, false).unwrap();
    assert!(common::read(&config_path).contains("min_coverage_percentage: 66.66"));

    let outcome = cli::cmd_check(&CheckOptions {
        analysis,
        minimum: Some(100.0),
        config: ConfigSource::Explicit(config_path),
        print_functions: false,
        format: Format::Text,
    })
    .unwrap();
    assert!(outcome.passed, "{}", outcome.output);
}
