//! Finding Go sources and naming their packages.
//!
//! A file's import path is what Go coverage profiles use to name it. In
//! module mode it is the `module` path from the nearest `go.mod` followed by
//! the file's path relative to that `go.mod`; in GOPATH mode it is the path
//! relative to `$GOPATH/src`. The package key is the import path's directory.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};

use crate::error::{CheckError, Result};

pub const DEFAULT_SKIP_DIRS: &str = "vendor";

const GO_MOD: &str = "go.mod";

/// A Go source file selected for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub import_path: String,
    pub package: String,
}

/// How import paths are derived for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectLayout {
    Module { root: PathBuf, module: String },
    Gopath { src_root: PathBuf },
}

impl ProjectLayout {
    /// Look for a `go.mod` at or above `path`; without one, fall back to
    /// GOPATH mode rooted at `src_root` or `$GOPATH/src` or `$HOME/go/src`.
    pub fn detect(path: &Path, src_root: Option<&Path>) -> Result<Self> {
        let start = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };

        for dir in start.ancestors() {
            let go_mod = dir.join(GO_MOD);
            if !go_mod.is_file() {
                continue;
            }
            let content = fs::read_to_string(&go_mod)?;
            match module_path(&content) {
                Some(module) => {
                    debug!("module {module} rooted at {}", dir.display());
                    return Ok(ProjectLayout::Module {
                        root: dir.to_path_buf(),
                        module,
                    });
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{} has no module directive", go_mod.display()),
                    )
                    .into())
                }
            }
        }

        let src_root = match src_root {
            Some(root) => root.to_path_buf(),
            None => default_src_root()?,
        };
        let src_root = src_root.canonicalize().unwrap_or(src_root);
        debug!("no {GO_MOD} found, using GOPATH source root {}", src_root.display());
        Ok(ProjectLayout::Gopath { src_root })
    }

    /// Import path of `file`, which must be absolute. Files outside the
    /// layout's root are named by their absolute path.
    pub fn import_path(&self, file: &Path) -> String {
        match self {
            ProjectLayout::Module { root, module } => match file.strip_prefix(root) {
                Ok(rel) => join_slash(Some(module.as_str()), rel),
                Err(_) => file.to_string_lossy().into_owned(),
            },
            ProjectLayout::Gopath { src_root } => match file.strip_prefix(src_root) {
                Ok(rel) => join_slash(None, rel),
                Err(_) => {
                    debug!(
                        "{} is outside {}, naming it by absolute path",
                        file.display(),
                        src_root.display()
                    );
                    file.to_string_lossy().into_owned()
                }
            },
        }
    }
}

/// The directory part of an import path.
pub fn package_key(import_path: &str) -> String {
    match import_path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => String::new(),
    }
}

/// Parse a comma separated `--skip-dirs` value.
pub fn parse_skip_dirs(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// All analyzable Go files under `root`, sorted.
///
/// Test files, `testdata`, directories listed in `skip_dirs` and
/// directories whose name starts with `.` or `_` are left out.
pub fn discover_files(root: &Path, skip_dirs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if root.is_file() {
        if is_go_source(root) {
            files.push(root.to_path_buf());
        }
        return Ok(files);
    }
    walk(root, skip_dirs, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, skip_dirs: &[String], files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if is_skipped_dir(&path, skip_dirs) {
                debug!("skipping directory {}", path.display());
                continue;
            }
            walk(&path, skip_dirs, files)?;
        } else if is_go_source(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_skipped_dir(path: &Path, skip_dirs: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    name == "testdata"
        || name.starts_with('.')
        || name.starts_with('_')
        || skip_dirs.iter().any(|s| s == name)
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}

/// Everything discovered under one path.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub layout: ProjectLayout,
    pub files: Vec<SourceFile>,
    /// Every package with at least one source file.
    pub packages: BTreeSet<String>,
}

/// Discover the sources under `path` and name them.
pub fn discover(path: &Path, skip_dirs: &[String], src_root: Option<&Path>) -> Result<Discovery> {
    let root = path.canonicalize().map_err(|e| {
        CheckError::Io(io::Error::new(
            e.kind(),
            format!("could not resolve {}: {e}", path.display()),
        ))
    })?;
    let layout = ProjectLayout::detect(&root, src_root)?;

    let files: Vec<SourceFile> = discover_files(&root, skip_dirs)?
        .into_iter()
        .map(|path| {
            let import_path = layout.import_path(&path);
            let package = package_key(&import_path);
            SourceFile {
                path,
                import_path,
                package,
            }
        })
        .collect();
    let packages: BTreeSet<String> = files.iter().map(|f| f.package.clone()).collect();

    info!(
        "Found {} Go files in {} packages under {}",
        files.len(),
        packages.len(),
        root.display()
    );

    Ok(Discovery {
        layout,
        files,
        packages,
    })
}

fn module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.split("//").next().unwrap_or("").trim();
        let module = rest.trim_matches('"').trim_matches('`');
        (!module.is_empty()).then(|| module.to_string())
    })
}

fn default_src_root() -> Result<PathBuf> {
    if let Some(gopath) = std::env::var_os("GOPATH") {
        if let Some(first) = std::env::split_paths(&gopath).find(|p| !p.as_os_str().is_empty()) {
            return Ok(first.join("src"));
        }
    }
    match std::env::var_os("HOME") {
        Some(home) => Ok(PathBuf::from(home).join("go").join("src")),
        None => Err(io::Error::new(
            io::ErrorKind::NotFound,
            "no go.mod found and neither GOPATH nor HOME is set; pass --src-root",
        )
        .into()),
    }
}

fn join_slash(prefix: Option<&str>, rel: &Path) -> String {
    let parts = rel.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    });
    prefix
        .map(str::to_string)
        .into_iter()
        .chain(parts)
        .collect::<Vec<_>>()
        .join("/")
}
