use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// The function used throughout the end-to-end tests. Three statements:
/// the `if` condition and both returns.
pub const MEOW: &str = "package foo\n\
\n\
// Meow reports whether x is greater than y.\n\
func Meow(x, y int) bool {\n\
\tif x > y {\n\
\t\treturn true\n\
\t}\n\
\treturn false\n\
}\n";

/// A throwaway Go module on disk. The caller must hold onto the value to
/// keep the temp directory alive.
pub struct GoProject {
    pub dir: TempDir,
}

impl GoProject {
    pub fn new(module: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), format!("module {module}\n\ngo 1.21\n")).unwrap();
        GoProject { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn profile(&self, content: &str) -> PathBuf {
        self.write("cover.out", content)
    }
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
