//! YAML configuration: a global minimum plus per-package minimums.
//!
//! ```yaml
//! min_coverage_percentage: 40
//! packages:
//!   - name: example.com/project/pkg/foo
//!     min_coverage_percentage: 80
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Result};

pub const DEFAULT_CONFIG_FILE: &str = ".stmtcov.yml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigPackage {
    pub name: String,
    pub min_coverage_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_coverage_percentage: Option<f64>,
    #[serde(default)]
    pub packages: Vec<ConfigPackage>,
}

impl Config {
    /// Parse and validate YAML content. Empty content is an empty config.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config =
            serde_yaml::from_str(content).map_err(|e| CheckError::ConfigFormat {
                key: e
                    .location()
                    .map(|loc| format!("line {}", loc.line()))
                    .unwrap_or_else(|| "document".to_string()),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. `None` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_yaml(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| CheckError::ConfigFormat {
            key: "document".to_string(),
            message: e.to_string(),
        })
    }

    /// Exact-name lookup.
    pub fn get_package(&self, name: &str) -> Option<&ConfigPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    fn validate(&self) -> Result<()> {
        if let Some(min) = self.min_coverage_percentage {
            check_percentage("min_coverage_percentage", min)?;
        }

        let mut seen = HashSet::new();
        for (idx, pkg) in self.packages.iter().enumerate() {
            let key = format!("packages[{idx}]");
            if pkg.name.trim().is_empty() {
                return Err(CheckError::ConfigFormat {
                    key: format!("{key}.name"),
                    message: "package name is empty".to_string(),
                });
            }
            if !seen.insert(pkg.name.as_str()) {
                return Err(CheckError::ConfigFormat {
                    key: format!("{key}.name"),
                    message: format!("package {} is listed more than once", pkg.name),
                });
            }
            check_percentage(
                &format!("{key}.min_coverage_percentage"),
                pkg.min_coverage_percentage,
            )?;
        }
        Ok(())
    }
}

fn check_percentage(key: &str, value: f64) -> Result<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(CheckError::ConfigFormat {
            key: key.to_string(),
            message: format!("{value} is not a percentage between 0 and 100"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_package() {
        let config = Config::from_yaml(
            "packages:\n- name: github.com/foo/bar/pkg/baz\n  min_coverage_percentage: 22\n",
        )
        .unwrap();
        let pkg = config.get_package("github.com/foo/bar/pkg/baz").unwrap();
        assert_eq!(pkg.min_coverage_percentage, 22.0);
        assert!(config.get_package("github.com/foo/bar/pkg").is_none());
        assert_eq!(config.min_coverage_percentage, None);
    }

    #[test]
    fn test_global_minimum() {
        let config = Config::from_yaml("min_coverage_percentage: 55.5\n").unwrap();
        assert_eq!(config.min_coverage_percentage, Some(55.5));
        assert!(config.packages.is_empty());
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_yaml() {
        let err = Config::from_yaml("packages: [name: foo\n").unwrap_err();
        assert!(matches!(err, CheckError::ConfigFormat { .. }), "got {err:?}");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_yaml("minimum: 3\n").unwrap_err();
        assert!(matches!(err, CheckError::ConfigFormat { .. }));
    }

    #[test]
    fn test_out_of_range_percentage_names_key() {
        let err = Config::from_yaml(
            "packages:\n- name: a\n  min_coverage_percentage: 10\n- name: b\n  min_coverage_percentage: 120\n",
        )
        .unwrap_err();
        match err {
            CheckError::ConfigFormat { key, .. } => {
                assert_eq!(key, "packages[1].min_coverage_percentage")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_package() {
        let err = Config::from_yaml(
            "packages:\n- name: a\n  min_coverage_percentage: 10\n- name: a\n  min_coverage_percentage: 20\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_yaml_roundtrip_for_init() {
        let config = Config {
            min_coverage_percentage: None,
            packages: vec![ConfigPackage {
                name: "foo/bar".to_string(),
                min_coverage_percentage: 33.33,
            }],
        };
        let yaml = config.to_yaml().unwrap();
        assert!(!yaml.contains("min_coverage_percentage: null"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(&dir.path().join("nope.yml")).unwrap(), None);
    }
}
