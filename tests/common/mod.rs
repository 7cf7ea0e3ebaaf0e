//! Golden case loader.
//!
//! Cases live in `tests/cases/*.yaml` as lists of `{name, input, expected}`
//! entries, where `expected` is the `render_tree` dump of the parsed file, or
//! `expect_error_code` names the diagnostic code the parse must fail with.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

/// A single YAML golden case.
#[derive(Debug, Deserialize)]
pub struct GoldenCase {
    pub name: String,
    pub input: String,
    pub expected: Option<String>,
    pub expect_error_code: Option<String>,
    #[serde(default)]
    pub skip: bool,
}

/// Every `.yaml` or `.yml` file under `root`, sorted.
pub fn discover_yaml_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Loads the cases of one file, panicking with the path on malformed YAML.
pub fn load_cases(path: &Path) -> Vec<GoldenCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_yaml::from_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse YAML in {}: {e}", path.display()))
}

pub fn cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cases")
}

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}
