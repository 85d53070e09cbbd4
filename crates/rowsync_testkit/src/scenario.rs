//! Temporary scenario and row files.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory of JSON input files, removed on drop.
pub struct ScenarioDir {
    dir: TempDir,
}

impl ScenarioDir {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `name` and returns the file path.
    pub fn write_str(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write scenario file");
        path
    }

    /// Serializes `value` as pretty JSON into `name`.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> PathBuf {
        let json = serde_json::to_string_pretty(value).expect("Failed to serialize scenario");
        self.write_str(name, &json)
    }
}

impl Default for ScenarioDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn files_live_inside_the_directory() {
        let dir = ScenarioDir::new();
        let path = dir.write_json("rows.json", &json!([{"id": "1"}]));
        assert!(path.starts_with(dir.path()));
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\"id\": \"1\""));
    }
}
