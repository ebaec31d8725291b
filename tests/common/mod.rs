//! Common test utilities for nvup integration tests

use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch directory holding staged driver files for CLI tests
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Stage a file in the workspace and return its absolute path
    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let file_path = self.path.join(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Absolute path for a file name inside the workspace, staged or not
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}
