//! Temporary directories with an `ember.toml` layout file.

use std::fs;
use std::path::{Path, PathBuf};

use ember_core::sources::LayoutFile;
use tempfile::TempDir;

/// A temporary install directory with `bin/` and an optional layout file.
///
/// # Example
///
/// ```rust
/// use ember_test_utils::LayoutDir;
///
/// let dir = LayoutDir::new();
/// dir.write_layout("home = \"/srv/ember\"\n");
/// assert!(dir.layout_path().exists());
/// ```
pub struct LayoutDir {
    temp_dir: TempDir,
}

impl Default for LayoutDir {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("bin")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of `bin/ember` (not created)
    pub fn executable(&self) -> PathBuf {
        self.root().join("bin").join("ember")
    }

    /// Where [`LayoutFile::beside`] looks for the executable above
    pub fn layout_path(&self) -> PathBuf {
        self.root().join("bin").join(LayoutFile::FILE_NAME)
    }

    pub fn write_layout(&self, content: &str) {
        fs::write(self.layout_path(), content).unwrap();
    }

    /// Write a file relative to the root, creating parent directories
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}
