//! Shared helpers for building paper source directories in tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary paper directory, removed on drop.
///
/// ```
/// use test_helpers::PaperDir;
///
/// let paper = PaperDir::new().with_file("sections/intro.tex", "Intro.");
/// assert!(paper.file("sections/intro.tex").is_file());
/// ```
#[derive(Debug)]
pub struct PaperDir {
    dir: TempDir,
}

impl Default for PaperDir {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperDir {
    /// Creates an empty paper directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::Builder::new()
            .prefix("paper-")
            .tempdir()
            .unwrap_or_else(|e| panic!("failed to create paper directory: {e}"));
        Self { dir }
    }

    /// Adds a text file, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn with_file(self, relative: &str, contents: &str) -> Self {
        self.write(relative, contents);
        self
    }

    /// Writes a text file, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, relative: &str, contents: &str) {
        self.write_bytes(relative, contents.as_bytes());
    }

    /// Writes raw bytes, creating parent directories as needed.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_bytes(&self, relative: &str, contents: &[u8]) {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, contents)
            .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }

    /// Returns the directory's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the absolute path of `relative` inside the directory.
    #[must_use]
    pub fn file(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }
}
