// Cross-platform file utilities

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// File utilities for cross-platform operations
pub struct FileUtils;

impl FileUtils {
    /// Create the parent directory of `path`, recursively, if it is missing
    pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                fs::create_dir_all(parent)
            }
            _ => Ok(()),
        }
    }

    /// Create `path` (and its parents) or truncate it to empty, opened for writing
    pub fn create_truncated(path: &Path) -> io::Result<File> {
        Self::ensure_parent_dir(path)?;
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }

    /// Open a line reader on a file, or on stdin for `None` and `-`
    pub fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
        match path {
            Some(path) if path != Path::new("-") => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open event log: {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
            _ => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }

    /// Write file content
    pub fn write_file(path: &Path, content: &str) -> Result<()> {
        Self::ensure_parent_dir(path)
            .with_context(|| format!("Failed to create directory for: {}", path.display()))?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))
    }
}
