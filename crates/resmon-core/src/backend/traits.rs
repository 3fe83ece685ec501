//! Filesystem abstraction for the virtual-filesystem backend.
//!
//! The procfs backend only ever reads whole small files and lists one
//! directory, so the abstraction is two methods. Production uses
//! [`RealFs`]; tests (and hosts without `/proc`) use the in-memory mock.

use std::io;
use std::path::{Path, PathBuf};

/// Read access to a (possibly simulated) filesystem.
pub trait FileSystem: Send + Sync {
    /// Reads the entire file at `path` as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Lists the entries of the directory at `path`.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Passthrough to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }
}
