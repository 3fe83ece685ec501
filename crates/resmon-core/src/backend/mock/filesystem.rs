//! The mock filesystem itself: a path → content map plus a directory
//! set so enumeration works.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use crate::backend::traits::FileSystem;

/// Simulated filesystem holding file contents in memory.
///
/// Paths behave like absolute Unix paths; adding a file creates its
/// parent directories implicitly.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, creating parent directories along the way.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory (a pid directory with no readable files,
    /// for instance).
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds the file set of one `/proc/<pid>/` directory.
    pub fn add_process(&mut self, pid: u32, stat: &str, status: &str, cmdline: &str, comm: &str) {
        let base = PathBuf::from(format!("/proc/{pid}"));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("status"), status);
        self.add_file(base.join("cmdline"), cmdline);
        self.add_file(base.join("comm"), comm);
    }

    /// Removes a pid directory and everything under it, simulating the
    /// process exiting between two reads.
    pub fn remove_process(&mut self, pid: u32) {
        let base = PathBuf::from(format!("/proc/{pid}"));
        self.files.retain(|path, _| !path.starts_with(&base));
        self.directories.retain(|path| !path.starts_with(&base));
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if !dir.as_os_str().is_empty() {
                self.directories.insert(dir.to_path_buf());
            }
            parent = dir.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}", path.display()),
            ));
        }

        let mut entries: Vec<PathBuf> = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter(|candidate| candidate.parent() == Some(path))
            .cloned()
            .collect();
        entries.sort();
        entries.dedup();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_readable_after_adding() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/stat", "cpu 1 2 3 4 5 6 7 8\n");
        assert_eq!(
            fs.read_to_string(Path::new("/proc/stat")).unwrap(),
            "cpu 1 2 3 4 5 6 7 8\n"
        );
        assert!(fs.read_to_string(Path::new("/proc/missing")).is_err());
    }

    #[test]
    fn read_dir_lists_direct_children_only() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/stat", "x");
        fs.add_file("/proc/meminfo", "MemTotal: 1 kB");
        let entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert_eq!(
            entries,
            vec![PathBuf::from("/proc/1"), PathBuf::from("/proc/meminfo")]
        );
    }

    #[test]
    fn removing_a_process_erases_its_directory() {
        let mut fs = MockFs::new();
        fs.add_process(7, "7 (x) S 0", "Name:\tx", "", "x");
        fs.remove_process(7);
        assert!(fs.read_to_string(Path::new("/proc/7/stat")).is_err());
        assert!(!fs.read_dir(Path::new("/proc")).unwrap().contains(&PathBuf::from("/proc/7")));
    }
}
