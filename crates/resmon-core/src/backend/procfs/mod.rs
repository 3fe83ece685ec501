//! Unix counter backend over the `/proc` virtual filesystem.
//!
//! Generic over [`FileSystem`] so the same code reads real `/proc` in
//! production and an in-memory mock in tests or on hosts without procfs.
//! Every read opens, consumes, and drops its file within one call; no
//! descriptor outlives the snapshot it produced.

pub mod parser;

use std::path::Path;

use crate::backend::traits::FileSystem;
use crate::backend::{MetricSource, SampleError};
use crate::model::{CpuSnapshot, DiskSnapshot, MemorySnapshot, ProcessSnapshot};

use parser::ParseError;

/// Used when the host cannot report USER_HZ (and for mocked filesystems):
/// the value Linux has compiled in everywhere that matters.
const FALLBACK_CLOCK_TICKS: f64 = 100.0;

/// Clock ticks per second, asked of the host once per process.
///
/// The first caller runs `sysconf`; everyone after that reads the cached
/// value. Concurrent first calls are serialized by the cell, so a batch
/// warming up on many threads cannot observe a torn result.
#[cfg(unix)]
fn host_clock_ticks() -> f64 {
    use std::sync::OnceLock;

    static TICKS: OnceLock<f64> = OnceLock::new();
    *TICKS.get_or_init(|| {
        let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if hz > 0 { hz as f64 } else { FALLBACK_CLOCK_TICKS }
    })
}

#[cfg(not(unix))]
fn host_clock_ticks() -> f64 {
    FALLBACK_CLOCK_TICKS
}

/// Counter source reading the `/proc` text formats.
pub struct ProcfsSource<F: FileSystem> {
    fs: F,
    proc_path: String,
    clock_override: Option<f64>,
}

impl<F: FileSystem> ProcfsSource<F> {
    /// Creates a source rooted at `proc_path` (normally `/proc`).
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            clock_override: None,
        }
    }

    /// Overrides the ticks-per-second calibration, for tests and canned
    /// filesystems where `sysconf` would describe the wrong host.
    pub fn with_clock_ticks(mut self, ticks_per_second: f64) -> Self {
        self.clock_override = Some(ticks_per_second);
        self
    }

    fn read_file(&self, rel: &str) -> Result<String, SampleError> {
        let path = format!("{}/{}", self.proc_path, rel);
        self.fs
            .read_to_string(Path::new(&path))
            .map_err(|e| SampleError::Unavailable(format!("{path}: {e}")))
    }

    fn read_pid_file(&self, pid: u32, name: &str) -> Result<String, SampleError> {
        let path = format!("{}/{}/{}", self.proc_path, pid, name);
        self.fs
            .read_to_string(Path::new(&path))
            .map_err(|_| SampleError::NotFound(format!("process {pid}")))
    }

    fn incomplete(err: ParseError) -> SampleError {
        SampleError::Incomplete(err.message)
    }
}

impl<F: FileSystem> MetricSource for ProcfsSource<F> {
    fn read_cpu(&self, core: Option<usize>) -> Result<CpuSnapshot, SampleError> {
        let content = self.read_file("stat")?;
        let cpus = parser::parse_stat_cpus(&content);
        match core {
            None => cpus
                .iter()
                .find(|(id, _)| id.is_none())
                .map(|(_, snap)| snap.clone())
                .ok_or_else(|| SampleError::Incomplete("no aggregate cpu line".into())),
            Some(index) => cpus
                .iter()
                .find(|(id, _)| *id == Some(index as u32))
                .map(|(_, snap)| snap.clone())
                .ok_or_else(|| SampleError::NotFound(format!("cpu core {index}"))),
        }
    }

    fn read_all_cpus(&self) -> Result<Vec<CpuSnapshot>, SampleError> {
        let content = self.read_file("stat")?;
        let mut cores: Vec<(u32, CpuSnapshot)> = parser::parse_stat_cpus(&content)
            .into_iter()
            .filter_map(|(id, snap)| id.map(|id| (id, snap)))
            .collect();
        cores.sort_by_key(|(id, _)| *id);
        Ok(cores.into_iter().map(|(_, snap)| snap).collect())
    }

    fn read_disk(&self, label: &str) -> Result<DiskSnapshot, SampleError> {
        let content = self.read_file("diskstats")?;
        for line in content.lines() {
            // The label is field 3; compare the whole token so `sda`
            // never matches an `sda1` line.
            if line.split_whitespace().nth(2) == Some(label) {
                return parser::parse_disk_line(line).map_err(Self::incomplete);
            }
        }
        Err(SampleError::NotFound(format!("disk {label}")))
    }

    fn read_all_disks(&self) -> Result<Vec<DiskSnapshot>, SampleError> {
        let content = self.read_file("diskstats")?;
        let mut disks = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match parser::parse_disk_line(line) {
                Ok(snap) => disks.push(snap),
                Err(e) => tracing::warn!("skipping diskstats line: {e}"),
            }
        }
        Ok(disks)
    }

    fn read_process(&self, pid: u32) -> Result<ProcessSnapshot, SampleError> {
        let stat = parser::parse_pid_stat(&self.read_pid_file(pid, "stat")?)
            .map_err(Self::incomplete)?;

        // comm is the authoritative name; stat's comm field is the
        // fallback when it cannot be read.
        let name = self
            .read_pid_file(pid, "comm")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| stat.comm.clone());

        // cmdline is NUL-separated; the first argument is the path.
        // Kernel threads have an empty cmdline.
        let exe_path = self
            .read_pid_file(pid, "cmdline")
            .ok()
            .and_then(|raw| raw.split('\0').next().map(str::to_string))
            .unwrap_or_default();

        let rss_bytes = self
            .read_pid_file(pid, "status")
            .ok()
            .and_then(|content| parser::parse_vm_rss(&content))
            .unwrap_or(0);

        Ok(ProcessSnapshot {
            pid,
            name,
            exe_path,
            rss_bytes,
            kernel_ticks: stat.stime,
            user_ticks: stat.utime,
        })
    }

    fn read_memory(&self) -> Result<MemorySnapshot, SampleError> {
        let content = self.read_file("meminfo")?;
        parser::parse_meminfo(&content).map_err(Self::incomplete)
    }

    fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
        let entries = self
            .fs
            .read_dir(Path::new(&self.proc_path))
            .map_err(|e| SampleError::Unavailable(format!("{}: {e}", self.proc_path)))?;

        let mut pids: Vec<u32> = entries
            .iter()
            .filter_map(|path| path.file_name()?.to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn list_logical_disks(&self) -> Result<Vec<String>, SampleError> {
        Ok(self
            .read_all_disks()?
            .into_iter()
            .map(|disk| disk.device)
            .collect())
    }

    fn processor_count(&self) -> usize {
        self.read_all_cpus().map(|cpus| cpus.len()).unwrap_or(0)
    }

    fn clock_ticks_per_second(&self) -> f64 {
        self.clock_override.unwrap_or_else(host_clock_ticks)
    }
}
