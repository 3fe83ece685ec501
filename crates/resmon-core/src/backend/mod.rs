//! Platform counter backends.
//!
//! A backend turns raw OS counters into typed snapshots and enumerates
//! the entities (cores, disks, pids) they belong to. Exactly one backend
//! is selected at process start by host-OS detection (see
//! [`host_source`]) and injected wherever sampling happens; nothing
//! branches on the OS per call.
//!
//! Two variants exist: the Unix backend parses `/proc` text files through
//! a swappable [`FileSystem`], and the Windows backend runs one-shot
//! performance-counter queries. The Windows counter engine measures
//! utilization itself over its own wait window, which the capability
//! interface exposes as the "direct" read family.

pub mod mock;
pub mod perfmon;
pub mod procfs;
pub mod traits;

use crate::model::{CpuSnapshot, DiskSnapshot, MemorySnapshot, ProcessSnapshot};

pub use mock::MockFs;
#[cfg(windows)]
pub use perfmon::PerfmonSource;
pub use procfs::ProcfsSource;
pub use traits::{FileSystem, RealFs};

/// Failure to produce a snapshot or an enumeration.
///
/// `ZeroElapsedWindow` is deliberately absent: a zero delta denominator
/// is defined as 0% usage by the delta functions, not reported as an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    /// The target does not resolve: pid directory gone, unknown device
    /// label, or a counter path with no instance behind it.
    NotFound(String),
    /// The counter source could not be opened or collected.
    Unavailable(String),
    /// A counter file or line had fewer fields than its format requires.
    Incomplete(String),
}

impl std::fmt::Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleError::NotFound(what) => write!(f, "{what} not found"),
            SampleError::Unavailable(msg) => write!(f, "counter source unavailable: {msg}"),
            SampleError::Incomplete(msg) => write!(f, "incomplete counter data: {msg}"),
        }
    }
}

impl std::error::Error for SampleError {}

/// Capability interface over one platform's counter source.
///
/// Snapshot reads hand back copied values; any OS handle a call needs is
/// released before the call returns. A read that fails yields an explicit
/// error rather than a zero-filled snapshot, so delta computation can
/// refuse an unavailable pair instead of reporting a false 0%.
pub trait MetricSource: Send + Sync {
    /// CPU tick counters for one core, or for the aggregate when `core`
    /// is omitted.
    fn read_cpu(&self, core: Option<usize>) -> Result<CpuSnapshot, SampleError>;

    /// Tick counters for every core, index = core id.
    fn read_all_cpus(&self) -> Result<Vec<CpuSnapshot>, SampleError>;

    /// I/O counters for the device with the given label.
    fn read_disk(&self, label: &str) -> Result<DiskSnapshot, SampleError>;

    /// I/O counters for every known device.
    fn read_all_disks(&self) -> Result<Vec<DiskSnapshot>, SampleError>;

    /// Point-in-time view of one process. `NotFound` means the process no
    /// longer exists, which is distinguishable from a live process that
    /// did no work.
    fn read_process(&self, pid: u32) -> Result<ProcessSnapshot, SampleError>;

    /// Aggregate memory and pagefile status.
    fn read_memory(&self) -> Result<MemorySnapshot, SampleError>;

    /// Advisory enumeration of live pids; may race with process churn.
    fn list_process_ids(&self) -> Result<Vec<u32>, SampleError>;

    /// Advisory enumeration of block device labels.
    fn list_logical_disks(&self) -> Result<Vec<String>, SampleError>;

    /// Number of logical processors, 0 when it cannot be determined.
    fn processor_count(&self) -> usize;

    /// Clock ticks per second. Computed once per process and cached; the
    /// first caller pays the cost.
    fn clock_ticks_per_second(&self) -> f64;

    /// True when the platform measures utilization itself across an
    /// internal wait window, making the `direct_*` family the preferred
    /// path and the two-snapshot delta unnecessary.
    fn measures_usage_directly(&self) -> bool {
        false
    }

    /// Platform-measured CPU usage percentage for one core (aggregate if
    /// omitted).
    fn direct_cpu_usage(&self, _core: Option<usize>) -> Result<f64, SampleError> {
        Err(SampleError::Unavailable(
            "source does not measure usage directly".into(),
        ))
    }

    /// Platform-measured busy percentage for one disk.
    fn direct_disk_usage(&self, _label: &str) -> Result<f64, SampleError> {
        Err(SampleError::Unavailable(
            "source does not measure usage directly".into(),
        ))
    }

    /// Platform-measured CPU usage percentage for one process.
    fn direct_process_cpu_usage(&self, _pid: u32, _name: &str) -> Result<f64, SampleError> {
        Err(SampleError::Unavailable(
            "source does not measure usage directly".into(),
        ))
    }
}

/// The counter source for the host this process runs on, chosen once by
/// OS detection.
#[cfg(target_os = "linux")]
pub fn host_source() -> ProcfsSource<RealFs> {
    ProcfsSource::new(RealFs::new(), "/proc")
}

/// The counter source for the host this process runs on, chosen once by
/// OS detection.
#[cfg(windows)]
pub fn host_source() -> PerfmonSource {
    PerfmonSource::new()
}

/// Fallback for hosts with neither `/proc` nor performance counters: a
/// procfs source over a canned in-memory filesystem, useful for demos and
/// development on such platforms.
#[cfg(not(any(target_os = "linux", windows)))]
pub fn host_source() -> ProcfsSource<MockFs> {
    tracing::warn!("no native counter source on this platform, using canned data");
    ProcfsSource::new(MockFs::quiet_host(), "/proc")
}
