//! Snapshot value types produced by the platform counter backends.
//!
//! Every snapshot is a plain copied value: raw, monotonically increasing
//! counters read at one instant. Utilization percentages are never stored
//! here; they are derived from *pairs* of snapshots by the [`crate::delta`]
//! functions.

use serde::{Deserialize, Serialize};

/// Cumulative CPU time counters for one core, or for the whole machine.
///
/// Source: one `cpu`/`cpuN` line of `/proc/stat`, in jiffies (clock ticks).
/// Counters only move forward between reads of the same core unless the
/// host reboots.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CpuSnapshot {
    /// Time spent in user mode.
    /// Source: `/proc/stat` column 1
    pub user: u64,

    /// Time spent in user mode at low priority.
    /// Source: `/proc/stat` column 2
    pub nice: u64,

    /// Time spent in kernel mode.
    /// Source: `/proc/stat` column 3
    pub system: u64,

    /// Time spent idle.
    /// Source: `/proc/stat` column 4
    pub idle: u64,

    /// Time waiting for I/O completion.
    /// Source: `/proc/stat` column 5
    pub iowait: u64,

    /// Time servicing hardware interrupts.
    /// Source: `/proc/stat` column 6
    pub irq: u64,

    /// Time servicing software interrupts.
    /// Source: `/proc/stat` column 7
    pub softirq: u64,

    /// Time stolen by the hypervisor for other guests.
    /// Source: `/proc/stat` column 8
    pub steal: u64,
}

impl CpuSnapshot {
    /// Total ticks accumulated across every state.
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    /// Ticks the core spent not doing useful work (idle + I/O wait).
    pub fn idle_time(&self) -> u64 {
        self.idle + self.iowait
    }
}

/// Cumulative I/O counters for one block device.
///
/// Source: one line of `/proc/diskstats` (first 14 columns). Tick fields
/// are milliseconds.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct DiskSnapshot {
    /// Block device major number.
    pub major: u32,
    /// Block device minor number.
    pub minor: u32,
    /// Device label (sda, nvme0n1, ...). On Windows this is the drive
    /// letter pair (`C:`).
    pub device: String,

    /// Reads completed.
    pub reads: u64,
    /// Read requests merged.
    pub read_merges: u64,
    /// Sectors read.
    pub read_sectors: u64,
    /// Milliseconds spent reading.
    pub read_ticks: u64,
    /// Writes completed.
    pub writes: u64,
    /// Write requests merged.
    pub write_merges: u64,
    /// Sectors written.
    pub write_sectors: u64,
    /// Milliseconds spent writing.
    pub write_ticks: u64,
    /// Requests currently in flight.
    pub in_flight: u64,
    /// Milliseconds the device had at least one request outstanding.
    pub io_ticks: u64,
    /// Weighted milliseconds spent doing I/O.
    pub time_in_queue: u64,
}

impl DiskSnapshot {
    /// Milliseconds the device spent servicing reads and writes.
    pub fn busy_time(&self) -> u64 {
        self.read_ticks + self.write_ticks
    }

    /// Milliseconds the device queue was non-empty.
    pub fn queue_time(&self) -> u64 {
        self.io_ticks
    }
}

/// Point-in-time view of one process.
///
/// Identity is the pid, which the OS may recycle between two reads of a
/// delta pair; that imprecision is accepted rather than detected.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ProcessSnapshot {
    /// Process id.
    pub pid: u32,
    /// Executable name.
    /// Source: `/proc/<pid>/comm`
    pub name: String,
    /// Executable path (first `cmdline` argument; may be empty for kernel
    /// threads).
    pub exe_path: String,
    /// Resident set size in bytes.
    /// Source: `VmRSS` in `/proc/<pid>/status`
    pub rss_bytes: u64,
    /// Cumulative kernel-mode ticks.
    /// Source: `stime` in `/proc/<pid>/stat`
    pub kernel_ticks: u64,
    /// Cumulative user-mode ticks.
    /// Source: `utime` in `/proc/<pid>/stat`
    pub user_ticks: u64,
}

impl ProcessSnapshot {
    /// Total CPU ticks the process has consumed.
    pub fn cpu_ticks(&self) -> u64 {
        self.kernel_ticks + self.user_ticks
    }
}

/// Aggregate memory and pagefile status, in bytes.
///
/// Point-in-time only; never fed to the delta calculator. On Unix the
/// pagefile figures are physical + swap, on Windows they come straight
/// from the committed-page totals.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct MemorySnapshot {
    pub physical_total: u64,
    pub physical_available: u64,
    pub pagefile_total: u64,
    pub pagefile_available: u64,
}
