//! Pure delta computation over pairs of same-identity snapshots.
//!
//! All functions are total: a zero elapsed window (identical counters, or
//! a window of zero duration) is defined as 0% usage, never a division by
//! zero. Counter regressions from read skew or a host reboot are treated
//! as zero deltas rather than errors, and results are clamped to [0, 100].

use std::time::Duration;

use crate::model::{CpuSnapshot, DiskSnapshot, ProcessSnapshot};

/// CPU utilization between two reads of the same core (or of the
/// aggregate line): busy ticks over elapsed ticks.
pub fn cpu_usage(first: &CpuSnapshot, second: &CpuSnapshot) -> f64 {
    let elapsed = second.total().saturating_sub(first.total());
    if elapsed == 0 {
        return 0.0;
    }
    let idle = second.idle_time().saturating_sub(first.idle_time());
    let busy = elapsed.saturating_sub(idle);
    (busy as f64 / elapsed as f64 * 100.0).clamp(0.0, 100.0)
}

/// Disk utilization between two reads of the same device: milliseconds
/// the device spent servicing requests, over the wall-clock window the
/// two reads were taken across.
pub fn disk_usage(first: &DiskSnapshot, second: &DiskSnapshot, window: Duration) -> f64 {
    let elapsed_ms = window.as_millis() as u64;
    if elapsed_ms == 0 {
        return 0.0;
    }
    let busy = second.busy_time().saturating_sub(first.busy_time());
    (busy as f64 / elapsed_ms as f64 * 100.0).clamp(0.0, 100.0)
}

/// CPU utilization of one process, normalized against the system-wide
/// tick budget that elapsed in the same window.
///
/// Summing this over every process approximates the aggregate CPU usage
/// for the window.
pub fn process_cpu_usage(
    proc_first: &ProcessSnapshot,
    proc_second: &ProcessSnapshot,
    cpu_first: &CpuSnapshot,
    cpu_second: &CpuSnapshot,
) -> f64 {
    let budget = cpu_second.total().saturating_sub(cpu_first.total());
    if budget == 0 {
        return 0.0;
    }
    let consumed = proc_second.cpu_ticks().saturating_sub(proc_first.cpu_ticks());
    (consumed as f64 / budget as f64 * 100.0).clamp(0.0, 100.0)
}
