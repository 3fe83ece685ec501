//! Concurrent batch sampler.
//!
//! Turns one counter source into utilization figures for N entities
//! while keeping the wall-clock cost close to a single delay window,
//! however many entities are measured. The batch protocol:
//!
//! 1. first-sample reads for every target, one OS thread each;
//! 2. one shared wait for the sampling window;
//! 3. second-sample reads and delta computation, again one thread per
//!    target;
//! 4. join everything before returning, results in spawn order.
//!
//! Sources that measure usage directly (the performance-counter engine
//! waits out its own window inside each query) skip the two-read dance:
//! the batch becomes one concurrent direct read per target.
//!
//! Per-entity failures become `None`/zero values plus a diagnostic
//! message; they never abort the rest of the batch. Only failing to
//! enumerate anything empties the whole report.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregate::{self, ProcessGroup};
use crate::backend::{MetricSource, SampleError};
use crate::delta;
use crate::model::{MemorySnapshot, ProcessSnapshot};

/// Default sampling window between the two reads of a delta pair.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

/// Utilization of one core. `percent` is `None` when the core could not
/// be sampled.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CoreUsage {
    pub core: usize,
    pub percent: Option<f64>,
}

/// Utilization of one block device.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DiskUsage {
    pub device: String,
    pub percent: Option<f64>,
}

/// One process with its CPU share of the sampling window.
///
/// `exited` marks a process that disappeared between the two samples;
/// its usage is defined as 0 and aggregation skips it.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ProcessUsage {
    pub process: ProcessSnapshot,
    pub cpu_percent: f64,
    pub exited: bool,
}

/// Result of one batch: per-entity values in enumeration order, plus
/// messages for the entities (or the whole batch) that could not be
/// sampled.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct BatchReport<T> {
    pub values: Vec<T>,
    pub diagnostics: Vec<String>,
}

impl<T> BatchReport<T> {
    fn new() -> Self {
        Self {
            values: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn failed(message: String) -> Self {
        tracing::warn!("{message}");
        Self {
            values: Vec::new(),
            diagnostics: vec![message],
        }
    }

    fn diag(&mut self, message: String) {
        tracing::debug!("{message}");
        self.diagnostics.push(message);
    }

    /// True when every enumerated entity produced a value.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Runs one closure per target on its own thread, joins them all, and
/// returns the outcomes in spawn order. A panicking worker is folded
/// into a per-target error; nothing unwinds past the batch.
fn fan_out<T, V>(
    targets: Vec<T>,
    run: impl Fn(T) -> Result<V, SampleError> + Send + Sync,
) -> Vec<Result<V, SampleError>>
where
    T: Send,
    V: Send,
{
    thread::scope(|scope| {
        let run = &run;
        let handles: Vec<_> = targets
            .into_iter()
            .map(|target| scope.spawn(move || run(target)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(SampleError::Unavailable("sampling worker panicked".into()))
                })
            })
            .collect()
    })
}

/// Batch sampler over one injected counter source.
pub struct BatchSampler<S: MetricSource> {
    source: S,
    window: Duration,
}

impl<S: MetricSource> BatchSampler<S> {
    /// Creates a sampler with the nominal one-second window.
    pub fn new(source: S) -> Self {
        Self::with_window(source, DEFAULT_WINDOW)
    }

    pub fn with_window(source: S, window: Duration) -> Self {
        Self { source, window }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Utilization of one core (aggregate when `core` is omitted).
    pub fn cpu_usage(&self, core: Option<usize>) -> Result<f64, SampleError> {
        if self.source.measures_usage_directly() {
            return self.source.direct_cpu_usage(core);
        }
        let first = self.source.read_cpu(core)?;
        thread::sleep(self.window);
        let second = self.source.read_cpu(core)?;
        Ok(delta::cpu_usage(&first, &second))
    }

    /// Utilization of every core across one shared window.
    pub fn core_usages(&self) -> BatchReport<CoreUsage> {
        let count = self.source.processor_count();
        if count == 0 {
            return BatchReport::failed("cannot enumerate processors".into());
        }
        let cores: Vec<usize> = (0..count).collect();

        let outcomes = if self.source.measures_usage_directly() {
            fan_out(cores, |core| self.source.direct_cpu_usage(Some(core)))
        } else {
            let firsts = fan_out(cores.clone(), |core| self.source.read_cpu(Some(core)));
            thread::sleep(self.window);
            let pairs: Vec<_> = cores.into_iter().zip(firsts).collect();
            fan_out(pairs, |(core, first)| {
                let first = first?;
                let second = self.source.read_cpu(Some(core))?;
                Ok(delta::cpu_usage(&first, &second))
            })
        };

        let mut report = BatchReport::new();
        for (core, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(percent) => report.values.push(CoreUsage {
                    core,
                    percent: Some(percent),
                }),
                Err(e) => {
                    report.values.push(CoreUsage {
                        core,
                        percent: None,
                    });
                    report.diag(format!("cpu core {core}: {e}"));
                }
            }
        }
        report
    }

    /// Utilization of one block device.
    pub fn disk_usage(&self, label: &str) -> Result<f64, SampleError> {
        if self.source.measures_usage_directly() {
            return self.source.direct_disk_usage(label);
        }
        let first = self.source.read_disk(label)?;
        thread::sleep(self.window);
        let second = self.source.read_disk(label)?;
        Ok(delta::disk_usage(&first, &second, self.window))
    }

    /// Utilization of every enumerated block device across one shared
    /// window.
    pub fn disk_usages(&self) -> BatchReport<DiskUsage> {
        let labels = match self.source.list_logical_disks() {
            Ok(labels) => labels,
            Err(e) => return BatchReport::failed(format!("cannot enumerate disks: {e}")),
        };

        let outcomes = if self.source.measures_usage_directly() {
            fan_out(labels.clone(), |label| self.source.direct_disk_usage(&label))
        } else {
            let firsts = fan_out(labels.clone(), |label| self.source.read_disk(&label));
            thread::sleep(self.window);
            let pairs: Vec<_> = labels.clone().into_iter().zip(firsts).collect();
            fan_out(pairs, |(label, first)| {
                let first = first?;
                let second = self.source.read_disk(&label)?;
                Ok(delta::disk_usage(&first, &second, self.window))
            })
        };

        let mut report = BatchReport::new();
        for (label, outcome) in labels.into_iter().zip(outcomes) {
            match outcome {
                Ok(percent) => report.values.push(DiskUsage {
                    device: label,
                    percent: Some(percent),
                }),
                Err(e) => {
                    report.diag(format!("disk {label}: {e}"));
                    report.values.push(DiskUsage {
                        device: label,
                        percent: None,
                    });
                }
            }
        }
        report
    }

    /// Every live process with its CPU share of one shared window.
    ///
    /// Processes that exit before the first read are skipped (the
    /// enumeration was advisory); processes that exit between the reads
    /// are reported with zero usage and `exited` set.
    pub fn process_usages(&self) -> BatchReport<ProcessUsage> {
        let pids = match self.source.list_process_ids() {
            Ok(pids) => pids,
            Err(e) => return BatchReport::failed(format!("cannot enumerate processes: {e}")),
        };

        let mut report = BatchReport::new();

        if self.source.measures_usage_directly() {
            let outcomes = fan_out(pids, |pid| {
                let process = self.source.read_process(pid)?;
                let cpu_percent = self.source.direct_process_cpu_usage(pid, &process.name)?;
                Ok(ProcessUsage {
                    process,
                    cpu_percent,
                    exited: false,
                })
            });
            for outcome in outcomes {
                match outcome {
                    Ok(usage) => report.values.push(usage),
                    Err(SampleError::NotFound(_)) => {}
                    Err(e) => report.diag(format!("process sample: {e}")),
                }
            }
            return report;
        }

        let cpu_first = match self.source.read_cpu(None) {
            Ok(snap) => snap,
            Err(e) => return BatchReport::failed(format!("cannot read cpu counters: {e}")),
        };
        let firsts = fan_out(pids.clone(), |pid| self.source.read_process(pid));

        thread::sleep(self.window);

        let cpu_second = match self.source.read_cpu(None) {
            Ok(snap) => snap,
            Err(e) => return BatchReport::failed(format!("cannot read cpu counters: {e}")),
        };

        let mut live = Vec::new();
        for (pid, outcome) in pids.into_iter().zip(firsts) {
            match outcome {
                Ok(snap) => live.push(snap),
                Err(SampleError::NotFound(_)) => {}
                Err(e) => report.diag(format!("process {pid}: {e}")),
            }
        }
        let live_pids: Vec<u32> = live.iter().map(|snap| snap.pid).collect();

        let outcomes = fan_out(live, |first| {
            match self.source.read_process(first.pid) {
                Ok(second) => {
                    let cpu_percent =
                        delta::process_cpu_usage(&first, &second, &cpu_first, &cpu_second);
                    Ok(ProcessUsage {
                        process: second,
                        cpu_percent,
                        exited: false,
                    })
                }
                // Exited inside the window: defined as zero usage, kept
                // in the detail list, excluded from aggregation.
                Err(SampleError::NotFound(_)) => Ok(ProcessUsage {
                    process: first,
                    cpu_percent: 0.0,
                    exited: true,
                }),
                Err(e) => Err(e),
            }
        });
        for (pid, outcome) in live_pids.into_iter().zip(outcomes) {
            match outcome {
                Ok(usage) => report.values.push(usage),
                Err(e) => report.diag(format!("process {pid}: {e}")),
            }
        }
        report
    }

    /// Per-process batch folded into name-keyed groups.
    pub fn process_groups(&self) -> BatchReport<ProcessGroup> {
        let detail = self.process_usages();
        BatchReport {
            values: aggregate::group_by_executable_name(&detail.values),
            diagnostics: detail.diagnostics,
        }
    }

    /// Point-in-time memory and pagefile status.
    pub fn memory_status(&self) -> Result<MemorySnapshot, SampleError> {
        self.source.read_memory()
    }

    /// Executable name of one process.
    pub fn process_name(&self, pid: u32) -> Result<String, SampleError> {
        self.source.read_process(pid).map(|snap| snap.name)
    }

    /// Pids whose executable name matches `name` exactly.
    pub fn pids_named(&self, name: &str) -> Result<Vec<u32>, SampleError> {
        let pids = self.source.list_process_ids()?;
        let outcomes = fan_out(pids, |pid| self.source.read_process(pid));
        Ok(outcomes
            .into_iter()
            .filter_map(|outcome| outcome.ok())
            .filter(|snap| snap.name == name)
            .map(|snap| snap.pid)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CpuSnapshot, DiskSnapshot};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Synthetic source whose counters advance on every read, so each
    /// read pair yields a known delta: 40% busy per cpu read pair, 10
    /// process ticks per read pair, 50ms of disk busy time per read
    /// pair.
    struct TickingSource {
        cores: usize,
        pids: Vec<u32>,
        disks: Vec<String>,
        gone_after_first: Vec<u32>,
        cpu_reads: Mutex<HashMap<Option<usize>, u64>>,
        proc_reads: Mutex<HashMap<u32, u64>>,
        disk_reads: Mutex<HashMap<String, u64>>,
    }

    impl TickingSource {
        fn new(cores: usize, pids: Vec<u32>, disks: Vec<String>) -> Self {
            Self {
                cores,
                pids,
                disks,
                gone_after_first: Vec::new(),
                cpu_reads: Mutex::new(HashMap::new()),
                proc_reads: Mutex::new(HashMap::new()),
                disk_reads: Mutex::new(HashMap::new()),
            }
        }

        fn gone_after_first(mut self, pids: Vec<u32>) -> Self {
            self.gone_after_first = pids;
            self
        }

        fn name_for(pid: u32) -> String {
            let name = if pid % 2 == 1 { "alpha" } else { "beta" };
            name.to_string()
        }
    }

    impl MetricSource for TickingSource {
        fn read_cpu(&self, core: Option<usize>) -> Result<CpuSnapshot, SampleError> {
            let mut reads = self.cpu_reads.lock().unwrap();
            let k = reads.entry(core).or_insert(0);
            *k += 1;
            let k = *k;
            Ok(CpuSnapshot {
                user: 30 * k,
                system: 10 * k,
                idle: 60 * k,
                ..Default::default()
            })
        }

        fn read_all_cpus(&self) -> Result<Vec<CpuSnapshot>, SampleError> {
            (0..self.cores).map(|core| self.read_cpu(Some(core))).collect()
        }

        fn read_disk(&self, label: &str) -> Result<DiskSnapshot, SampleError> {
            if !self.disks.iter().any(|d| d == label) {
                return Err(SampleError::NotFound(format!("disk {label}")));
            }
            let mut reads = self.disk_reads.lock().unwrap();
            let k = reads.entry(label.to_string()).or_insert(0);
            *k += 1;
            let k = *k;
            Ok(DiskSnapshot {
                device: label.to_string(),
                read_ticks: 20 * k,
                write_ticks: 30 * k,
                ..Default::default()
            })
        }

        fn read_all_disks(&self) -> Result<Vec<DiskSnapshot>, SampleError> {
            self.disks.iter().map(|label| self.read_disk(label)).collect()
        }

        fn read_process(&self, pid: u32) -> Result<ProcessSnapshot, SampleError> {
            if !self.pids.contains(&pid) {
                return Err(SampleError::NotFound(format!("process {pid}")));
            }
            let mut reads = self.proc_reads.lock().unwrap();
            let k = reads.entry(pid).or_insert(0);
            *k += 1;
            let k = *k;
            if k >= 2 && self.gone_after_first.contains(&pid) {
                return Err(SampleError::NotFound(format!("process {pid}")));
            }
            Ok(ProcessSnapshot {
                pid,
                name: Self::name_for(pid),
                exe_path: format!("/usr/bin/{}", Self::name_for(pid)),
                rss_bytes: 1000 * pid as u64,
                kernel_ticks: 5 * k,
                user_ticks: 5 * k,
            })
        }

        fn read_memory(&self) -> Result<MemorySnapshot, SampleError> {
            Ok(MemorySnapshot {
                physical_total: 1 << 30,
                physical_available: 1 << 29,
                pagefile_total: 1 << 31,
                pagefile_available: 1 << 30,
            })
        }

        fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
            Ok(self.pids.clone())
        }

        fn list_logical_disks(&self) -> Result<Vec<String>, SampleError> {
            Ok(self.disks.clone())
        }

        fn processor_count(&self) -> usize {
            self.cores
        }

        fn clock_ticks_per_second(&self) -> f64 {
            100.0
        }
    }

    fn fast_sampler(source: TickingSource) -> BatchSampler<TickingSource> {
        BatchSampler::with_window(source, Duration::from_millis(20))
    }

    #[test]
    fn core_batch_computes_one_delta_per_core() {
        let sampler = fast_sampler(TickingSource::new(3, vec![], vec![]));
        let report = sampler.core_usages();
        assert!(report.is_complete());
        assert_eq!(report.values.len(), 3);
        for (core, usage) in report.values.iter().enumerate() {
            assert_eq!(usage.core, core);
            // 40 busy ticks of 100 elapsed per read pair.
            assert_eq!(usage.percent, Some(40.0));
        }
    }

    #[test]
    fn disk_batch_uses_the_window_as_elapsed_time() {
        let source = TickingSource::new(1, vec![], vec!["sda".into(), "sdb".into()]);
        let sampler = BatchSampler::with_window(source, Duration::from_millis(100));
        let report = sampler.disk_usages();
        assert!(report.is_complete());
        assert_eq!(report.values.len(), 2);
        for usage in &report.values {
            // 50ms of busy time across a 100ms window.
            assert_eq!(usage.percent, Some(50.0));
        }
    }

    #[test]
    fn process_batch_normalizes_against_system_budget() {
        let sampler = fast_sampler(TickingSource::new(1, vec![1, 2, 3], vec![]));
        let report = sampler.process_usages();
        assert!(report.is_complete());
        assert_eq!(report.values.len(), 3);
        for usage in &report.values {
            // 10 process ticks of a 100-tick system budget.
            assert_eq!(usage.cpu_percent, 10.0);
            assert!(!usage.exited);
        }
    }

    #[test]
    fn process_exiting_inside_the_window_reads_as_zero() {
        let source = TickingSource::new(1, vec![1, 2, 3], vec![]).gone_after_first(vec![2]);
        let sampler = fast_sampler(source);
        let report = sampler.process_usages();

        assert_eq!(report.values.len(), 3);
        let gone = report.values.iter().find(|u| u.process.pid == 2).unwrap();
        assert!(gone.exited);
        assert_eq!(gone.cpu_percent, 0.0);

        // Still alive entries keep their usage.
        let alive = report.values.iter().find(|u| u.process.pid == 1).unwrap();
        assert_eq!(alive.cpu_percent, 10.0);
    }

    #[test]
    fn groups_skip_processes_that_exited_mid_window() {
        // Pids 1 and 3 are "alpha", 2 is "beta" and exits mid-window.
        let source = TickingSource::new(1, vec![1, 2, 3], vec![]).gone_after_first(vec![2]);
        let sampler = fast_sampler(source);
        let report = sampler.process_groups();

        assert_eq!(report.values.len(), 1);
        let alpha = &report.values[0];
        assert_eq!(alpha.name, "alpha");
        assert_eq!(alpha.members.len(), 2);
        assert_eq!(alpha.cpu_percent, 20.0);
    }

    #[test]
    fn unknown_disk_is_a_marker_not_a_batch_failure() {
        struct OneBadDisk(TickingSource);
        impl MetricSource for OneBadDisk {
            fn read_cpu(&self, core: Option<usize>) -> Result<CpuSnapshot, SampleError> {
                self.0.read_cpu(core)
            }
            fn read_all_cpus(&self) -> Result<Vec<CpuSnapshot>, SampleError> {
                self.0.read_all_cpus()
            }
            fn read_disk(&self, label: &str) -> Result<DiskSnapshot, SampleError> {
                self.0.read_disk(label)
            }
            fn read_all_disks(&self) -> Result<Vec<DiskSnapshot>, SampleError> {
                self.0.read_all_disks()
            }
            fn read_process(&self, pid: u32) -> Result<ProcessSnapshot, SampleError> {
                self.0.read_process(pid)
            }
            fn read_memory(&self) -> Result<MemorySnapshot, SampleError> {
                self.0.read_memory()
            }
            fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
                self.0.list_process_ids()
            }
            fn list_logical_disks(&self) -> Result<Vec<String>, SampleError> {
                // One label the reads will reject.
                Ok(vec!["sda".into(), "ghost".into()])
            }
            fn processor_count(&self) -> usize {
                self.0.processor_count()
            }
            fn clock_ticks_per_second(&self) -> f64 {
                self.0.clock_ticks_per_second()
            }
        }

        let source = OneBadDisk(TickingSource::new(1, vec![], vec!["sda".into()]));
        let sampler = BatchSampler::with_window(source, Duration::from_millis(100));
        let report = sampler.disk_usages();

        assert_eq!(report.values.len(), 2);
        assert_eq!(report.values[0].percent, Some(50.0));
        assert_eq!(report.values[1].percent, None);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].contains("ghost"));
    }

    /// Source in the shape of the performance-counter engine: every
    /// direct read blocks for the full window on its own.
    struct SlowDirectSource {
        pids: Vec<u32>,
        window: Duration,
    }

    impl MetricSource for SlowDirectSource {
        fn read_cpu(&self, _core: Option<usize>) -> Result<CpuSnapshot, SampleError> {
            Err(SampleError::Unavailable("direct source".into()))
        }
        fn read_all_cpus(&self) -> Result<Vec<CpuSnapshot>, SampleError> {
            Err(SampleError::Unavailable("direct source".into()))
        }
        fn read_disk(&self, _label: &str) -> Result<DiskSnapshot, SampleError> {
            Err(SampleError::Unavailable("direct source".into()))
        }
        fn read_all_disks(&self) -> Result<Vec<DiskSnapshot>, SampleError> {
            Err(SampleError::Unavailable("direct source".into()))
        }
        fn read_process(&self, pid: u32) -> Result<ProcessSnapshot, SampleError> {
            Ok(ProcessSnapshot {
                pid,
                name: format!("proc{pid}"),
                ..Default::default()
            })
        }
        fn read_memory(&self) -> Result<MemorySnapshot, SampleError> {
            Ok(MemorySnapshot::default())
        }
        fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
            Ok(self.pids.clone())
        }
        fn list_logical_disks(&self) -> Result<Vec<String>, SampleError> {
            Ok(Vec::new())
        }
        fn processor_count(&self) -> usize {
            1
        }
        fn clock_ticks_per_second(&self) -> f64 {
            100.0
        }
        fn measures_usage_directly(&self) -> bool {
            true
        }
        fn direct_cpu_usage(&self, _core: Option<usize>) -> Result<f64, SampleError> {
            thread::sleep(self.window);
            Ok(12.5)
        }
        fn direct_process_cpu_usage(&self, _pid: u32, _name: &str) -> Result<f64, SampleError> {
            thread::sleep(self.window);
            Ok(3.0)
        }
    }

    #[test]
    fn direct_reads_are_preferred_when_offered() {
        let source = SlowDirectSource {
            pids: vec![],
            window: Duration::from_millis(1),
        };
        let sampler = BatchSampler::with_window(source, Duration::from_millis(1));
        assert_eq!(sampler.cpu_usage(None).unwrap(), 12.5);
    }

    #[test]
    fn batch_latency_stays_near_one_window_for_many_entities() {
        let window = Duration::from_millis(500);
        let pids: Vec<u32> = (1..=50).collect();
        let sampler =
            BatchSampler::with_window(SlowDirectSource { pids, window }, window);

        let started = Instant::now();
        let report = sampler.process_usages();
        let elapsed = started.elapsed();

        assert_eq!(report.values.len(), 50);
        assert!(report.is_complete());
        // Fifty sequential windows would be 25 seconds; the batch must
        // stay close to one.
        assert!(
            elapsed < Duration::from_secs(5),
            "batch took {elapsed:?} for 50 entities"
        );
    }

    #[test]
    fn counter_batch_latency_is_one_shared_window() {
        let window = Duration::from_millis(300);
        let pids: Vec<u32> = (1..=50).collect();
        let sampler = BatchSampler::with_window(TickingSource::new(2, pids, vec![]), window);

        let started = Instant::now();
        let report = sampler.process_usages();
        let elapsed = started.elapsed();

        assert_eq!(report.values.len(), 50);
        assert!(elapsed < Duration::from_secs(5), "batch took {elapsed:?}");
    }

    #[test]
    fn panicking_worker_becomes_a_diagnostic() {
        struct PanickySource(TickingSource);
        impl MetricSource for PanickySource {
            fn read_cpu(&self, core: Option<usize>) -> Result<CpuSnapshot, SampleError> {
                self.0.read_cpu(core)
            }
            fn read_all_cpus(&self) -> Result<Vec<CpuSnapshot>, SampleError> {
                self.0.read_all_cpus()
            }
            fn read_disk(&self, label: &str) -> Result<DiskSnapshot, SampleError> {
                self.0.read_disk(label)
            }
            fn read_all_disks(&self) -> Result<Vec<DiskSnapshot>, SampleError> {
                self.0.read_all_disks()
            }
            fn read_process(&self, pid: u32) -> Result<ProcessSnapshot, SampleError> {
                assert!(pid != 2, "injected worker failure");
                self.0.read_process(pid)
            }
            fn read_memory(&self) -> Result<MemorySnapshot, SampleError> {
                self.0.read_memory()
            }
            fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
                self.0.list_process_ids()
            }
            fn list_logical_disks(&self) -> Result<Vec<String>, SampleError> {
                self.0.list_logical_disks()
            }
            fn processor_count(&self) -> usize {
                self.0.processor_count()
            }
            fn clock_ticks_per_second(&self) -> f64 {
                self.0.clock_ticks_per_second()
            }
        }

        let source = PanickySource(TickingSource::new(1, vec![1, 2, 3], vec![]));
        let sampler = BatchSampler::with_window(source, Duration::from_millis(20));
        let report = sampler.process_usages();

        // Pids 1 and 3 still report; pid 2's panic became a diagnostic.
        assert_eq!(report.values.len(), 2);
        assert!(!report.diagnostics.is_empty());
    }

    #[test]
    fn lookup_helpers_filter_by_name() {
        let sampler = fast_sampler(TickingSource::new(1, vec![1, 2, 3], vec![]));
        assert_eq!(sampler.process_name(2).unwrap(), "beta");
        assert_eq!(sampler.pids_named("alpha").unwrap(), vec![1, 3]);
        assert!(matches!(
            sampler.process_name(99),
            Err(SampleError::NotFound(_))
        ));
    }
}
