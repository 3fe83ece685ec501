//! resmon - host utilization reporter.
//!
//! Samples per-core CPU usage, per-disk busy time, per-process CPU and
//! memory over one delay window and prints the result as a text report
//! or a JSON document. `--watch` repeats until interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_os = "linux"))]
use resmon_core::backend::host_source;
use resmon_core::sampler::{BatchReport, BatchSampler};
use resmon_core::terminate::{self, KillOutcome};
#[cfg(target_os = "linux")]
use resmon_core::{ProcfsSource, RealFs};
use resmon_core::{MemorySnapshot, MetricSource, ProcessGroup};

/// Host utilization reporter.
#[derive(Parser)]
#[command(name = "resmon", about = "Host utilization reporter", version)]
struct Args {
    /// Sampling window in seconds.
    #[arg(short, long, default_value = "1")]
    interval: u64,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Forcibly terminate the process with this pid and exit.
    #[arg(long, value_name = "PID")]
    kill: Option<u32>,

    /// Repeat the report until interrupted.
    #[arg(short, long)]
    watch: bool,

    /// Emit one JSON document instead of the text report.
    #[arg(long)]
    json: bool,

    /// Number of process groups to show, sorted by CPU share.
    #[arg(long, default_value = "15")]
    top: usize,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("resmon={level}").parse().unwrap())
        .add_directive(format!("resmon_core={level}").parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Formats bytes as a human-readable size string.
fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;

    if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{bytes}B")
    }
}

fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(value) => format!("{value:5.1}%"),
        None => "    -".to_string(),
    }
}

/// The top `limit` groups by CPU share, heaviest first.
fn top_groups(mut groups: Vec<ProcessGroup>, limit: usize) -> Vec<ProcessGroup> {
    groups.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    groups.truncate(limit);
    groups
}

fn log_diagnostics<T>(what: &str, report: &BatchReport<T>) {
    for message in &report.diagnostics {
        warn!("{what}: {message}");
    }
}

fn print_memory(memory: &MemorySnapshot) {
    println!(
        "memory    {} of {} available",
        format_size(memory.physical_available),
        format_size(memory.physical_total)
    );
    println!(
        "pagefile  {} of {} available",
        format_size(memory.pagefile_available),
        format_size(memory.pagefile_total)
    );
}

fn join_report<T>(handle: thread::ScopedJoinHandle<'_, BatchReport<T>>) -> BatchReport<T> {
    handle.join().unwrap_or_else(|_| BatchReport {
        values: Vec::new(),
        diagnostics: vec!["sampling thread panicked".into()],
    })
}

fn run_once<S: MetricSource>(sampler: &BatchSampler<S>, args: &Args) {
    // The three batches share one wall-clock window instead of paying it
    // once each.
    let (cores, disks, groups, memory) = thread::scope(|scope| {
        let cores = scope.spawn(|| sampler.core_usages());
        let disks = scope.spawn(|| sampler.disk_usages());
        let groups = scope.spawn(|| sampler.process_groups());
        let memory = sampler.memory_status();
        (
            join_report(cores),
            join_report(disks),
            join_report(groups),
            memory,
        )
    });

    log_diagnostics("cpu", &cores);
    log_diagnostics("disk", &disks);
    log_diagnostics("process", &groups);

    let groups = top_groups(groups.values, args.top);

    if args.json {
        let document = serde_json::json!({
            "cores": cores.values,
            "disks": disks.values,
            "memory": memory.as_ref().ok(),
            "groups": groups,
        });
        println!("{document:#}");
        return;
    }

    println!("== cpu ==");
    for usage in &cores.values {
        println!("cpu{:<3} {}", usage.core, format_percent(usage.percent));
    }

    println!("== disks ==");
    for usage in &disks.values {
        println!("{:<10} {}", usage.device, format_percent(usage.percent));
    }

    println!("== memory ==");
    match &memory {
        Ok(memory) => print_memory(memory),
        Err(e) => warn!("memory status unavailable: {e}"),
    }

    println!("== processes ==");
    println!("{:<24} {:>4} {:>7} {:>8}", "NAME", "PIDS", "CPU", "MEMORY");
    for group in &groups {
        println!(
            "{:<24} {:>4} {:>6.1}% {:>8}",
            group.name,
            group.members.len(),
            group.cpu_percent,
            format_size(group.memory_bytes)
        );
    }
}

fn run<S: MetricSource>(source: S, args: &Args) {
    let window = Duration::from_secs(args.interval.max(1));
    let sampler = BatchSampler::with_window(source, window);

    info!(
        "sampling over a {}s window on {} cores, {} clock ticks/s",
        window.as_secs(),
        sampler.source().processor_count(),
        sampler.source().clock_ticks_per_second()
    );

    if !args.watch {
        run_once(&sampler, args);
        return;
    }

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    }) {
        warn!("failed to set Ctrl-C handler: {e}");
    }

    while running.load(Ordering::SeqCst) {
        if !args.json {
            println!();
            println!("---- {} ----", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        }
        run_once(&sampler, args);
    }
    debug!("watch loop stopped");
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Some(pid) = args.kill {
        match terminate::force_kill(pid) {
            KillOutcome::Killed => println!("terminated process {pid}"),
            KillOutcome::NotFound => {
                eprintln!("resmon: no process with pid {pid}");
                std::process::exit(1);
            }
            KillOutcome::Failed(reason) => {
                eprintln!("resmon: cannot terminate process {pid}: {reason}");
                std::process::exit(1);
            }
        }
        return;
    }

    info!("resmon {} starting", env!("CARGO_PKG_VERSION"));
    info!("Config: interval={}s, proc={}", args.interval, args.proc_path);

    #[cfg(target_os = "linux")]
    let source = ProcfsSource::new(RealFs::new(), args.proc_path.as_str());
    #[cfg(not(target_os = "linux"))]
    let source = {
        if args.proc_path != "/proc" {
            warn!("--proc-path only applies to the procfs backend, ignoring it");
        }
        host_source()
    };

    run(source, &args);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_format_with_binary_multiples() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(8 * 1024), "8.0K");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0M");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0G");
    }

    #[test]
    fn missing_percentages_render_as_dashes() {
        assert_eq!(format_percent(Some(12.5)), " 12.5%");
        assert_eq!(format_percent(None), "    -");
    }

    #[test]
    fn top_groups_sort_by_cpu_and_truncate() {
        let group = |name: &str, cpu: f64| ProcessGroup {
            name: name.to_string(),
            cpu_percent: cpu,
            ..Default::default()
        };
        let groups = top_groups(
            vec![group("idle", 0.5), group("busy", 42.0), group("mid", 7.0)],
            2,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "busy");
        assert_eq!(groups[1].name, "mid");
    }
}
