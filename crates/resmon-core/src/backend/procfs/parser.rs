//! Pure parsers for the `/proc` text formats the backend consumes.
//!
//! Each function takes file content as a string and returns structured
//! data, so the formats are testable without a Linux host. Positional
//! layouts follow `man 5 proc`.

use crate::model::{CpuSnapshot, DiskSnapshot, MemorySnapshot};
use crate::units;

/// A line had fewer fields than its format requires, or a field failed to
/// parse.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// One `cpu` line of `/proc/stat`: the label's core index (`None` for the
/// aggregate `cpu ` line) and its tick counters.
pub fn parse_cpu_line(line: &str) -> Result<(Option<u32>, CpuSnapshot), ParseError> {
    let mut fields = line.split_whitespace();
    let label = fields
        .next()
        .ok_or_else(|| ParseError::new("empty cpu line"))?;

    // Match the label as a whole token so `cpu1` never matches `cpu12`.
    let core = if label == "cpu" {
        None
    } else {
        let index = label
            .strip_prefix("cpu")
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| ParseError::new(format!("not a cpu line: {label}")))?;
        Some(index)
    };

    let mut ticks = [0u64; 8];
    for (i, slot) in ticks.iter_mut().enumerate() {
        *slot = fields
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ParseError::new(format!("cpu line missing field {}", i + 1)))?;
    }

    Ok((
        core,
        CpuSnapshot {
            user: ticks[0],
            nice: ticks[1],
            system: ticks[2],
            idle: ticks[3],
            iowait: ticks[4],
            irq: ticks[5],
            softirq: ticks[6],
            steal: ticks[7],
        },
    ))
}

/// Every `cpu` line of `/proc/stat`, in file order.
pub fn parse_stat_cpus(content: &str) -> Vec<(Option<u32>, CpuSnapshot)> {
    content
        .lines()
        .take_while(|line| line.starts_with("cpu"))
        .filter_map(|line| parse_cpu_line(line).ok())
        .collect()
}

/// One line of `/proc/diskstats`: 14 whitespace-separated fields minimum
/// (newer kernels append discard/flush columns, which are ignored).
pub fn parse_disk_line(line: &str) -> Result<DiskSnapshot, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 14 {
        return Err(ParseError::new(format!(
            "diskstats line has {} fields, expected 14+",
            fields.len()
        )));
    }

    let num = |idx: usize| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid diskstats field {idx}")))
    };

    Ok(DiskSnapshot {
        major: num(0)? as u32,
        minor: num(1)? as u32,
        device: fields[2].to_string(),
        reads: num(3)?,
        read_merges: num(4)?,
        read_sectors: num(5)?,
        read_ticks: num(6)?,
        writes: num(7)?,
        write_merges: num(8)?,
        write_sectors: num(9)?,
        write_ticks: num(10)?,
        in_flight: num(11)?,
        io_ticks: num(12)?,
        time_in_queue: num(13)?,
    })
}

/// The fields of `/proc/<pid>/stat` this backend needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PidStat {
    pub comm: String,
    pub utime: u64,
    pub stime: u64,
}

/// Parses `/proc/<pid>/stat`.
///
/// The comm field can itself contain spaces and parentheses, so fixed
/// whitespace indices over the whole line are wrong for names like
/// `(Web Content)`. The comm is taken between the first `(` and the
/// *last* `)`, and utime/stime are counted from the closing paren:
/// fields 11 and 12 of the remainder.
pub fn parse_pid_stat(content: &str) -> Result<PidStat, ParseError> {
    let content = content.trim();
    let open = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in pid stat"))?;
    let close = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in pid stat"))?;
    if close <= open {
        return Err(ParseError::new("invalid parentheses in pid stat"));
    }

    let comm = content[open + 1..close].to_string();
    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();

    let tick = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields
            .get(idx)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ParseError::new(format!("missing {name} in pid stat")))
    };

    Ok(PidStat {
        comm,
        utime: tick(11, "utime")?,
        stime: tick(12, "stime")?,
    })
}

/// Resident set size in bytes from `/proc/<pid>/status`, or `None` when
/// the process has no `VmRSS` line (kernel threads, zombies).
pub fn parse_vm_rss(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let mut parts = rest.split_whitespace();
            let value: u64 = parts.next()?.parse().ok()?;
            let unit = parts.next().unwrap_or("");
            return Some(units::to_bytes(value, unit));
        }
    }
    None
}

/// Parses `/proc/meminfo` into a [`MemorySnapshot`].
///
/// Each relevant line is `<key>: <value> <unit>`; values are scaled to
/// bytes through the unit token. Pagefile figures are composed as
/// physical + swap. A file without `MemTotal` is rejected as malformed.
pub fn parse_meminfo(content: &str) -> Result<MemorySnapshot, ParseError> {
    let mut mem_total = None;
    let mut mem_available = 0;
    let mut swap_total = 0;
    let mut swap_free = 0;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let mut parts = rest.split_whitespace();
        let value: u64 = match parts.next().and_then(|s| s.parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        let bytes = units::to_bytes(value, parts.next().unwrap_or(""));

        match key {
            "MemTotal" => mem_total = Some(bytes),
            "MemAvailable" => mem_available = bytes,
            "SwapTotal" => swap_total = bytes,
            "SwapFree" => swap_free = bytes,
            _ => {}
        }
    }

    let physical_total =
        mem_total.ok_or_else(|| ParseError::new("meminfo missing MemTotal"))?;

    Ok(MemorySnapshot {
        physical_total,
        physical_available: mem_available,
        pagefile_total: physical_total + swap_total,
        pagefile_available: mem_available + swap_free,
    })
}
