//! Performance-counter path grammar.
//!
//! Pure string builders, kept platform-independent so the exact paths
//! handed to the counter subsystem stay testable anywhere.

/// `% Processor Time` path for one core, or for the `_Total` instance
/// when no core is given. The leading `0,` is the processor group.
pub fn processor_time(core: Option<usize>) -> String {
    match core {
        Some(index) => format!(r"\Processor Information(0,{index})\% Processor Time"),
        None => r"\Processor Information(0,_Total)\% Processor Time".to_string(),
    }
}

/// `% Processor Time` path for one process instance.
///
/// The instance name is the executable name with a trailing `.exe`
/// stripped, disambiguated by pid.
pub fn process_time(name: &str, pid: u32) -> String {
    let short = name.strip_suffix(".exe").unwrap_or(name);
    format!(r"\Process V2({short}:{pid})\% Processor Time")
}

/// `% Idle Time` path for one physical disk, `*` when the physical index
/// is unknown. The label is normalized to a single trailing colon.
pub fn disk_idle_time(label: &str, physical_index: Option<u32>) -> String {
    let label = label.trim_end_matches(':');
    match physical_index {
        Some(index) => format!(r"\PhysicalDisk({index} {label}:)\% Idle Time"),
        None => format!(r"\PhysicalDisk(* {label}:)\% Idle Time"),
    }
}
