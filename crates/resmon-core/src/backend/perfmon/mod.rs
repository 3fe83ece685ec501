//! Windows counter backend over the performance-counter subsystem.
//!
//! Utilization counters here are measured by the counter engine itself
//! across a wait window inside each query, so this source reports
//! `measures_usage_directly` and serves percentages through the
//! `direct_*` family instead of raw tick snapshots. Process identity and
//! memory still come from the process APIs, with every handle scoped to
//! the call that opened it.

pub mod paths;

#[cfg(windows)]
mod query;

#[cfg(windows)]
pub use source::PerfmonSource;

#[cfg(windows)]
mod source {
    use std::sync::OnceLock;
    use std::time::Duration;

    use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE, MAX_PATH};
    use windows_sys::Win32::Storage::FileSystem::{
        DRIVE_FIXED, GetDriveTypeW, GetLogicalDrives,
    };
    use windows_sys::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };
    use windows_sys::Win32::System::Performance::QueryPerformanceFrequency;
    use windows_sys::Win32::System::ProcessStatus::{
        K32GetModuleBaseNameW, K32GetModuleFileNameExW, K32GetProcessMemoryInfo,
        PROCESS_MEMORY_COUNTERS,
    };
    use windows_sys::Win32::System::SystemInformation::{
        GetSystemInfo, GlobalMemoryStatusEx, MEMORYSTATUSEX, SYSTEM_INFO,
    };
    use windows_sys::Win32::System::Threading::{
        GetProcessTimes, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
    };

    use super::paths;
    use super::query::{collect_double, wide};
    use crate::backend::{MetricSource, SampleError};
    use crate::model::{CpuSnapshot, DiskSnapshot, MemorySnapshot, ProcessSnapshot};

    /// Closes a process handle when the read that opened it returns.
    struct HandleGuard(HANDLE);

    impl Drop for HandleGuard {
        fn drop(&mut self) {
            unsafe {
                CloseHandle(self.0);
            }
        }
    }

    fn utf16_to_string(buf: &[u16]) -> String {
        let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        String::from_utf16_lossy(&buf[..len])
    }

    fn filetime_ticks(high: u32, low: u32) -> u64 {
        ((high as u64) << 32) | low as u64
    }

    /// Counter source over performance-counter queries and Win32 process
    /// APIs.
    pub struct PerfmonSource {
        /// Window each rate-counter query waits between its two
        /// collections.
        wait: Duration,
    }

    impl PerfmonSource {
        pub fn new() -> Self {
            Self {
                wait: Duration::from_secs(1),
            }
        }

        pub fn with_wait(mut self, wait: Duration) -> Self {
            self.wait = wait;
            self
        }

        fn open_process(&self, pid: u32) -> Result<HandleGuard, SampleError> {
            let handle = unsafe {
                OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, 0, pid)
            };
            if handle.is_null() {
                return Err(SampleError::NotFound(format!("process {pid}")));
            }
            Ok(HandleGuard(handle))
        }

        fn no_raw_counters() -> SampleError {
            SampleError::Unavailable(
                "performance counters measure usage directly; raw tick counters are not exposed"
                    .into(),
            )
        }
    }

    impl Default for PerfmonSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MetricSource for PerfmonSource {
        fn read_cpu(&self, _core: Option<usize>) -> Result<CpuSnapshot, SampleError> {
            Err(Self::no_raw_counters())
        }

        fn read_all_cpus(&self) -> Result<Vec<CpuSnapshot>, SampleError> {
            Err(Self::no_raw_counters())
        }

        fn read_disk(&self, _label: &str) -> Result<DiskSnapshot, SampleError> {
            Err(Self::no_raw_counters())
        }

        fn read_all_disks(&self) -> Result<Vec<DiskSnapshot>, SampleError> {
            Err(Self::no_raw_counters())
        }

        fn read_process(&self, pid: u32) -> Result<ProcessSnapshot, SampleError> {
            let handle = self.open_process(pid)?;

            let mut name_buf = [0u16; MAX_PATH as usize];
            let name_len = unsafe {
                K32GetModuleBaseNameW(
                    handle.0,
                    std::ptr::null_mut(),
                    name_buf.as_mut_ptr(),
                    name_buf.len() as u32,
                )
            };
            if name_len == 0 {
                return Err(SampleError::Unavailable(format!(
                    "cannot resolve module name for process {pid}"
                )));
            }
            let name = utf16_to_string(&name_buf);

            let mut path_buf = [0u16; MAX_PATH as usize];
            let path_len = unsafe {
                K32GetModuleFileNameExW(
                    handle.0,
                    std::ptr::null_mut(),
                    path_buf.as_mut_ptr(),
                    path_buf.len() as u32,
                )
            };
            let exe_path = if path_len > 0 {
                utf16_to_string(&path_buf)
            } else {
                String::new()
            };

            let cb = std::mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
            let mut counters: PROCESS_MEMORY_COUNTERS = unsafe { std::mem::zeroed() };
            counters.cb = cb;
            let rss_bytes = if unsafe {
                K32GetProcessMemoryInfo(handle.0, &mut counters, cb)
            } != 0
            {
                counters.WorkingSetSize as u64
            } else {
                0
            };

            let mut creation = unsafe { std::mem::zeroed() };
            let mut exit = unsafe { std::mem::zeroed() };
            let mut kernel = unsafe { std::mem::zeroed() };
            let mut user = unsafe { std::mem::zeroed() };
            let (kernel_ticks, user_ticks) = if unsafe {
                GetProcessTimes(handle.0, &mut creation, &mut exit, &mut kernel, &mut user)
            } != 0
            {
                (
                    filetime_ticks(kernel.dwHighDateTime, kernel.dwLowDateTime),
                    filetime_ticks(user.dwHighDateTime, user.dwLowDateTime),
                )
            } else {
                (0, 0)
            };

            Ok(ProcessSnapshot {
                pid,
                name,
                exe_path,
                rss_bytes,
                kernel_ticks,
                user_ticks,
            })
        }

        fn read_memory(&self) -> Result<MemorySnapshot, SampleError> {
            let mut status: MEMORYSTATUSEX = unsafe { std::mem::zeroed() };
            status.dwLength = std::mem::size_of::<MEMORYSTATUSEX>() as u32;
            if unsafe { GlobalMemoryStatusEx(&mut status) } == 0 {
                return Err(SampleError::Unavailable(
                    "GlobalMemoryStatusEx failed".into(),
                ));
            }
            Ok(MemorySnapshot {
                physical_total: status.ullTotalPhys,
                physical_available: status.ullAvailPhys,
                pagefile_total: status.ullTotalPageFile,
                pagefile_available: status.ullAvailPageFile,
            })
        }

        fn list_process_ids(&self) -> Result<Vec<u32>, SampleError> {
            let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
            if snapshot == INVALID_HANDLE_VALUE {
                return Err(SampleError::Unavailable(
                    "CreateToolhelp32Snapshot failed".into(),
                ));
            }
            let snapshot = HandleGuard(snapshot);

            let mut entry: PROCESSENTRY32W = unsafe { std::mem::zeroed() };
            entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as u32;

            let mut pids = Vec::new();
            if unsafe { Process32FirstW(snapshot.0, &mut entry) } != 0 {
                loop {
                    pids.push(entry.th32ProcessID);
                    if unsafe { Process32NextW(snapshot.0, &mut entry) } == 0 {
                        break;
                    }
                }
            }
            pids.sort_unstable();
            Ok(pids)
        }

        fn list_logical_disks(&self) -> Result<Vec<String>, SampleError> {
            let mask = unsafe { GetLogicalDrives() };
            if mask == 0 {
                return Err(SampleError::Unavailable("GetLogicalDrives failed".into()));
            }

            let mut labels = Vec::new();
            for (bit, letter) in ('A'..='Z').enumerate() {
                if mask & (1 << bit) == 0 {
                    continue;
                }
                let root = wide(&format!("{letter}:\\"));
                if unsafe { GetDriveTypeW(root.as_ptr()) } == DRIVE_FIXED {
                    labels.push(format!("{letter}:"));
                }
            }
            Ok(labels)
        }

        fn processor_count(&self) -> usize {
            let mut info: SYSTEM_INFO = unsafe { std::mem::zeroed() };
            unsafe { GetSystemInfo(&mut info) };
            info.dwNumberOfProcessors as usize
        }

        fn clock_ticks_per_second(&self) -> f64 {
            static FREQUENCY: OnceLock<f64> = OnceLock::new();
            *FREQUENCY.get_or_init(|| {
                let mut ticks = 0i64;
                if unsafe { QueryPerformanceFrequency(&mut ticks) } != 0 && ticks > 0 {
                    ticks as f64
                } else {
                    0.0
                }
            })
        }

        fn measures_usage_directly(&self) -> bool {
            true
        }

        fn direct_cpu_usage(&self, core: Option<usize>) -> Result<f64, SampleError> {
            collect_double(&paths::processor_time(core), self.wait)
        }

        fn direct_disk_usage(&self, label: &str) -> Result<f64, SampleError> {
            // The counter reports idle time; the usage figure is its
            // complement.
            let idle = collect_double(&paths::disk_idle_time(label, None), self.wait)?;
            Ok((100.0 - idle).clamp(0.0, 100.0))
        }

        fn direct_process_cpu_usage(&self, pid: u32, name: &str) -> Result<f64, SampleError> {
            collect_double(&paths::process_time(name, pid), self.wait)
        }
    }
}
