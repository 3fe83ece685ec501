//! Forced process termination.
//!
//! Kept deliberately blunt: the strongest signal the platform has, no
//! grace period. Callers wanting polite shutdown should signal the
//! process themselves first.

/// Outcome of a kill attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum KillOutcome {
    /// The kill was delivered.
    Killed,
    /// No such process.
    NotFound,
    /// The platform refused (typically insufficient privilege).
    Failed(String),
}

/// Forcibly terminates the process with `SIGKILL`.
#[cfg(unix)]
pub fn force_kill(pid: u32) -> KillOutcome {
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) };
    if rc == 0 {
        return KillOutcome::Killed;
    }
    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        KillOutcome::NotFound
    } else {
        KillOutcome::Failed(err.to_string())
    }
}

/// Forcibly terminates the process with `TerminateProcess`.
#[cfg(windows)]
pub fn force_kill(pid: u32) -> KillOutcome {
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{OpenProcess, PROCESS_TERMINATE, TerminateProcess};

    let handle = unsafe { OpenProcess(PROCESS_TERMINATE, 0, pid) };
    if handle.is_null() {
        return KillOutcome::NotFound;
    }
    let rc = unsafe { TerminateProcess(handle, 1) };
    let err = std::io::Error::last_os_error();
    unsafe {
        CloseHandle(handle);
    }
    if rc != 0 {
        KillOutcome::Killed
    } else {
        KillOutcome::Failed(err.to_string())
    }
}

#[cfg(not(any(unix, windows)))]
pub fn force_kill(_pid: u32) -> KillOutcome {
    KillOutcome::Failed("process termination is not supported on this platform".into())
}
