//! One-shot performance-counter query cycle.
//!
//! Each value is obtained with a fresh query: open, add the counter,
//! collect, wait for the sampling window, collect again, format, close.
//! No query object survives a call; the close runs on every exit path
//! through the drop guard.

use std::thread;
use std::time::Duration;

use windows_sys::Win32::System::Performance::{
    PDH_FMT_COUNTERVALUE, PDH_FMT_DOUBLE, PdhAddEnglishCounterW, PdhCloseQuery,
    PdhCollectQueryData, PdhGetFormattedCounterValue, PdhOpenQueryW,
};

use crate::backend::SampleError;

/// Closes the query handle when the cycle ends, success or not.
struct QueryGuard(isize);

impl Drop for QueryGuard {
    fn drop(&mut self) {
        unsafe {
            PdhCloseQuery(self.0);
        }
    }
}

pub(super) fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Runs one full query cycle for `path` and returns the formatted value.
///
/// Rate counters need two collections a window apart; `wait` is that
/// window. Point-in-time counters can pass `Duration::ZERO` to skip the
/// second collection.
pub(super) fn collect_double(path: &str, wait: Duration) -> Result<f64, SampleError> {
    let wide_path = wide(path);

    let mut raw_query = 0isize;
    let status = unsafe { PdhOpenQueryW(std::ptr::null(), 0, &mut raw_query) };
    if status != 0 {
        return Err(SampleError::Unavailable(format!(
            "PdhOpenQuery failed with status {status:#x}"
        )));
    }
    let query = QueryGuard(raw_query);

    let mut counter = 0isize;
    let status =
        unsafe { PdhAddEnglishCounterW(query.0, wide_path.as_ptr(), 0, &mut counter) };
    if status != 0 {
        return Err(SampleError::NotFound(format!("counter path {path}")));
    }

    let status = unsafe { PdhCollectQueryData(query.0) };
    if status != 0 {
        return Err(SampleError::Unavailable(format!(
            "PdhCollectQueryData failed with status {status:#x}"
        )));
    }

    if !wait.is_zero() {
        thread::sleep(wait);
        let status = unsafe { PdhCollectQueryData(query.0) };
        if status != 0 {
            return Err(SampleError::Unavailable(format!(
                "PdhCollectQueryData failed with status {status:#x}"
            )));
        }
    }

    let mut value: PDH_FMT_COUNTERVALUE = unsafe { std::mem::zeroed() };
    let status = unsafe {
        PdhGetFormattedCounterValue(counter, PDH_FMT_DOUBLE, std::ptr::null_mut(), &mut value)
    };
    if status != 0 {
        return Err(SampleError::Unavailable(format!(
            "PdhGetFormattedCounterValue failed with status {status:#x}"
        )));
    }

    Ok(unsafe { value.Anonymous.doubleValue })
}
