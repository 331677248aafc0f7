//! POSIX backend.
//!
//! Implements the `Backend` trait on top of `dlopen`/`dlsym`/`dlclose`/`dlerror` (Linux, macOS,
//! the BSDs).

use super::{Backend, RawHandle, UNKNOWN_ERROR};
use std::ffi::{c_void, CStr, CString};
use std::ptr::NonNull;

/// The POSIX `dl*` backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Posix;

impl Backend for Posix {
    fn open(&self, name: &str) -> Option<RawHandle> {
        let Ok(c_name) = CString::new(name) else {
            return None;
        };
        // RTLD_NOW: resolve every symbol up front, so a broken library fails here and not on
        // the first call. RTLD_LOCAL: keep its symbols out of later lookups.
        let handle = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        NonNull::new(handle)
    }

    fn resolve(&self, handle: RawHandle, symbol: &str) -> Option<NonNull<c_void>> {
        let Ok(c_symbol) = CString::new(symbol) else {
            return None;
        };
        unsafe {
            // Drop any stale message so a failure below reports this lookup.
            libc::dlerror();
            NonNull::new(libc::dlsym(handle.as_ptr(), c_symbol.as_ptr()))
        }
    }

    fn close(&self, handle: RawHandle) -> bool {
        unsafe { libc::dlclose(handle.as_ptr()) == 0 }
    }

    fn last_error_message(&self) -> String {
        // dlerror() returns the message once and resets it.
        let err = unsafe { libc::dlerror() };
        if err.is_null() {
            return UNKNOWN_ERROR.to_string();
        }
        let message = unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned();
        if message.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_library_reports_message() {
        let backend = Posix;
        assert!(backend.open("/nonexistent/libdynload-missing.so").is_none());
        let message = backend.last_error_message();
        assert!(message.contains("libdynload-missing"), "{message}");
    }

    #[test]
    fn test_message_is_consumed_by_read() {
        let backend = Posix;
        assert!(backend.open("/nonexistent/libdynload-missing.so").is_none());
        let _ = backend.last_error_message();
        assert_eq!(backend.last_error_message(), UNKNOWN_ERROR);
    }

    #[test]
    fn test_interior_nul_is_rejected_without_loading() {
        assert!(Posix.open("lib\0c.so").is_none());
    }
}
