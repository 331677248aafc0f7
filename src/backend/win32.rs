//! Windows backend.
//!
//! Implements the `Backend` trait on top of `LoadLibraryW`/`GetProcAddress`/`FreeLibrary`, with
//! `FormatMessageW` for error text.

use super::{bounded_message, Backend, RawHandle, MESSAGE_CAPACITY, UNKNOWN_ERROR};
use std::cell::Cell;
use std::ffi::{c_void, CString};
use std::ptr::NonNull;

use windows::core::{PCSTR, PCWSTR, PWSTR};
use windows::Win32::Foundation::{GetLastError, LocalFree, HLOCAL, HMODULE};
use windows::Win32::System::Diagnostics::Debug::{
    FormatMessageW, FORMAT_MESSAGE_ALLOCATE_BUFFER, FORMAT_MESSAGE_FROM_SYSTEM,
    FORMAT_MESSAGE_IGNORE_INSERTS,
};
use windows::Win32::System::LibraryLoader::{FreeLibrary, GetProcAddress, LoadLibraryW};

thread_local! {
    /// Win32 code of the last failed call on this thread, taken by `last_error_message`.
    static LAST_ERROR: Cell<Option<u32>> = const { Cell::new(None) };
}

/// The Win32 loader backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct Windows;

impl Backend for Windows {
    fn open(&self, name: &str) -> Option<RawHandle> {
        let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
        // SAFETY: `wide` is a null-terminated UTF-16 string that outlives the call.
        match unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) } {
            Ok(module) => NonNull::new(module.0),
            Err(e) => {
                record_error(win32_code(&e));
                None
            }
        }
    }

    fn resolve(&self, handle: RawHandle, symbol: &str) -> Option<NonNull<c_void>> {
        let Ok(c_symbol) = CString::new(symbol) else {
            return None;
        };
        // SAFETY: `handle` came from a successful LoadLibraryW and has not been freed;
        // `c_symbol` is null-terminated.
        let proc = unsafe { GetProcAddress(HMODULE(handle.as_ptr()), PCSTR(c_symbol.as_ptr().cast())) };
        match proc {
            Some(proc) => NonNull::new(proc as *mut c_void),
            None => {
                // SAFETY: GetLastError reads thread-local state set by the just-failed
                // GetProcAddress; no Win32 calls between them.
                record_error(unsafe { GetLastError() }.0);
                None
            }
        }
    }

    fn close(&self, handle: RawHandle) -> bool {
        // SAFETY: `handle` came from a successful LoadLibraryW; the loader clears it afterwards.
        match unsafe { FreeLibrary(HMODULE(handle.as_ptr())) } {
            Ok(()) => true,
            Err(e) => {
                record_error(win32_code(&e));
                false
            }
        }
    }

    fn last_error_message(&self) -> String {
        match LAST_ERROR.with(Cell::take) {
            Some(code) => format_system_message(code),
            None => UNKNOWN_ERROR.to_string(),
        }
    }
}

fn record_error(code: u32) {
    LAST_ERROR.with(|last| last.set(Some(code)));
}

/// Recovers the Win32 code from a windows-crate error (`HRESULT_FROM_WIN32` is `0x8007xxxx`).
fn win32_code(error: &windows::core::Error) -> u32 {
    let hresult = error.code().0 as u32;
    if hresult & 0xFFFF_0000 == 0x8007_0000 {
        hresult & 0xFFFF
    } else {
        hresult
    }
}

/// Formats a Win32 error `code`, keeping at most `MESSAGE_CAPACITY` UTF-16 units.
///
/// Codes without a system message yield `UNKNOWN_ERROR`.
fn format_system_message(code: u32) -> String {
    let mut buffer = PWSTR::null();
    // SAFETY: with FORMAT_MESSAGE_ALLOCATE_BUFFER, `lpbuffer` is the address of a PWSTR that
    // receives a LocalAlloc'd buffer of `written` units (plus terminator).
    let written = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_ALLOCATE_BUFFER | FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            None,
            code,
            0,
            PWSTR(&mut buffer.0 as *mut *mut u16 as *mut u16),
            0,
            None,
        )
    } as usize;

    if buffer.is_null() {
        return UNKNOWN_ERROR.to_string();
    }
    // SAFETY: FormatMessageW wrote `written` units to `buffer`.
    let units = unsafe { std::slice::from_raw_parts(buffer.0, written) };
    let message = bounded_message(units, MESSAGE_CAPACITY);
    // SAFETY: `buffer` was allocated by FormatMessageW and is freed exactly once.
    unsafe {
        let _ = LocalFree(HLOCAL(buffer.0.cast()));
    }
    message
}
