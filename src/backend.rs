//! Platform backend abstraction.
//!
//! This module defines the `Backend` trait, which encapsulates the four primitives a native
//! dynamic loader offers: open a library by name, resolve a symbol, close a handle and fetch the
//! last loader error. The `Loader` stays platform independent while each backend maps these onto
//! `dlopen`/`dlsym`/`dlclose`/`dlerror` or their Win32 equivalents.

use std::ffi::c_void;
use std::ptr::NonNull;

#[cfg(unix)]
pub mod posix;
#[cfg(windows)]
pub mod win32;

/// An opaque, non-null native library handle (`void *` on POSIX, `HMODULE` on Windows).
pub type RawHandle = NonNull<c_void>;

/// The backend for the platform this crate was compiled for.
#[cfg(unix)]
pub type SystemBackend = posix::Posix;

/// The backend for the platform this crate was compiled for.
#[cfg(windows)]
pub type SystemBackend = win32::Windows;

/// Message reported when the platform has no description for a failure.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Longest platform error message kept, in UTF-16 units.
pub const MESSAGE_CAPACITY: usize = 512;

/// A native dynamic loader (e.g., POSIX `dl*`, the Windows loader).
///
/// Implementations do not validate names; the `Loader` rejects empty names and names with an
/// interior NUL before they reach a backend.
pub trait Backend {
    /// Opens the library `name`, returning `None` if the platform loader failed.
    fn open(&self, name: &str) -> Option<RawHandle>;

    /// Resolves `symbol` in `handle` by exact name, returning `None` if it was not found.
    fn resolve(&self, handle: RawHandle, symbol: &str) -> Option<NonNull<c_void>>;

    /// Releases `handle`. Returns `false` if the platform reported a failure.
    fn close(&self, handle: RawHandle) -> bool;

    /// Describes the most recent failure of `open`, `resolve` or `close`.
    ///
    /// This may clear the platform's error state (`dlerror` does), so it must be called at most
    /// once per failure and before any other backend call.
    fn last_error_message(&self) -> String;
}

/// Decodes a UTF-16 system message, keeping at most `capacity` units.
///
/// A surrogate pair is never split at the cut. Trailing whitespace (the CR/LF system messages
/// end with) is dropped; a message with nothing left is `UNKNOWN_ERROR`.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn bounded_message(units: &[u16], capacity: usize) -> String {
    let mut len = units.len().min(capacity);
    if len < units.len() && len > 0 && (0xD800..0xDC00).contains(&units[len - 1]) {
        len -= 1;
    }
    let message = String::from_utf16_lossy(&units[..len]);
    let message = message.trim_end();
    if message.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message.to_string()
    }
}
