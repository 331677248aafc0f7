//! Library handles and the values derived from them.
//!
//! A `Library` is produced by `Loader::load` and released by `Loader::close`. It carries the
//! native handle and the history of candidates that failed before the winning one.

use std::ffi::c_void;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::backend::{RawHandle, SystemBackend};

/// One failed attempt to open a candidate library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadErrorRecord {
    /// The exact candidate name that was attempted.
    pub name: String,
    /// Platform error message, captured immediately after the failure.
    pub message: String,
}

impl LoadErrorRecord {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for LoadErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// A native shared library opened by a `Loader`.
///
/// `Library` has no `Drop` release: every successful load must be matched by exactly one
/// `Loader::close` (or wrapped in a `ScopedLibrary`). Leaking it keeps the OS module mapped for
/// the rest of the process.
///
/// `B` is the backend that opened the handle. A library can only be passed back to a `Loader`
/// with that same backend type:
///
/// ```compile_fail
/// use std::ffi::c_void;
/// use std::ptr::NonNull;
/// use dynload::{Backend, Loader, RawHandle};
///
/// struct Fake;
///
/// impl Backend for Fake {
///     fn open(&self, _name: &str) -> Option<RawHandle> {
///         NonNull::new(0x1000 as *mut c_void)
///     }
///     fn resolve(&self, _handle: RawHandle, _symbol: &str) -> Option<NonNull<c_void>> {
///         None
///     }
///     fn close(&self, _handle: RawHandle) -> bool {
///         true
///     }
///     fn last_error_message(&self) -> String {
///         String::new()
///     }
/// }
///
/// let lib = Loader::with_backend(Fake).load(&["libfake.so"]).unwrap();
/// let _ = Loader::new().bind(&lib, "uname");
/// ```
pub struct Library<B = SystemBackend> {
    /// `None` once closed.
    pub(crate) handle: Option<RawHandle>,
    /// Candidate name that was loaded.
    pub(crate) name: String,
    /// Failed candidates tried before `name`, in attempt order.
    pub(crate) errors: Vec<LoadErrorRecord>,
    backend: PhantomData<fn() -> B>,
}

// SAFETY: the native handle is an opaque token the OS loader accepts from any thread. Releasing
// it needs `&mut Library`, so it cannot race with `bind` through a shared reference.
unsafe impl<B> Send for Library<B> {}
unsafe impl<B> Sync for Library<B> {}

impl<B> fmt::Debug for Library<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("errors", &self.errors)
            .finish()
    }
}

impl<B> Library<B> {
    pub(crate) fn new(handle: RawHandle, name: String, errors: Vec<LoadErrorRecord>) -> Self {
        Self {
            handle: Some(handle),
            name,
            errors,
            backend: PhantomData,
        }
    }

    /// A placeholder that owns no native handle.
    pub(crate) fn unloaded() -> Self {
        Self {
            handle: None,
            name: String::new(),
            errors: Vec::new(),
            backend: PhantomData,
        }
    }

    /// Whether the native handle is still open.
    pub fn is_loaded(&self) -> bool {
        self.handle.is_some()
    }

    /// Candidates that failed before this library was opened.
    pub fn errors(&self) -> &[LoadErrorRecord] {
        &self.errors
    }

    /// The candidate name that was opened.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An address resolved from a `Library`.
///
/// The loader knows nothing about the symbol's type; casting it to the right function signature
/// is up to the caller (see `Loader::bind_as`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(NonNull<c_void>);

// SAFETY: a symbol is a plain address; dereferencing or calling it is already unsafe.
unsafe impl Send for Symbol {}
unsafe impl Sync for Symbol {}

impl Symbol {
    pub(crate) fn new(ptr: NonNull<c_void>) -> Self {
        Self(ptr)
    }

    /// The raw address. Never null.
    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl fmt::Pointer for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.0, f)
    }
}
