//! Core loader logic.
//!
//! This module contains the `Loader` struct, which drives a `Backend` through the library
//! lifecycle:
//! 1. Load: try each candidate name in order until one opens, recording every failure.
//! 2. Bind: resolve symbols by exact name in the opened library.
//! 3. Close: release the native handle and mark the library as unloaded.
//!
//! The platform's last-error state (`dlerror`, `GetLastError`) is shared and overwritten by the
//! next loader call, so each primitive call and the read of its error message happen together
//! under `LOADER_LOCK`.

use parking_lot::{const_reentrant_mutex, ReentrantMutex};
use std::ffi::c_void;
use std::mem;
use std::ops::Deref;

use crate::backend::{Backend, SystemBackend};
use crate::error::{BindError, CloseError, LoadError};
use crate::library::{Library, LoadErrorRecord, Symbol};
use crate::utils::is_valid_name;

/// Serializes every "call primitive, then read its error" sequence in the process.
///
/// Reentrant because library constructors, destructors and `DllMain` run inside `open`/`close`
/// and may load or close other libraries on the same thread.
static LOADER_LOCK: ReentrantMutex<()> = const_reentrant_mutex(());

/// Cross-platform dynamic library loader.
///
/// The loader owns no libraries; it only holds the backend. Libraries it returns are owned by the
/// caller and must be passed back to `close`.
///
/// # Example
///
/// ```ignore
/// let loader = Loader::new();
/// let mut lib = loader.load(&["libfoo.so.2", "libfoo.so"])?;
/// let version: extern "C" fn() -> u32 = unsafe { loader.bind_as(&lib, "foo_version")? };
/// println!("foo {}", version());
/// loader.close(&mut lib);
/// ```
#[derive(Debug, Default)]
pub struct Loader<B: Backend = SystemBackend> {
    backend: B,
}

impl Loader {
    /// Creates a loader for the platform this crate was compiled for.
    pub fn new() -> Self {
        Self::with_backend(SystemBackend::default())
    }
}

impl<B: Backend> Loader<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Opens the first loadable library among `names`, tried in order.
    ///
    /// Candidates after the winning one are never attempted. Failures of earlier candidates are
    /// kept on the returned `Library` (see `Library::errors`). An invalid name aborts the whole
    /// call with `InvalidName` even if earlier candidates failed.
    pub fn load<S: AsRef<str>>(&self, names: &[S]) -> Result<Library<B>, LoadError> {
        if names.is_empty() {
            return Err(LoadError::EmptyCandidateSet);
        }

        let mut errors = Vec::new();
        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if !is_valid_name(name) {
                return Err(LoadError::InvalidName { index });
            }

            let opened = {
                let _guard = LOADER_LOCK.lock();
                match self.backend.open(name) {
                    Some(handle) => Ok(handle),
                    None => Err(self.backend.last_error_message()),
                }
            };

            match opened {
                Ok(handle) => {
                    tracing::debug!(
                        "Loaded {} (candidate {} of {}, {} earlier failure(s))",
                        name,
                        index + 1,
                        names.len(),
                        errors.len()
                    );
                    return Ok(Library::new(handle, name.to_string(), errors));
                }
                Err(message) => {
                    tracing::debug!("Failed to load {}: {}", name, message);
                    errors.push(LoadErrorRecord::new(name, message));
                }
            }
        }

        Err(LoadError::LoadFailed { attempts: errors })
    }

    /// Like `load`, but the returned guard closes the library when dropped.
    pub fn load_scoped<S: AsRef<str>>(&self, names: &[S]) -> Result<ScopedLibrary<'_, B>, LoadError> {
        let library = self.load(names)?;
        Ok(ScopedLibrary {
            loader: self,
            library,
        })
    }

    /// Resolves `symbol` in `library` by exact name.
    pub fn bind(&self, library: &Library<B>, symbol: &str) -> Result<Symbol, BindError> {
        if !is_valid_name(symbol) {
            return Err(BindError::InvalidSymbolName);
        }
        let handle = library.handle.ok_or_else(|| BindError::NotLoaded {
            symbol: symbol.to_string(),
        })?;

        let resolved = {
            let _guard = LOADER_LOCK.lock();
            match self.backend.resolve(handle, symbol) {
                Some(ptr) => Ok(ptr),
                None => Err(self.backend.last_error_message()),
            }
        };

        match resolved {
            Ok(ptr) => {
                tracing::trace!("Bound {} in {} at {:p}", symbol, library.name, ptr);
                Ok(Symbol::new(ptr))
            }
            Err(message) => Err(BindError::BindFailed {
                symbol: symbol.to_string(),
                message,
            }),
        }
    }

    /// Resolves `symbol` and reinterprets its address as `F`, typically an `extern "C" fn`.
    ///
    /// Fails with `InvalidFunctionTarget` before touching the library if `F` is not exactly the
    /// size of an address.
    ///
    /// # Safety
    ///
    /// `F` must match the real type of the symbol, and the value must not be used after the
    /// library is closed.
    pub unsafe fn bind_as<F: Copy>(&self, library: &Library<B>, symbol: &str) -> Result<F, BindError> {
        let expected = mem::size_of::<*mut c_void>();
        let actual = mem::size_of::<F>();
        if actual != expected {
            return Err(BindError::InvalidFunctionTarget { expected, actual });
        }
        let ptr = self.bind(library, symbol)?.as_ptr();
        Ok(mem::transmute_copy::<*mut c_void, F>(&ptr))
    }

    /// Whether `library` is still open.
    pub fn is_loaded(&self, library: &Library<B>) -> bool {
        library.is_loaded()
    }

    /// Candidates that failed before `library` was opened, in attempt order.
    pub fn errors<'l>(&self, library: &'l Library<B>) -> &'l [LoadErrorRecord] {
        library.errors()
    }

    /// Releases `library`. Closing an already closed library does nothing.
    ///
    /// A failure reported by the platform is logged and otherwise ignored; use `try_close` to
    /// observe it.
    pub fn close(&self, library: &mut Library<B>) {
        if let Err(e) = self.try_close(library) {
            tracing::warn!("{}", e);
        }
    }

    /// Releases `library`, returning the platform's error if the close failed.
    ///
    /// The library is marked unloaded either way; the handle is not retried.
    pub fn try_close(&self, library: &mut Library<B>) -> Result<(), CloseError> {
        let Some(handle) = library.handle.take() else {
            return Ok(());
        };

        let closed = {
            let _guard = LOADER_LOCK.lock();
            if self.backend.close(handle) {
                Ok(())
            } else {
                Err(self.backend.last_error_message())
            }
        };

        match closed {
            Ok(()) => {
                tracing::debug!("Closed {}", library.name);
                Ok(())
            }
            Err(message) => Err(CloseError::CloseFailed {
                name: library.name.clone(),
                message,
            }),
        }
    }
}

/// A `Library` that is closed when the guard goes out of scope.
///
/// The guarded library is read-only; it cannot be swapped out for another handle:
///
/// ```compile_fail
/// let loader = dynload::Loader::new();
/// let mut guard = loader.load_scoped(&["libc.so.6"]).unwrap();
/// let mut other = loader.load(&["libm.so.6"]).unwrap();
/// std::mem::swap(&mut *guard, &mut other);
/// ```
#[derive(Debug)]
pub struct ScopedLibrary<'a, B: Backend = SystemBackend> {
    loader: &'a Loader<B>,
    library: Library<B>,
}

impl<B: Backend> ScopedLibrary<'_, B> {
    /// Resolves `symbol` in the guarded library.
    pub fn bind(&self, symbol: &str) -> Result<Symbol, BindError> {
        self.loader.bind(&self.library, symbol)
    }

    /// Releases the guard without closing the library.
    pub fn into_inner(mut self) -> Library<B> {
        mem::replace(&mut self.library, Library::unloaded())
    }
}

impl<B: Backend> Deref for ScopedLibrary<'_, B> {
    type Target = Library<B>;

    fn deref(&self) -> &Library<B> {
        &self.library
    }
}

impl<B: Backend> Drop for ScopedLibrary<'_, B> {
    fn drop(&mut self) {
        self.loader.close(&mut self.library);
    }
}
