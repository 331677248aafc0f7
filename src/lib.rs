//! Minimal cross-platform dynamic library loader.
//!
//! This library wraps the native loader (`dlopen` and friends on POSIX, `LoadLibraryW` and
//! friends on Windows) behind one API. It is organized into several modules:
//! - `backend`: Platform-specific loader primitives.
//! - `loader`: Candidate-list loading, symbol binding and release.
//! - `library`: Library handles, load error records and resolved symbols.
//! - `error`: Error types for each operation.
//! - `config`: CLI configuration for the `dynload` binary.

pub mod backend;
pub mod config;
pub mod error;
pub mod library;
pub mod loader;
pub mod utils;

pub use backend::{Backend, RawHandle, SystemBackend};
pub use error::{BindError, CloseError, LoadError};
pub use library::{Library, LoadErrorRecord, Symbol};
pub use loader::{Loader, ScopedLibrary};
pub use utils::platform_library_name;
