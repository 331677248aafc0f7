//! Error types.
//!
//! One enum per operation family. Programming errors (empty candidate list, invalid names,
//! invalid destination type) and recoverable platform failures are separate variants.

use thiserror::Error;

use crate::library::LoadErrorRecord;

/// Errors returned by `Loader::load`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// No candidate names were supplied.
    #[error("no candidate library names supplied")]
    EmptyCandidateSet,

    /// A candidate name was empty or contained a NUL byte.
    #[error("invalid library name at candidate {index}")]
    InvalidName {
        /// Position of the offending name in the candidate list.
        index: usize,
    },

    /// Every candidate was attempted and none could be opened.
    #[error("failed to load any of {} candidate(s): {}", .attempts.len(), summarize(.attempts))]
    LoadFailed {
        /// One record per candidate, in attempt order.
        attempts: Vec<LoadErrorRecord>,
    },
}

impl LoadError {
    /// The per-candidate failures, if this is `LoadFailed`.
    pub fn attempts(&self) -> &[LoadErrorRecord] {
        match self {
            Self::LoadFailed { attempts } => attempts.as_slice(),
            _ => &[],
        }
    }
}

/// Errors returned by `Loader::bind` and `Loader::bind_as`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The destination type cannot hold a code pointer.
    #[error("invalid function target: destination is {actual} bytes, a symbol address is {expected}")]
    InvalidFunctionTarget {
        /// Size of a symbol address.
        expected: usize,
        /// Size of the requested destination type.
        actual: usize,
    },

    /// The symbol name was empty or contained a NUL byte.
    #[error("invalid symbol name")]
    InvalidSymbolName,

    /// The library has already been closed.
    #[error("cannot bind {symbol}: library is not loaded")]
    NotLoaded {
        /// Requested symbol.
        symbol: String,
    },

    /// The platform could not resolve the symbol.
    #[error("failed to bind {symbol}: {message}")]
    BindFailed {
        /// Requested symbol.
        symbol: String,
        /// Platform error message captured right after the lookup.
        message: String,
    },
}

/// Errors returned by `Loader::try_close`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseError {
    /// The platform reported a failure releasing the library.
    #[error("failed to close {name}: {message}")]
    CloseFailed {
        /// Candidate name the library was loaded from.
        name: String,
        /// Platform error message.
        message: String,
    },
}

fn summarize(attempts: &[LoadErrorRecord]) -> String {
    attempts
        .iter()
        .map(|record| record.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
