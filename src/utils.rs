//! Utility functions.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};

/// Whether `name` can be handed to a platform loader: non-empty and free of NUL bytes.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('\0')
}

/// Builds the platform file name for a library stem: `libfoo.so`, `libfoo.dylib` or `foo.dll`.
pub fn platform_library_name(stem: &str) -> String {
    format!("{DLL_PREFIX}{stem}{DLL_SUFFIX}")
}
