//! Scripted loader backend shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::ffi::c_void;
use std::ptr::NonNull;

use dynload::backend::{Backend, RawHandle, UNKNOWN_ERROR};

/// A `Backend` that opens only the names it was told about and mimics the destructive
/// `dlerror()` read.
#[derive(Default)]
pub struct ScriptedBackend {
    loadable: HashSet<String>,
    symbols: Vec<String>,
    pub opens: Cell<usize>,
    pub resolves: Cell<usize>,
    pub closes: Cell<usize>,
    pub attempted: RefCell<Vec<String>>,
    last_error: RefCell<Option<String>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(loadable: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            loadable: loadable.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_symbols(mut self, symbols: &[&str]) -> Self {
        self.symbols = symbols.iter().map(|s| s.to_string()).collect();
        self
    }
}

fn fake_address(n: usize) -> NonNull<c_void> {
    NonNull::new((0x10_000 + n * 0x40) as *mut c_void).unwrap()
}

impl Backend for ScriptedBackend {
    fn open(&self, name: &str) -> Option<RawHandle> {
        self.opens.set(self.opens.get() + 1);
        self.attempted.borrow_mut().push(name.to_string());
        if self.loadable.contains(name) {
            Some(fake_address(self.opens.get()))
        } else {
            *self.last_error.borrow_mut() =
                Some(format!("{name}: cannot open shared object file: No such file or directory"));
            None
        }
    }

    fn resolve(&self, _handle: RawHandle, symbol: &str) -> Option<NonNull<c_void>> {
        self.resolves.set(self.resolves.get() + 1);
        match self.symbols.iter().position(|s| s == symbol) {
            Some(i) => Some(fake_address(1000 + i)),
            None => {
                *self.last_error.borrow_mut() = Some(format!("undefined symbol: {symbol}"));
                None
            }
        }
    }

    fn close(&self, _handle: RawHandle) -> bool {
        self.closes.set(self.closes.get() + 1);
        true
    }

    fn last_error_message(&self) -> String {
        self.last_error
            .borrow_mut()
            .take()
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
    }
}
