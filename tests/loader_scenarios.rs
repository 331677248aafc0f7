mod common;

use common::ScriptedBackend;
use dynload::{BindError, LoadError, Loader};

#[test]
fn test_fallback_to_second_candidate() {
    let loader = Loader::with_backend(ScriptedBackend::new(["libc.so.6"]).with_symbols(&["uname"]));

    let mut lib = loader.load(&["nonexistent1.so", "libc.so.6"]).unwrap();
    assert!(loader.is_loaded(&lib));
    assert_eq!(lib.name(), "libc.so.6");

    let errors = loader.errors(&lib);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].name, "nonexistent1.so");
    assert!(errors[0].message.contains("nonexistent1.so"));

    assert!(loader.bind(&lib, "uname").is_ok());

    loader.close(&mut lib);
    assert!(!loader.is_loaded(&lib));
    assert_eq!(loader.backend().closes.get(), 1);
}

#[test]
fn test_every_failure_keeps_its_own_message() {
    let loader = Loader::with_backend(ScriptedBackend::new(Vec::<String>::new()));

    let err = loader.load(&["a.so", "b.so"]).unwrap_err();
    let LoadError::LoadFailed { attempts } = &err else {
        panic!("expected LoadFailed, got {err:?}");
    };
    let names: Vec<&str> = attempts.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["a.so", "b.so"]);
    assert!(attempts[0].message.starts_with("a.so:"));
    assert!(attempts[1].message.starts_with("b.so:"));
    assert_ne!(attempts[0].message, attempts[1].message);
}

#[test]
fn test_remaining_candidates_are_not_attempted() {
    let loader = Loader::with_backend(ScriptedBackend::new(["libz.so.1", "libz.so"]));

    let lib = loader.load(&["libz.so.1", "libz.so", "libz.dylib"]).unwrap();
    assert_eq!(lib.name(), "libz.so.1");
    assert_eq!(*loader.backend().attempted.borrow(), ["libz.so.1"]);
}

#[test]
fn test_empty_candidate_list() {
    let loader = Loader::with_backend(ScriptedBackend::new(["libc.so.6"]));
    let names: Vec<String> = Vec::new();

    assert_eq!(loader.load(names.as_slice()).unwrap_err(), LoadError::EmptyCandidateSet);
    assert_eq!(loader.backend().opens.get(), 0);
}

#[test]
fn test_repeated_bind_returns_same_address() {
    let loader = Loader::with_backend(ScriptedBackend::new(["libm.so.6"]).with_symbols(&["cos", "sin"]));
    let lib = loader.load(&["libm.so.6"]).unwrap();

    let first = loader.bind(&lib, "cos").unwrap();
    let second = loader.bind(&lib, "cos").unwrap();
    assert_eq!(first, second);
    assert_eq!(loader.backend().resolves.get(), 2);
}

#[test]
fn test_unknown_symbol_message_is_captured() {
    let loader = Loader::with_backend(ScriptedBackend::new(["libm.so.6"]).with_symbols(&["cos"]));
    let lib = loader.load(&["libm.so.6"]).unwrap();

    match loader.bind(&lib, "tan") {
        Err(BindError::BindFailed { symbol, message }) => {
            assert_eq!(symbol, "tan");
            assert_eq!(message, "undefined symbol: tan");
        }
        other => panic!("expected BindFailed, got {other:?}"),
    }
    assert_eq!(loader.bind(&lib, "").unwrap_err(), BindError::InvalidSymbolName);
    assert_eq!(loader.backend().resolves.get(), 1);
}

#[test]
fn test_double_close_calls_backend_once() {
    let loader = Loader::with_backend(ScriptedBackend::new(["libc.so.6"]));
    let mut lib = loader.load(&["libc.so.6"]).unwrap();

    loader.close(&mut lib);
    loader.close(&mut lib);
    assert!(loader.try_close(&mut lib).is_ok());
    assert!(!lib.is_loaded());
    assert_eq!(loader.backend().closes.get(), 1);
}
