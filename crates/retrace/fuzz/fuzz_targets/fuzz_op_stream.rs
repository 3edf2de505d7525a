#![no_main]

//! Fuzz target for applying JSON-lines operation streams
//!
//! Each line that parses as an operation is applied to a fresh store. Bad
//! coordinates must surface as errors, never as panics.

use libfuzzer_sys::fuzz_target;

use retrace_core::{ReplayOp, VirtualFileStore};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut store = VirtualFileStore::new();
    for line in text.lines() {
        if let Ok(op) = serde_json::from_str::<ReplayOp>(line) {
            let _ = store.apply(&op);
        }
    }

    assert_eq!(store.paths().count(), store.len());
    for path in store.paths() {
        assert!(store.read(path).is_some());
    }
});
