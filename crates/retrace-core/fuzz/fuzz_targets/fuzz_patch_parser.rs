#![no_main]

use libfuzzer_sys::fuzz_target;
use retrace_core::{Commit, IgnoreRules, ReplayOp, ReplayOptions, ReplaySession, parse_patch};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if parse_patch(&text).is_err() {
        return;
    }

    // A patch that parses must replay or fail cleanly against an empty tree.
    let mut session = ReplaySession::new(IgnoreRules::empty(), ReplayOptions::default());
    let mut ops: Vec<ReplayOp> = Vec::new();
    let _ = session.replay_commit(&Commit::new("fuzz", "fuzz", "fuzz"), &text, &mut ops);
});
