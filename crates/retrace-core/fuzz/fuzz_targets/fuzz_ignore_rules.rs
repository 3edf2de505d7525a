#![no_main]

use libfuzzer_sys::fuzz_target;
use retrace_core::IgnoreRules;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let Some((rules, path)) = text.split_once('\0') else {
        return;
    };
    if let Ok(rules) = IgnoreRules::parse(rules) {
        let _ = rules.is_ignored(path);
    }
});
