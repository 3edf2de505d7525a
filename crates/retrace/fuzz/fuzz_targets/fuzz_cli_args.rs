#![no_main]

//! Fuzz target for command line parsing
//!
//! Arbitrary argument lists must either parse or be rejected by clap, and a
//! parsed configuration must derive its options without panicking.

use clap::Parser;
use libfuzzer_sys::fuzz_target;

use retrace::config::Config;

fuzz_target!(|args: Vec<String>| {
    let argv = std::iter::once("retrace".to_string()).chain(args);
    if let Ok(config) = Config::try_parse_from(argv) {
        let options = config.replay_options();
        assert!(options.chunk_size >= 1);
        let _ = config.walk_options();
        let _ = config.log_level();
        let _ = config.validate();
    }
});
