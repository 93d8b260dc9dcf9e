// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the dotted path parser.
// Run with: cargo +nightly fuzz run fuzz_path_parser
//
// Any path that parses must render to text that parses back to the same path.

#![no_main]

use awaredb_model::PathAddress;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(path) = PathAddress::parse(input) {
            let rendered = path.render();
            let reparsed = PathAddress::parse(&rendered).expect("rendered path must parse");
            assert_eq!(reparsed, path);
        }
    }
});
