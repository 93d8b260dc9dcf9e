// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for node document decoding.
// Run with: cargo +nightly fuzz run fuzz_node_document
//
// Arbitrary JSON is fed to the property classifier. Decoding may fail, but a
// decoded document must survive an encode/decode cycle unchanged.

#![no_main]

use awaredb_model::NodeDocument;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(document) = NodeDocument::from_json(&value) {
        let annotated = document.to_annotated_json();
        let again = NodeDocument::from_json(&annotated).expect("annotated form must decode");
        assert_eq!(again, document);
    }
});
