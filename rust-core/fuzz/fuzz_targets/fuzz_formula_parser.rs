// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the formula parser.
// Run with: cargo +nightly fuzz run fuzz_formula_parser
//
// The parser must never panic, and rendering must reproduce the input for
// every formula whose references are already in canonical form.

#![no_main]

use awaredb_model::FormulaExpression;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Limit input size to prevent timeouts on extremely long strings
        if input.len() <= 4096 {
            if let Ok(formula) = FormulaExpression::parse(input) {
                let rendered = formula.render();
                let reparsed = FormulaExpression::parse(&rendered).expect("rendered formula must parse");
                assert_eq!(reparsed, formula);
            }
        }
    }
});
