//! CommonMark specification tests.
//!
//! Runs the official example corpus from a spec.json file to track
//! compliance. Generate it with `python3 test/spec_tests.py --dump-tests`
//! from the CommonMark spec repo and drop it at `tests/spec.json`.
//! These tests are `#[ignore]`d so the suite does not depend on the
//! corpus being present; run them with `cargo test -- --ignored`.

use arbormark::to_html;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct SpecTest {
    markdown: String,
    html: String,
    example: u32,
    section: String,
}

fn load_spec_tests() -> Vec<SpecTest> {
    let spec_json =
        fs::read_to_string("tests/spec.json").expect("tests/spec.json missing; see module docs");
    serde_json::from_str(&spec_json).expect("Failed to parse spec.json")
}

/// Run all spec tests and report results by section.
#[test]
#[ignore]
fn commonmark_spec_report() {
    let tests = load_spec_tests();
    let mut passed = 0;
    let mut failed = 0;
    let mut by_section: std::collections::BTreeMap<String, (u32, u32)> =
        std::collections::BTreeMap::new();

    for test in &tests {
        let output = to_html(&test.markdown);
        let entry = by_section.entry(test.section.clone()).or_insert((0, 0));
        if output == test.html {
            passed += 1;
            entry.0 += 1;
        } else {
            failed += 1;
            entry.1 += 1;
        }
    }

    println!("\n=== CommonMark Spec Compliance Report ===\n");
    println!(
        "Total: {} passed, {} failed out of {}",
        passed,
        failed,
        tests.len()
    );
    println!(
        "Pass rate: {:.1}%\n",
        (passed as f64 / tests.len() as f64) * 100.0
    );

    println!("By section:");
    for (section, (p, f)) in &by_section {
        let total = p + f;
        let pct = (*p as f64 / total as f64) * 100.0;
        let status = if *f == 0 { "✓" } else { " " };
        println!("  {} {:40} {:3}/{:3} ({:5.1}%)", status, section, p, total, pct);
    }

    assert_eq!(failed, 0, "{failed} spec examples failed");
}

/// Show the first few failures with expected/actual output, for
/// debugging a section by hand.
#[test]
#[ignore]
fn commonmark_spec_failures() {
    let tests = load_spec_tests();
    let mut shown = 0;

    for test in &tests {
        let output = to_html(&test.markdown);
        if output != test.html && shown < 20 {
            eprintln!("\nExample {} ({}): {:?}", test.example, test.section, test.markdown);
            eprintln!("  Expected: {:?}", test.html);
            eprintln!("  Got:      {:?}", output);
            shown += 1;
        }
    }

    assert_eq!(shown, 0, "spec failures shown above");
}
