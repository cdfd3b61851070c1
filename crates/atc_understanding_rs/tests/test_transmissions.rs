//! End-to-end tests over recorded controller transmissions.
//!
//! The RON index pairs each transcript with the aircraft on frequency and
//! the expected callsign and command codes, so the whole pipeline
//! (normalize -> tokenize -> callsign -> commands) is exercised the way a
//! caller drives it.

use atc_understanding_rs::{Error, match_callsign, normalize, parse_commands, tokenize, understand};
use aviation_helper_rs::aircraft::AircraftContext;
use serde::Deserialize;
use std::{collections::BTreeMap, sync::LazyLock};

#[derive(Debug, Deserialize)]
struct TestTransmission {
    text: String,
    aircraft: AircraftContext,
    /// Expected callsign; `None` means no aircraft should be matched.
    callsign: Option<String>,
    #[serde(default)]
    min_confidence: f64,
    /// Expected command codes, in order.
    codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TestIndex {
    entries: BTreeMap<String, TestTransmission>,
}

static TEST_INDEX: LazyLock<TestIndex> = LazyLock::new(|| {
    let content = std::fs::read_to_string(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/resources/test-transmissions/index.ron"
    ))
    .expect("Failed to read test transmissions index");
    ron::from_str(&content).expect("Failed to parse test transmissions index")
});

fn check(name: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    let entry = &TEST_INDEX.entries[name];
    match &entry.callsign {
        Some(expected_callsign) => {
            let result = understand(&entry.text, &entry.aircraft)
                .unwrap_or_else(|e| panic!("{name}: expected a match for {:?}: {e}", entry.text));
            assert_eq!(
                &result.callsign.callsign, expected_callsign,
                "{name}: wrong callsign"
            );
            assert!(
                result.callsign.confidence >= entry.min_confidence,
                "{name}: confidence {} below {}",
                result.callsign.confidence,
                entry.min_confidence
            );
            assert_eq!(result.codes, entry.codes, "{name}: wrong codes");
        }
        None => {
            // No addressable callsign: the matcher must leave every token
            // in place, and the command engine still gets a chance on the
            // raw tail (scenario tests for garbled clearances).
            let tokens = tokenize(&normalize(&entry.text));
            let (matched, tail) = match_callsign(&tokens, &entry.aircraft);
            assert!(matched.is_none(), "{name}: unexpected match {matched:?}");
            assert_eq!(tail.len(), tokens.len(), "{name}: tokens consumed");
            assert_eq!(
                understand(&entry.text, &entry.aircraft),
                Err(Error::NoCallsign),
                "{name}: understand should report NoCallsign"
            );
            let aircraft = entry.aircraft.values().next().expect("context is non-empty");
            match parse_commands(&tokens, aircraft) {
                Ok(codes) => assert_eq!(codes, entry.codes, "{name}: wrong codes"),
                Err(Error::NoCommand) => {
                    assert!(entry.codes.is_empty(), "{name}: expected {:?}", entry.codes)
                }
                Err(other) => panic!("{name}: unexpected error {other}"),
            }
        }
    }
}

#[test]
fn american_descend_scenario() {
    check("american_descend");
}

#[test]
fn jetblue_turn_scenario() {
    check("jetblue_turn");
}

#[test]
fn november_direct_scenario() {
    check("november_direct");
}

#[test]
fn southwest_speed_until_scenario() {
    check("southwest_speed");
}

#[test]
fn merged_turn_word_scenario() {
    // "turnwright" must normalize into a turn command even without any
    // callsign in the transmission.
    let words = normalize("turnwright zero nine zero");
    assert_eq!(words, ["turn", "right", "0", "9", "0"]);
    check("merged_turn_word");
}

#[test]
fn garbled_clearance_scenario() {
    let words = normalize("cleardered KILEY");
    assert_eq!(words, ["cleared", "direct", "KILEY"]);
    check("garbled_clearance");
}

#[test]
fn expect_approach_scenarios() {
    check("expect_approach");
    check("expect_approach_unresolved");
}

#[test]
fn all_indexed_transmissions() {
    for name in TEST_INDEX.entries.keys() {
        check(name);
    }
}

#[test]
fn determinism_across_runs() {
    // Identical input and context must produce identical results; the
    // context map is ordered, so iteration order cannot leak in.
    let entry = &TEST_INDEX.entries["american_descend"];
    let first = understand(&entry.text, &entry.aircraft).unwrap();
    for _ in 0..5 {
        let again = understand(&entry.text, &entry.aircraft).unwrap();
        assert_eq!(first, again);
    }
}
