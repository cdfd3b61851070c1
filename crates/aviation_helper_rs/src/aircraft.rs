//! Per-utterance aircraft context.
//!
//! The caller supplies one [`AircraftContext`] per transmission: a map from
//! *spoken key* (the phonetic form a controller would utter, e.g.
//! "american 5936" or "november 1 2 3 alpha bravo") to the aircraft record.
//! The same aircraft may appear under several spoken keys, each with its own
//! addressing form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::Error;

/// How a spoken key addresses the aircraft. Ordering matters: `FullName`
/// sorts first and wins score ties in the callsign matcher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
pub enum AddressingForm {
    #[default]
    FullName,
    /// Type name plus trailing three characters ("skyhawk 3 alpha bravo").
    TypeTrailing3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum FlightState {
    #[default]
    Enroute,
    Departure,
    Arrival,
    OnApproach,
    Landed,
}

/// Context record for one aircraft on frequency.
///
/// Only the fields the matching core reads are behavioral (`callsign`,
/// `addressing_form`, `altitude`); the rest are pass-through context for the
/// typed command parameter parsers.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Aircraft {
    /// ICAO form, e.g. "AAL5936" or "N123AB".
    pub callsign: String,
    pub aircraft_type: String,
    pub addressing_form: AddressingForm,
    /// Spoken fix name (lowercase) to canonical fix identifier.
    pub fixes: BTreeMap<String, String>,
    /// Spoken approach name to canonical approach code, e.g.
    /// "ils runway 27 right" -> "I27R".
    pub candidate_approaches: BTreeMap<String, String>,
    pub approach_fixes: BTreeMap<String, String>,
    pub sid: Option<String>,
    pub star: Option<String>,
    pub assigned_approach: Option<String>,
    /// Current altitude in feet.
    pub altitude: u32,
    pub state: FlightState,
    pub tracking_controller: Option<String>,
    /// Runways available for land-and-hold-short clearances.
    pub lahso_runways: Vec<String>,
}

impl Aircraft {
    pub fn new(callsign: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            ..Self::default()
        }
    }

    /// General aviation aircraft carry "N"-prefixed callsigns.
    pub fn is_ga(&self) -> bool {
        self.callsign.starts_with('N')
    }

    /// Flight-number portion of the callsign: everything from the first
    /// digit onward ("AAL5936" -> "5936", "N922VR" -> "922VR").
    pub fn flight_number(&self) -> &str {
        match self.callsign.find(|c: char| c.is_ascii_digit()) {
            Some(idx) => &self.callsign[idx..],
            None => "",
        }
    }

    /// Digits of the flight-number portion ("N922VR" -> "922").
    pub fn flight_digits(&self) -> String {
        self.flight_number()
            .chars()
            .filter(char::is_ascii_digit)
            .collect()
    }
}

/// Spoken key to aircraft. A `BTreeMap` keeps iteration sorted by spoken
/// key, which the matcher relies on for deterministic tie-breaking.
pub type AircraftContext = BTreeMap<String, Aircraft>;

/// Load a context from JSON, e.g. a recorded scenario file.
pub fn load_context<R>(reader: R) -> Result<AircraftContext, Error>
where
    R: std::io::Read,
{
    let res = serde_json::from_reader(reader)?;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_number_starts_at_first_digit() {
        let ac = Aircraft::new("AAL5936");
        assert_eq!(ac.flight_number(), "5936");
        let ga = Aircraft::new("N922VR");
        assert_eq!(ga.flight_number(), "922VR");
        assert_eq!(ga.flight_digits(), "922");
        assert!(ga.is_ga());
    }

    #[test]
    fn context_loads_from_json() {
        let json = r#"{
            "american 5936": { "callsign": "AAL5936", "aircraft_type": "B738", "altitude": 12000 }
        }"#;
        let ctx = load_context(json.as_bytes()).unwrap();
        assert_eq!(ctx["american 5936"].callsign, "AAL5936");
        assert_eq!(ctx["american 5936"].altitude, 12000);
    }
}
