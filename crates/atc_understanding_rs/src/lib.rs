//! ATC transcript understanding library
//!
//! Turns a noisy speech-to-text transcript of a controller transmission,
//! together with the set of aircraft currently on frequency, into the ICAO
//! callsign of the addressed aircraft and a sequence of canonical command
//! codes.
//!
//! Pipeline: raw string -> [`normalize`] -> [`tokenize`] ->
//! [`match_callsign`] -> [`parse_commands`] over the remaining tail.
//!
//! The lexicon and the two rule registries are process-wide, built once on
//! first use and read-only afterwards. Tests can construct their own
//! registries and use the `*_with` variants instead.

pub mod callsign;
pub mod command;
pub mod errors;
pub mod lexicon;
pub mod metrics;
pub mod normalizer;
pub mod params;
pub mod registry;
pub mod tokenizer;

pub use callsign::{CallsignMatch, CallsignPattern, CallsignRegistry, match_callsign};
pub use command::{CommandRegistry, CommandTemplate, parse_commands};
pub use errors::Error;
pub use lexicon::Lexicon;
pub use normalizer::normalize;
pub use tokenizer::{Token, TokenKind, tokenize};

// Re-export the context types callers need to drive the pipeline.
pub use aviation_helper_rs::aircraft::{Aircraft, AircraftContext, AddressingForm};

/// Result of running the full pipeline over one transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct Understanding {
    pub callsign: CallsignMatch,
    pub codes: Vec<String>,
}

/// Run the whole pipeline with the process-wide lexicon and registries.
pub fn understand(transcript: &str, context: &AircraftContext) -> Result<Understanding, Error> {
    let words = normalize(transcript);
    let tokens = tokenize(&words);
    let (matched, tail) = match_callsign(&tokens, context);
    let Some(matched) = matched else {
        return Err(Error::NoCallsign);
    };
    let Some(aircraft) = context.get(&matched.spoken_key) else {
        return Err(Error::NoCallsign);
    };
    let codes = parse_commands(tail, aircraft)?;
    Ok(Understanding {
        callsign: matched,
        codes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_pipeline_smoke_test() {
        let mut context = AircraftContext::new();
        context.insert("jetblue 98".to_string(), Aircraft::new("JBU98"));
        let result = understand("JetBlue 98 turn right heading two seven zero", &context).unwrap();
        assert_eq!(result.callsign.callsign, "JBU98");
        assert_eq!(result.codes, ["R270"]);
    }

    #[test]
    fn no_callsign_is_an_error_value() {
        let context = AircraftContext::new();
        let result = understand("turn right heading two seven zero", &context);
        assert_eq!(result.unwrap_err(), Error::NoCallsign);
    }

    #[test]
    fn matches_serialize_for_callers() {
        let mut context = AircraftContext::new();
        context.insert("jetblue 98".to_string(), Aircraft::new("JBU98"));
        let result = understand("JetBlue 98 squawk one two three four", &context).unwrap();
        let json = serde_json::to_string(&result.callsign).unwrap();
        assert!(json.contains("\"JBU98\""));
    }
}
