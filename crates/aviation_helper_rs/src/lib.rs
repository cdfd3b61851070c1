//! Shared aviation domain types for the ATC understanding engine.
//!
//! Value types (altitudes, headings) plus the per-utterance aircraft context
//! the understanding pipeline matches against.

pub mod aircraft;
pub mod errors;
pub mod types;

pub use aircraft::{Aircraft, AircraftContext, AddressingForm, FlightState};
pub use errors::Error;
