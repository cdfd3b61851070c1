use thiserror::Error;
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("No callsign pattern matched the transcript!")]
    NoCallsign,
    #[error("No command recognized after the callsign!")]
    NoCommand,
}
