use thiserror::Error;
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid altitude: {}",.0)]
    InvalidAltitude(i64),
    #[error("Invalid heading: {}",.0)]
    InvalidHeading(u32),
    #[error("Serde Json (de)serialization failed!")]
    SerdeDeserialize(#[from] serde_json::Error),
    #[error("Std Io Error!")]
    StdIo(#[from] std::io::Error),
}
