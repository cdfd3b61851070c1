use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A magnetic heading in whole degrees, normalized into 1..=360.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Heading(u32);

impl Heading {
    pub fn new(val: u32) -> Self {
        let wrapped = val % 360;
        Heading(if wrapped == 0 { 360 } else { wrapped })
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for Heading {
    fn from(value: u32) -> Self {
        Heading::new(value)
    }
}

impl Display for Heading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub enum TurnDirection {
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_wrap_and_format_with_leading_zeros() {
        assert_eq!(Heading::new(90).to_string(), "090");
        assert_eq!(Heading::new(360).to_string(), "360");
        assert_eq!(Heading::new(0).get(), 360);
        assert_eq!(Heading::new(450).get(), 90);
    }
}
