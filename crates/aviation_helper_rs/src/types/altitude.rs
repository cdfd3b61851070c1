use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum VerticalDirection {
    Climb,
    Descend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Altitude {
    Feet(u32),
    FlightLevel(u32),
}

impl Altitude {
    pub fn as_feet(self) -> u32 {
        match self {
            Altitude::Feet(f) => f,
            Altitude::FlightLevel(fl) => fl * 100,
        }
    }

    /// Direction an aircraft at `current_feet` has to fly to reach this altitude.
    pub fn direction_from(self, current_feet: u32) -> VerticalDirection {
        if self.as_feet() > current_feet {
            VerticalDirection::Climb
        } else {
            VerticalDirection::Descend
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flight_level_converts_to_feet() {
        assert_eq!(Altitude::FlightLevel(350).as_feet(), 35000);
        assert_eq!(Altitude::Feet(4000).as_feet(), 4000);
    }

    #[test]
    fn direction_relative_to_current_altitude() {
        assert_eq!(
            Altitude::Feet(10000).direction_from(12000),
            VerticalDirection::Descend
        );
        assert_eq!(
            Altitude::Feet(10000).direction_from(4000),
            VerticalDirection::Climb
        );
    }
}
