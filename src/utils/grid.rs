use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// Integer coordinate of a field on the (unbounded) maze grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// (x + y) mod 2, always 0 or 1 (also for negative coordinates).
    pub fn parity(self) -> i32 {
        (self.x + self.y).rem_euclid(2)
    }

    /// The cell shifted by a number of grid segments in each axis.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal heading on the maze grid. On the wire a heading is its
/// compass angle in degrees (0, 90, 180, 270).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    /// Compass angle in degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Heading::North => 0,
            Heading::East => 90,
            Heading::South => 180,
            Heading::West => 270,
        }
    }

    /// Parses a compass angle; anything but a multiple of 90 is rejected.
    pub fn from_degrees(degrees: u16) -> Result<Self, String> {
        let normalized = degrees % 360;
        Heading::iter()
            .find(|h| h.degrees() == normalized)
            .ok_or_else(|| format!("{degrees} is not a cardinal heading"))
    }

    /// The heading after turning clockwise by `degrees` (a multiple of 90).
    pub fn rotated_by(self, degrees: u16) -> Self {
        // cannot fail: the sum of two multiples of 90 stays a multiple of 90
        Heading::from_degrees((self.degrees() + degrees % 360) % 360)
            .unwrap_or(self)
    }

    pub fn opposite(self) -> Self {
        self.rotated_by(180)
    }

    /// Clockwise degrees to turn from `current` onto `self`.
    pub fn relative_to(self, current: Heading) -> u16 {
        (360 + self.degrees() - current.degrees()) % 360
    }
}

impl TryFrom<u16> for Heading {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Heading::from_degrees(value)
    }
}

impl From<Heading> for u16 {
    fn from(value: Heading) -> Self {
        value.degrees()
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Heading::North => "North",
            Heading::East => "East",
            Heading::South => "South",
            Heading::West => "West",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_handles_negative_coordinates() {
        assert_eq!(Cell::new(0, 0).parity(), 0);
        assert_eq!(Cell::new(-1, 0).parity(), 1);
        assert_eq!(Cell::new(-2, -3).parity(), 1);
        assert_eq!(Cell::new(-2, -2).parity(), 0);
    }

    #[test]
    fn test_heading_degree_round_trip() {
        for heading in Heading::iter() {
            assert_eq!(Heading::from_degrees(heading.degrees()), Ok(heading));
        }
        assert!(Heading::from_degrees(45).is_err());
    }

    #[test]
    fn test_heading_rotation() {
        assert_eq!(Heading::North.rotated_by(90), Heading::East);
        assert_eq!(Heading::West.rotated_by(90), Heading::North);
        assert_eq!(Heading::North.opposite(), Heading::South);
        assert_eq!(Heading::East.opposite(), Heading::West);
    }

    #[test]
    fn test_relative_turn() {
        assert_eq!(Heading::East.relative_to(Heading::North), 90);
        assert_eq!(Heading::North.relative_to(Heading::East), 270);
        assert_eq!(Heading::South.relative_to(Heading::South), 0);
    }
}
