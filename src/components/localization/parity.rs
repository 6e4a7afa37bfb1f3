use std::fmt;

use crate::utils::conditions::Condition;
use crate::utils::grid::Cell;

/// Discrete color classification of a field, delivered by the sensor
/// wrapper. Fields alternate between the two colors like a chessboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldColor {
    Blue,
    Red,
}

impl fmt::Display for FieldColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldColor::Blue => write!(f, "blue"),
            FieldColor::Red => write!(f, "red"),
        }
    }
}

/// Chessboard model of the maze coloring: fixed once from the first
/// classified field, immutable afterwards. A later mismatch flags
/// localization drift but is never auto-corrected; the arbiter's
/// confirmations are the source of truth for coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParityModel {
    blue_even: bool,
}

impl ParityModel {
    /// Anchors the model: `color` was observed at `cell`.
    pub fn from_reference(color: FieldColor, cell: Cell) -> Self {
        let cell_even = cell.parity() == 0;
        match color {
            FieldColor::Blue => Self { blue_even: cell_even },
            FieldColor::Red => Self { blue_even: !cell_even },
        }
    }

    /// Expected (x + y) parity for a field of the given color.
    pub fn expected_parity(&self, color: FieldColor) -> i32 {
        let blue_parity = if self.blue_even { 0 } else { 1 };
        match color {
            FieldColor::Blue => blue_parity,
            FieldColor::Red => 1 - blue_parity,
        }
    }

    /// Whether `color` at `cell` is consistent with the model.
    pub fn matches(&self, color: FieldColor, cell: Cell) -> bool {
        cell.parity() == self.expected_parity(color)
    }

    /// Checks a classified field and produces the Drift condition on
    /// mismatch, for the caller to report.
    pub fn check(&self, color: FieldColor, cell: Cell) -> Option<Condition> {
        if self.matches(color, cell) {
            None
        } else {
            Some(Condition::Drift {
                cell,
                detail: format!(
                    "saw {color}, expected a field of parity {}",
                    self.expected_parity(color)
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_field_always_matches_itself() {
        let model = ParityModel::from_reference(FieldColor::Blue, Cell::new(3, 4));
        assert!(model.matches(FieldColor::Blue, Cell::new(3, 4)));
        assert!(!model.blue_even);
    }

    #[test]
    fn test_colors_alternate_between_neighbours() {
        let model = ParityModel::from_reference(FieldColor::Red, Cell::new(0, 0));
        assert!(model.matches(FieldColor::Blue, Cell::new(0, 1)));
        assert!(model.matches(FieldColor::Red, Cell::new(0, 2)));
        assert!(model.matches(FieldColor::Blue, Cell::new(-1, 0)));
    }

    #[test]
    fn test_mismatch_raises_drift() {
        let model = ParityModel::from_reference(FieldColor::Red, Cell::new(0, 0));
        let cond = model.check(FieldColor::Red, Cell::new(0, 1));
        assert!(matches!(cond, Some(Condition::Drift { cell, .. }) if cell == Cell::new(0, 1)));
        assert_eq!(model.check(FieldColor::Red, Cell::new(2, 0)), None);
    }
}
