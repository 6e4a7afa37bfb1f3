use crate::utils::grid::Heading;

/// The seven-way classification of the heading integral accumulated over
/// one segment. Positive angles are counterclockwise (left) turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnClass {
    /// ~0°: the robot left the field the way it was facing.
    Straight,
    /// +90°: left turn.
    Left,
    /// -90°: right turn.
    Right,
    /// +180° or -180°: the robot left backwards.
    UTurn,
    /// +270°: three-quarter loop to the left, net effect of a right turn.
    LeftLoop,
    /// -270°: three-quarter loop to the right, net effect of a left turn.
    RightLoop,
}

impl TurnClass {
    /// Buckets a heading integral (degrees) with the given tolerance.
    /// Anything outside all seven buckets cannot be classified.
    pub fn classify(gamma_deg: f64, tolerance_deg: f64) -> Result<Self, String> {
        let near = |center: f64| (gamma_deg - center).abs() < tolerance_deg;
        if near(0.0) {
            Ok(TurnClass::Straight)
        } else if near(90.0) {
            Ok(TurnClass::Left)
        } else if near(-90.0) {
            Ok(TurnClass::Right)
        } else if near(180.0) || near(-180.0) {
            Ok(TurnClass::UTurn)
        } else if near(270.0) {
            Ok(TurnClass::LeftLoop)
        } else if near(-270.0) {
            Ok(TurnClass::RightLoop)
        } else {
            Err(format!("cannot classify a heading integral of {gamma_deg:.1}°"))
        }
    }

    /// Clockwise compass change caused by this turn. A left (counter-
    /// clockwise) turn of +90° moves the compass back by 90°, i.e. +270°.
    pub fn heading_change(self) -> u16 {
        match self {
            TurnClass::Straight => 0,
            TurnClass::Left => 270,
            TurnClass::Right => 90,
            TurnClass::UTurn => 180,
            TurnClass::LeftLoop => 90,
            TurnClass::RightLoop => 270,
        }
    }
}

/// Result of classifying one traversed segment: the robot's new absolute
/// heading and the signed cell displacement to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMove {
    pub new_heading: Heading,
    pub dx: i32,
    pub dy: i32,
}

/// The kinematic correction for a robot that re-centers on a field before
/// rotating: the odometry frame's segment counts (`seg_x`, `seg_y`) are
/// rotated into the world frame by the heading held while driving, and the
/// turn class fixes the new heading. Total over the whole (heading, class)
/// domain.
pub fn apply(heading: Heading, class: TurnClass, seg_x: i32, seg_y: i32) -> SegmentMove {
    let (dx, dy) = match heading {
        Heading::North => (seg_x, seg_y),
        Heading::East => (seg_y, -seg_x),
        Heading::South => (-seg_x, -seg_y),
        Heading::West => (-seg_y, seg_x),
    };
    SegmentMove {
        new_heading: heading.rotated_by(class.heading_change()),
        dx,
        dy,
    }
}
