use crate::components::localization::FieldColor;

/// Hardware seam of the mission loop. The real robot implements this over
/// motors and sensors; tests script it. All headings here are relative to
/// the robot's current facing, in clockwise degrees.
pub trait DriveIo {
    /// Motor encoder degrees turned since the previous call, (left, right).
    fn encoder_deltas(&mut self) -> (i32, i32);

    /// `Some(color)` exactly once per arrival on a colored field,
    /// `None` while driving between fields.
    fn field_color(&mut self) -> Option<FieldColor>;

    /// Whether the collision sensor fired since the previous call.
    fn obstacle_detected(&mut self) -> bool;

    /// Whether an operator asked to stop the mission.
    fn stop_requested(&mut self) -> bool;

    /// Spins in place and returns the relative bearings (clockwise
    /// degrees from the current facing) at which a path leaves the field.
    fn scan_paths(&mut self) -> Vec<u16>;

    /// Nudges the robot onto the center of the field it just entered.
    fn center_on_field(&mut self);

    /// Rotates in place by the given clockwise degrees.
    fn turn_to(&mut self, relative_deg: u16);

    /// Advances one control tick along the line.
    fn follow_line(&mut self);
}
