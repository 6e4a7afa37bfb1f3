pub mod parity;
pub mod turn_table;

pub use parity::{FieldColor, ParityModel};
pub use turn_table::{SegmentMove, TurnClass};

use crate::settings::Settings;
use crate::utils::grid::Heading;

/// Differential-drive dead reckoning. Encoder deltas are folded into a
/// planar pose accumulator while the robot drives; on arrival at a field
/// the accumulator is collapsed into whole segments plus a turn class and
/// cleared for the next leg.
#[derive(Debug, Clone)]
pub struct DeadReckoning {
    wheel_separation_cm: f64,
    wheel_circumference_cm: f64,
    segment_length_cm: f64,
    turn_tolerance_deg: f64,
    delta_x: f64,
    delta_y: f64,
    gamma: f64,
}

impl DeadReckoning {
    pub fn new(settings: &Settings) -> Self {
        Self {
            wheel_separation_cm: settings.wheel_separation_cm,
            wheel_circumference_cm: settings.wheel_circumference_cm(),
            segment_length_cm: settings.segment_length_cm,
            turn_tolerance_deg: settings.turn_tolerance_deg,
            delta_x: 0.0,
            delta_y: 0.0,
            gamma: 0.0,
        }
    }

    /// Folds one pair of encoder deltas (motor degrees since the previous
    /// call) into the pose. Uses the arc model of a differential drive;
    /// equal deltas degenerate to a straight step.
    pub fn integrate(&mut self, delta_left_deg: i32, delta_right_deg: i32) {
        let dl = f64::from(delta_left_deg) / 360.0 * self.wheel_circumference_cm;
        let dr = f64::from(delta_right_deg) / 360.0 * self.wheel_circumference_cm;
        let alpha = (dr - dl) / self.wheel_separation_cm;
        let s = if alpha == 0.0 {
            dr
        } else {
            ((dl + dr) / alpha) * (alpha / 2.0).sin()
        };
        self.delta_x += -(self.gamma + alpha / 2.0).sin() * s;
        self.delta_y += (self.gamma + alpha / 2.0).cos() * s;
        self.gamma += alpha;
    }

    /// Collapses the accumulated pose into a segment move relative to
    /// `heading`, the absolute heading held when the leg started. The
    /// accumulator is cleared even when classification fails, so a
    /// hopeless estimate never bleeds into the next leg.
    pub fn classify_segment(&mut self, heading: Heading) -> Result<SegmentMove, String> {
        let seg_x = (self.delta_x / self.segment_length_cm).round() as i32;
        let seg_y = (self.delta_y / self.segment_length_cm).round() as i32;
        let gamma_deg = self.gamma.to_degrees();
        self.reset();
        let class = TurnClass::classify(gamma_deg, self.turn_tolerance_deg)?;
        Ok(turn_table::apply(heading, class, seg_x, seg_y))
    }

    /// Discards the accumulated pose, e.g. after a retreat from an obstacle
    /// or when a confirmation already fixed the position.
    pub fn reset(&mut self) {
        self.delta_x = 0.0;
        self.delta_y = 0.0;
        self.gamma = 0.0;
    }

    /// Heading integral so far, in degrees.
    pub fn gamma_degrees(&self) -> f64 {
        self.gamma.to_degrees()
    }

    /// Planar displacement so far, in cm.
    pub fn displacement(&self) -> (f64, f64) {
        (self.delta_x, self.delta_y)
    }
}
