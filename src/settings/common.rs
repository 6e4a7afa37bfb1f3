use std::env;
use std::time::Duration;

/// Runtime configuration of the rover. Every value has a default measured
/// on the physical robot; each can be overridden through the environment
/// (a `.env` file is honored via dotenv).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Distance between the two drive wheels, in cm.
    pub wheel_separation_cm: f64,
    /// Drive wheel diameter, in cm.
    pub wheel_diameter_cm: f64,
    /// Length of one grid segment between two fields, in cm.
    pub segment_length_cm: f64,
    /// Angular tolerance when bucketing the heading integral, in degrees.
    pub turn_tolerance_deg: f64,
    /// Control-loop ticks between odometry integrations.
    pub odometry_interval: u64,
    /// How long to wait for the arbiter's start announcement.
    pub start_timeout: Duration,
    /// How long to wait for a path confirmation per field visit.
    pub confirmation_timeout: Duration,
    /// Window after announcing a heading in which the arbiter may
    /// deliver a target or a path-select override.
    pub select_window: Duration,
    /// How long to wait for the `done` acknowledgement.
    pub done_timeout: Duration,
    /// Optional practice maze announced before `ready`.
    pub test_planet: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wheel_separation_cm: 12.5,
            wheel_diameter_cm: 5.6,
            segment_length_cm: 42.0,
            turn_tolerance_deg: 45.0,
            odometry_interval: 10,
            start_timeout: Duration::from_secs(60),
            confirmation_timeout: Duration::from_millis(3000),
            select_window: Duration::from_millis(3000),
            done_timeout: Duration::from_millis(5000),
            test_planet: None,
        }
    }
}

impl Settings {
    /// Loads the settings from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Settings::default();
        Self {
            wheel_separation_cm: env_f64("ROVER_WHEEL_SEPARATION_CM", defaults.wheel_separation_cm),
            wheel_diameter_cm: env_f64("ROVER_WHEEL_DIAMETER_CM", defaults.wheel_diameter_cm),
            segment_length_cm: env_f64("ROVER_SEGMENT_LENGTH_CM", defaults.segment_length_cm),
            turn_tolerance_deg: env_f64("ROVER_TURN_TOLERANCE_DEG", defaults.turn_tolerance_deg),
            odometry_interval: env_u64("ROVER_ODOMETRY_INTERVAL", defaults.odometry_interval),
            start_timeout: env_millis("ROVER_START_TIMEOUT_MS", defaults.start_timeout),
            confirmation_timeout: env_millis(
                "ROVER_CONFIRMATION_TIMEOUT_MS",
                defaults.confirmation_timeout,
            ),
            select_window: env_millis("ROVER_SELECT_WINDOW_MS", defaults.select_window),
            done_timeout: env_millis("ROVER_DONE_TIMEOUT_MS", defaults.done_timeout),
            test_planet: env::var("ROVER_TEST_PLANET").ok().filter(|s| !s.is_empty()),
        }
    }

    /// Wheel circumference in cm, derived from the configured diameter.
    pub fn wheel_circumference_cm(&self) -> f64 {
        self.wheel_diameter_cm * std::f64::consts::PI
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_calibrated_robot() {
        let settings = Settings::default();
        assert_eq!(settings.wheel_separation_cm, 12.5);
        assert_eq!(settings.segment_length_cm, 42.0);
        assert_eq!(settings.odometry_interval, 10);
        // 5.6 cm wheels, so one full rotation is a bit under 18 cm
        assert!((settings.wheel_circumference_cm() - 17.59).abs() < 0.01);
    }
}
