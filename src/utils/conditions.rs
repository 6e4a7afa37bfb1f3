use thiserror::Error;

use crate::utils::grid::Cell;

/// Recoverable mission conditions. None of these ends the mission:
/// they are reported for diagnosis and the control loop carries on
/// with the best state it has.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Condition {
    /// The field color does not match the parity model's expectation for
    /// the dead-reckoned cell. Coordinates stay provisional until the
    /// next confirmation; no blind correction is attempted.
    #[error("parity drift at {cell}: {detail}")]
    Drift { cell: Cell, detail: String },

    /// The arbiter's confirmation disagrees with the path we reported.
    /// The confirmed values are adopted.
    #[error("desync with arbiter: {detail}")]
    Desync { detail: String },

    /// A bounded wait elapsed without an answer from the arbiter.
    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: &'static str },

    /// A target is set but no unblocked route to it exists yet.
    #[error("no route from {from} to target {target}")]
    Unreachable { from: Cell, target: Cell },

    /// A malformed or unrecognized message; discarded without touching state.
    #[error("protocol violation: {detail}")]
    ProtocolViolation { detail: String },
}

/// Single funnel for advisory conditions.
pub fn report(condition: &Condition) {
    log::warn!("{condition}");
}
