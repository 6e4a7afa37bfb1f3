mod components;
mod macros;
pub mod settings;
mod utils;

pub use components::explorer_ai::{Completion, ExplorationPolicy};
pub use components::link::{
    ArbiterLink, ClientMessage, LinkState, PathPayload, PathStatus, ServerMessage, SyncPhase,
};
pub use components::localization::{
    DeadReckoning, FieldColor, ParityModel, SegmentMove, TurnClass,
};
pub use components::mission::{DriveIo, Mission, MissionOutcome, RobotState};
pub use components::planet::{PathEnd, Planet, BLOCKED};
pub use settings::Settings;
pub use utils::{Cell, Condition, Heading};
