use serde::Deserialize;
use serde_json::{json, Value};

use crate::components::planet::BLOCKED;
use crate::utils::conditions::Condition;
use crate::utils::grid::{Cell, Heading};

/// Traversability of a path as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStatus {
    Free,
    Blocked,
}

/// Payload shared by the robot's path report and the arbiter's
/// confirmation and unveiling messages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPayload {
    pub start_x: i32,
    pub start_y: i32,
    pub start_direction: Heading,
    pub end_x: i32,
    pub end_y: i32,
    pub end_direction: Heading,
    pub path_status: PathStatus,
    /// Absent in the robot's own report; set by the arbiter.
    #[serde(default)]
    pub path_weight: Option<i64>,
}

impl PathPayload {
    pub fn start(&self) -> (Cell, Heading) {
        (Cell::new(self.start_x, self.start_y), self.start_direction)
    }

    pub fn end(&self) -> (Cell, Heading) {
        (Cell::new(self.end_x, self.end_y), self.end_direction)
    }

    /// Weight to record: blocked paths always get the sentinel, free
    /// paths default to 1 when the arbiter sent none.
    pub fn weight(&self) -> i64 {
        match self.path_status {
            PathStatus::Blocked => BLOCKED,
            PathStatus::Free => self.path_weight.unwrap_or(1),
        }
    }

    /// Whether this payload confirms exactly the path the robot reported.
    pub fn matches_report(
        &self,
        start: (Cell, Heading),
        end: (Cell, Heading),
        status: PathStatus,
    ) -> bool {
        self.start() == start && self.end() == end && self.path_status == status
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    from: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanetPayload {
    planet_name: String,
    start_x: i32,
    start_y: i32,
    start_orientation: Heading,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetPayload {
    target_x: i32,
    target_y: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectPayload {
    start_direction: Heading,
}

#[derive(Debug, Deserialize)]
struct DonePayload {
    message: String,
}

/// Everything the arbiter can say to the robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Start announcement: maze name, start cell, initial heading.
    Planet {
        name: String,
        start: Cell,
        orientation: Heading,
    },
    /// A path the arbiter reveals without the robot driving it.
    PathUnveiled(PathPayload),
    /// A cell the robot should navigate to.
    Target { cell: Cell },
    /// Overrides the heading the robot announced for its next departure.
    PathSelect { direction: Heading },
    /// Authoritative confirmation of the robot's last path report.
    Path(PathPayload),
    /// Acknowledges a completion claim.
    Done { message: String },
}

impl ServerMessage {
    /// Decodes one raw line from the link. The channel echoes the robot's
    /// own messages back; anything not marked `from: server` is skipped
    /// with `Ok(None)`. Malformed or unknown content is a protocol
    /// violation and never touches state.
    pub fn decode(raw: &str) -> Result<Option<ServerMessage>, Condition> {
        let violation = |detail: String| Condition::ProtocolViolation { detail };
        let envelope: Envelope = serde_json::from_str(raw)
            .map_err(|e| violation(format!("undecodable message: {e}")))?;
        if envelope.from != "server" {
            return Ok(None);
        }

        let msg = match envelope.kind.as_str() {
            "planet" => {
                let p: PlanetPayload = parse_payload(envelope.payload)?;
                ServerMessage::Planet {
                    name: p.planet_name,
                    start: Cell::new(p.start_x, p.start_y),
                    orientation: p.start_orientation,
                }
            }
            "pathUnveiled" => ServerMessage::PathUnveiled(parse_payload(envelope.payload)?),
            "target" => {
                let p: TargetPayload = parse_payload(envelope.payload)?;
                ServerMessage::Target {
                    cell: Cell::new(p.target_x, p.target_y),
                }
            }
            "pathSelect" => {
                let p: SelectPayload = parse_payload(envelope.payload)?;
                ServerMessage::PathSelect {
                    direction: p.start_direction,
                }
            }
            "path" => ServerMessage::Path(parse_payload(envelope.payload)?),
            "done" => {
                let p: DonePayload = parse_payload(envelope.payload)?;
                ServerMessage::Done { message: p.message }
            }
            other => {
                return Err(violation(format!("unknown message type '{other}'")));
            }
        };
        Ok(Some(msg))
    }
}

fn parse_payload<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, Condition> {
    serde_json::from_value(payload).map_err(|e| Condition::ProtocolViolation {
        detail: format!("bad payload: {e}"),
    })
}

/// Everything the robot can say to the arbiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Requests a specific practice maze; sent before `ready` if at all.
    TestPlanet { name: String },
    /// Announces the robot is on its first field and wants the start data.
    Ready,
    /// Reports the path just driven, weight left to the arbiter.
    Path {
        start: (Cell, Heading),
        end: (Cell, Heading),
        status: PathStatus,
    },
    /// Announces the heading chosen for the next departure.
    PathSelect { cell: Cell, direction: Heading },
    /// Claims the current target has been reached.
    TargetReached,
    /// Claims every reachable path has been explored.
    ExplorationCompleted,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::TestPlanet { .. } => "testPlanet",
            ClientMessage::Ready => "ready",
            ClientMessage::Path { .. } => "path",
            ClientMessage::PathSelect { .. } => "pathSelect",
            ClientMessage::TargetReached => "targetReached",
            ClientMessage::ExplorationCompleted => "explorationCompleted",
        }
    }

    /// Serializes to the wire envelope. Headings travel as degrees.
    pub fn encode(&self) -> String {
        let payload = match self {
            ClientMessage::TestPlanet { name } => json!({ "planetName": name }),
            ClientMessage::Ready
            | ClientMessage::TargetReached
            | ClientMessage::ExplorationCompleted => json!({}),
            ClientMessage::Path {
                start: (start_cell, start_dir),
                end: (end_cell, end_dir),
                status,
            } => json!({
                "startX": start_cell.x,
                "startY": start_cell.y,
                "startDirection": start_dir.degrees(),
                "endX": end_cell.x,
                "endY": end_cell.y,
                "endDirection": end_dir.degrees(),
                "pathStatus": match status {
                    PathStatus::Free => "free",
                    PathStatus::Blocked => "blocked",
                },
            }),
            ClientMessage::PathSelect { cell, direction } => json!({
                "startX": cell.x,
                "startY": cell.y,
                "startDirection": direction.degrees(),
            }),
        };
        json!({
            "from": "client",
            "type": self.kind(),
            "payload": payload,
        })
        .to_string()
    }
}
