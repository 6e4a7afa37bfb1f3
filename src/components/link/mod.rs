pub mod messages;

pub use messages::{ClientMessage, PathPayload, PathStatus, ServerMessage};

use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::utils::conditions;
use crate::utils::grid::{Cell, Heading};

/// What the robot is currently blocked on, used to route incoming
/// messages to the right slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    AwaitingStart,
    AwaitingPathConfirmation,
}

/// Shared mailbox between the listener thread and the control loop.
/// Single-consumer slots (`start`, `confirmation`, `path_select`) are
/// taken by the control loop; `unveiled` accumulates until drained.
#[derive(Debug, Default)]
pub struct LinkState {
    pub planet_name: String,
    pub start: Option<(Cell, Heading)>,
    pub confirmation: Option<PathPayload>,
    pub unveiled: Vec<PathPayload>,
    pub target: Option<Cell>,
    pub path_select: Option<Heading>,
    pub done: bool,
    pub phase: SyncPhase,
}

/// Connection to the arbiter over a line-oriented message channel.
/// A background thread decodes inbound lines into [`LinkState`]; the
/// control loop sends outbound messages and polls the state under
/// bounded waits. All map mutation stays on the control loop.
pub struct ArbiterLink {
    outbound: Sender<String>,
    state: Arc<RwLock<LinkState>>,
}

impl ArbiterLink {
    /// Wires the link to a transport and starts the listener thread.
    /// The thread ends when the inbound channel disconnects.
    pub fn new(outbound: Sender<String>, inbound: Receiver<String>) -> Self {
        let state = Arc::new(RwLock::new(LinkState::default()));
        let listener_state = Arc::clone(&state);
        thread::spawn(move || {
            for raw in inbound.iter() {
                match ServerMessage::decode(&raw) {
                    Ok(Some(msg)) => {
                        let mut state = listener_state.write().unwrap();
                        Self::apply(&mut state, msg);
                    }
                    Ok(None) => {}
                    Err(condition) => conditions::report(&condition),
                }
            }
            log::debug!("arbiter link closed");
        });
        Self { outbound, state }
    }

    fn apply(state: &mut LinkState, msg: ServerMessage) {
        match msg {
            ServerMessage::Planet {
                name,
                start,
                orientation,
            } => {
                log::info!("exploring {name}, starting at {start} facing {orientation}");
                state.planet_name = name;
                state.start = Some((start, orientation));
            }
            ServerMessage::Path(payload) => {
                if state.phase == SyncPhase::AwaitingPathConfirmation {
                    state.confirmation = Some(payload);
                } else {
                    // a confirmation outside the window still carries map data
                    state.unveiled.push(payload);
                }
            }
            ServerMessage::PathUnveiled(payload) => state.unveiled.push(payload),
            ServerMessage::Target { cell } => {
                log::info!("new target {cell}");
                state.target = Some(cell);
            }
            ServerMessage::PathSelect { direction } => state.path_select = Some(direction),
            ServerMessage::Done { message } => {
                log::info!("arbiter says: {message}");
                state.done = true;
            }
        }
    }

    fn send(&self, msg: ClientMessage) -> Result<(), String> {
        log::debug!("-> {}", msg.kind());
        self.outbound
            .send(msg.encode())
            .map_err(|e| format!("arbiter link is down: {e}"))
    }

    pub fn send_test_planet(&self, name: &str) -> Result<(), String> {
        self.send(ClientMessage::TestPlanet { name: name.to_string() })
    }

    pub fn send_ready(&self) -> Result<(), String> {
        self.state.write().unwrap().phase = SyncPhase::AwaitingStart;
        self.send(ClientMessage::Ready)
    }

    pub fn send_path_taken(
        &self,
        start: (Cell, Heading),
        end: (Cell, Heading),
        status: PathStatus,
    ) -> Result<(), String> {
        {
            let mut state = self.state.write().unwrap();
            state.confirmation = None;
            state.phase = SyncPhase::AwaitingPathConfirmation;
        }
        self.send(ClientMessage::Path { start, end, status })
    }

    pub fn send_path_select(&self, cell: Cell, direction: Heading) -> Result<(), String> {
        self.send(ClientMessage::PathSelect { cell, direction })
    }

    pub fn send_target_reached(&self) -> Result<(), String> {
        self.send(ClientMessage::TargetReached)
    }

    pub fn send_exploration_completed(&self) -> Result<(), String> {
        self.send(ClientMessage::ExplorationCompleted)
    }

    /// Polls the shared state until `extract` yields or the deadline
    /// passes. 10ms granularity is plenty against a human-scale arbiter.
    fn poll<T>(
        &self,
        timeout: Duration,
        mut extract: impl FnMut(&mut LinkState) -> Option<T>,
    ) -> Option<T> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(value) = extract(&mut self.state.write().unwrap()) {
                return Some(value);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Waits for the start announcement after `ready`.
    pub fn await_start(&self, timeout: Duration) -> Option<(String, Cell, Heading)> {
        let result = self.poll(timeout, |state| {
            state
                .start
                .take()
                .map(|(cell, heading)| (state.planet_name.clone(), cell, heading))
        });
        self.state.write().unwrap().phase = SyncPhase::Idle;
        result
    }

    /// Waits for the confirmation of the last reported path.
    pub fn await_confirmation(&self, timeout: Duration) -> Option<PathPayload> {
        let result = self.poll(timeout, |state| state.confirmation.take());
        self.state.write().unwrap().phase = SyncPhase::Idle;
        result
    }

    /// Waits for the `done` acknowledgement of a completion claim.
    pub fn await_done(&self, timeout: Duration) -> bool {
        self.poll(timeout, |state| state.done.then_some(())).is_some()
    }

    pub fn take_path_select(&self) -> Option<Heading> {
        self.state.write().unwrap().path_select.take()
    }

    /// Drops any stale override from an earlier field.
    pub fn clear_path_select(&self) {
        self.state.write().unwrap().path_select = None;
    }

    pub fn take_unveiled(&self) -> Vec<PathPayload> {
        std::mem::take(&mut self.state.write().unwrap().unveiled)
    }

    pub fn target(&self) -> Option<Cell> {
        self.state.read().unwrap().target
    }

    pub fn planet_name(&self) -> String {
        self.state.read().unwrap().planet_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn create_test_link() -> (ArbiterLink, Sender<String>, Receiver<String>) {
        let (out_tx, out_rx) = unbounded();
        let (in_tx, in_rx) = unbounded();
        (ArbiterLink::new(out_tx, in_rx), in_tx, out_rx)
    }

    #[test]
    fn test_start_announcement_reaches_the_control_loop() {
        let (link, in_tx, out_rx) = create_test_link();
        link.send_ready().unwrap();
        assert!(out_rx.recv().unwrap().contains("\"ready\""));

        in_tx
            .send(
                r#"{"from":"server","type":"planet","payload":
                    {"planetName":"Gromit","startX":0,"startY":0,"startOrientation":0}}"#
                    .to_string(),
            )
            .unwrap();
        let (name, cell, heading) = link.await_start(Duration::from_secs(2)).unwrap();
        assert_eq!(name, "Gromit");
        assert_eq!(cell, Cell::new(0, 0));
        assert_eq!(heading, Heading::North);
    }

    #[test]
    fn test_confirmation_only_lands_inside_the_window() {
        let mut state = LinkState::default();
        let payload_msg = r#"{"from":"server","type":"path","payload":
            {"startX":0,"startY":0,"startDirection":0,
             "endX":0,"endY":1,"endDirection":180,"pathStatus":"free","pathWeight":2}}"#;
        let msg = ServerMessage::decode(payload_msg).unwrap().unwrap();

        // outside the window the data is kept as an unveiling
        ArbiterLink::apply(&mut state, msg.clone());
        assert!(state.confirmation.is_none());
        assert_eq!(state.unveiled.len(), 1);

        state.phase = SyncPhase::AwaitingPathConfirmation;
        ArbiterLink::apply(&mut state, msg);
        assert!(state.confirmation.is_some());
    }

    #[test]
    fn test_await_confirmation_times_out_quietly() {
        let (link, _in_tx, out_rx) = create_test_link();
        link.send_path_taken(
            (Cell::new(0, 0), Heading::North),
            (Cell::new(0, 1), Heading::South),
            PathStatus::Free,
        )
        .unwrap();
        assert!(out_rx.recv().unwrap().contains("\"path\""));
        assert_eq!(link.await_confirmation(Duration::from_millis(30)), None);
    }

    #[test]
    fn test_overrides_and_targets_accumulate_between_polls() {
        let mut state = LinkState::default();
        let select = ServerMessage::decode(
            r#"{"from":"server","type":"pathSelect","payload":{"startDirection":90}}"#,
        )
        .unwrap()
        .unwrap();
        let target = ServerMessage::decode(
            r#"{"from":"server","type":"target","payload":{"targetX":2,"targetY":3}}"#,
        )
        .unwrap()
        .unwrap();
        ArbiterLink::apply(&mut state, select);
        ArbiterLink::apply(&mut state, target);

        assert_eq!(state.path_select, Some(Heading::East));
        assert_eq!(state.target, Some(Cell::new(2, 3)));
    }

    #[test]
    fn test_done_flag_sticks() {
        let mut state = LinkState::default();
        let done = ServerMessage::decode(
            r#"{"from":"server","type":"done","payload":{"message":"all mapped"}}"#,
        )
        .unwrap()
        .unwrap();
        ArbiterLink::apply(&mut state, done);
        assert!(state.done);
    }
}
