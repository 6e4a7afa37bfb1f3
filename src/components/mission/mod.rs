pub mod io;

pub use io::DriveIo;

use std::collections::BTreeSet;
use std::thread;

use crate::components::explorer_ai::{Completion, ExplorationPolicy};
use crate::components::link::{ArbiterLink, PathStatus};
use crate::components::localization::{turn_table, DeadReckoning, FieldColor, ParityModel};
use crate::components::planet::{Planet, BLOCKED};
use crate::settings::Settings;
use crate::utils::conditions::{self, Condition};
use crate::utils::grid::{Cell, Heading};

/// How a mission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionOutcome {
    TargetReached,
    ExplorationCompleted,
    ManualStop,
}

/// The robot's believed pose and the bookkeeping of the current leg.
#[derive(Debug, Default)]
pub struct RobotState {
    /// Cell and facing, `None` until the arbiter announces the start.
    pub position: Option<(Cell, Heading)>,
    /// Cell and heading the current leg departed under.
    departure: Option<(Cell, Heading)>,
    /// The current leg bounced off an obstacle and drove back.
    came_from_obstacle: bool,
}

/// The mission loop: drives field to field, keeps the pose estimate and
/// the map current, and synchronizes every step with the arbiter.
pub struct Mission<D: DriveIo> {
    io: D,
    link: ArbiterLink,
    planet: Planet,
    policy: ExplorationPolicy,
    dead_reckoning: DeadReckoning,
    parity: Option<ParityModel>,
    robot: RobotState,
    settings: Settings,
    ticks: u64,
    first_field: bool,
    segment_status: PathStatus,
}

impl<D: DriveIo> Mission<D> {
    pub fn new(io: D, link: ArbiterLink, policy: ExplorationPolicy, settings: Settings) -> Self {
        let _ = env_logger::Builder::from_default_env().try_init();
        let dead_reckoning = DeadReckoning::new(&settings);
        Self {
            io,
            link,
            planet: Planet::new(),
            policy,
            dead_reckoning,
            parity: None,
            robot: RobotState::default(),
            settings,
            ticks: 0,
            first_field: true,
            segment_status: PathStatus::Free,
        }
    }

    pub fn planet(&self) -> &Planet {
        &self.planet
    }

    pub fn robot(&self) -> &RobotState {
        &self.robot
    }

    /// Runs until the arbiter acknowledges a completion claim or an
    /// operator stops the robot. Err on a broken link, a missing start
    /// announcement, or a field with no exits at all.
    pub fn run(&mut self) -> Result<MissionOutcome, String> {
        loop {
            if self.io.stop_requested() {
                log::info!("manual stop requested");
                return Ok(MissionOutcome::ManualStop);
            }
            match self.io.field_color() {
                None => {
                    self.io.follow_line();
                    self.ticks += 1;
                    if self.ticks % self.settings.odometry_interval == 0 {
                        let (left, right) = self.io.encoder_deltas();
                        self.dead_reckoning.integrate(left, right);
                        crate::debug_println!(
                            "tick {}: pose {:?}, gamma {:.1}",
                            self.ticks,
                            self.dead_reckoning.displacement(),
                            self.dead_reckoning.gamma_degrees()
                        );
                    }
                    if self.io.obstacle_detected() {
                        self.on_obstacle();
                    }
                }
                Some(color) => {
                    if let Some(outcome) = self.on_field_arrival(color)? {
                        return Ok(outcome);
                    }
                }
            }
        }
    }

    /// Obstacle on the current leg: the exit it departed under is a dead
    /// end. Turn around and drive back; the pose estimate of the leg is
    /// worthless from here on.
    fn on_obstacle(&mut self) {
        let Some((cell, heading)) = self.robot.departure else {
            return;
        };
        log::info!("obstacle on the path leaving {cell} towards {heading}");
        self.planet.add_path((cell, heading), (cell, heading), BLOCKED);
        self.segment_status = PathStatus::Blocked;
        self.robot.came_from_obstacle = true;
        self.io.turn_to(180);
        self.robot.position = Some((cell, heading.opposite()));
        self.dead_reckoning.reset();
    }

    fn on_field_arrival(&mut self, color: FieldColor) -> Result<Option<MissionOutcome>, String> {
        self.io.center_on_field();
        if self.first_field {
            self.start_mission(color)?;
        } else {
            self.finish_segment(color)?;
        }
        self.plan_departure()
    }

    /// First field: announce readiness and adopt the arbiter's start pose.
    fn start_mission(&mut self, color: FieldColor) -> Result<(), String> {
        if let Some(name) = self.settings.test_planet.clone() {
            self.link.send_test_planet(&name)?;
        }
        self.link.send_ready()?;
        let (name, cell, heading) = self
            .link
            .await_start(self.settings.start_timeout)
            .ok_or("the arbiter never announced a start")?;
        log::info!("exploring {name} from {cell} facing {heading}");
        self.robot.position = Some((cell, heading));
        // the entry line behind the start field leads off the maze
        self.planet
            .add_path((cell, heading.opposite()), (cell, heading.opposite()), BLOCKED);
        self.parity = Some(ParityModel::from_reference(color, cell));
        self.dead_reckoning.reset();
        self.first_field = false;
        Ok(())
    }

    /// End of a driven leg: collapse the odometry into a provisional pose,
    /// report the path, and let the confirmation overrule the estimate.
    fn finish_segment(&mut self, color: FieldColor) -> Result<(), String> {
        let (dep_cell, dep_heading) = self
            .robot
            .departure
            .ok_or("arrived on a field without a recorded departure")?;
        let blocked = self.segment_status == PathStatus::Blocked;

        let (report_end, weight_estimate) = if blocked || self.robot.came_from_obstacle {
            self.dead_reckoning.reset();
            ((dep_cell, dep_heading), BLOCKED)
        } else {
            let mv = match self.dead_reckoning.classify_segment(dep_heading) {
                Ok(mv) => mv,
                Err(detail) => {
                    // the next confirmation re-anchors the pose
                    log::warn!("{detail}; assuming one straight segment");
                    turn_table::apply(dep_heading, turn_table::TurnClass::Straight, 0, 1)
                }
            };
            let cell = dep_cell.offset(mv.dx, mv.dy);
            let estimate = i64::from((mv.dx.abs() + mv.dy.abs()).max(1));
            ((cell, mv.new_heading.opposite()), estimate)
        };

        if let Some(model) = &self.parity {
            if let Some(drift) = model.check(color, report_end.0) {
                conditions::report(&drift);
            }
        }

        let status = if blocked { PathStatus::Blocked } else { PathStatus::Free };
        self.link
            .send_path_taken((dep_cell, dep_heading), report_end, status)?;
        match self.link.await_confirmation(self.settings.confirmation_timeout) {
            Some(confirmed) => {
                if !confirmed.matches_report((dep_cell, dep_heading), report_end, status) {
                    conditions::report(&Condition::Desync {
                        detail: format!(
                            "reported {dep_cell}->{} but the arbiter confirmed {}->{}",
                            report_end.0,
                            confirmed.start().0,
                            confirmed.end().0,
                        ),
                    });
                }
                self.planet
                    .add_path(confirmed.start(), confirmed.end(), confirmed.weight());
                let (end_cell, end_heading) = confirmed.end();
                self.robot.position = Some((end_cell, end_heading.opposite()));
            }
            None => {
                conditions::report(&Condition::Timeout {
                    waiting_for: "path confirmation",
                });
                self.planet
                    .add_path((dep_cell, dep_heading), report_end, weight_estimate);
                self.robot.position = Some((report_end.0, report_end.1.opposite()));
            }
        }

        self.robot.came_from_obstacle = false;
        self.segment_status = PathStatus::Free;
        Ok(())
    }

    /// Standing centered on a field with a position fix: fold in unveiled
    /// paths, scan if needed, negotiate the next departure with the
    /// arbiter, and go.
    fn plan_departure(&mut self) -> Result<Option<MissionOutcome>, String> {
        let (cell, heading) = self.robot.position.ok_or("no position fix")?;

        for payload in self.link.take_unveiled() {
            self.planet
                .add_path(payload.start(), payload.end(), payload.weight());
        }

        let observed = match self.planet.observed_at(cell) {
            Some(exits) => exits.clone(),
            None => {
                let scanned: BTreeSet<Heading> = self
                    .io
                    .scan_paths()
                    .into_iter()
                    .map(|relative| heading.rotated_by(relative))
                    .collect();
                self.planet.record_observation(cell, scanned.clone());
                scanned
            }
        };

        // overrides from earlier fields do not apply to this one
        self.link.clear_path_select();

        let entered_in = Some(heading.opposite());
        let target = self.link.target();
        let tentative = self
            .policy
            .choose_heading(&self.planet, cell, entered_in, &observed, target, None)
            .ok_or_else(|| format!("no exits at all on {cell}"))?;
        self.link.send_path_select(cell, tentative)?;
        thread::sleep(self.settings.select_window);

        // the window may have brought an override or a (new) target
        let overridden = self.link.take_path_select();
        let target = self.link.target();

        if let Some(done) = self.policy.check_completion(&self.planet, cell, target) {
            let outcome = match done {
                Completion::TargetReached => {
                    self.link.send_target_reached()?;
                    MissionOutcome::TargetReached
                }
                Completion::ExplorationComplete => {
                    self.link.send_exploration_completed()?;
                    MissionOutcome::ExplorationCompleted
                }
            };
            if self.link.await_done(self.settings.done_timeout) {
                return Ok(Some(outcome));
            }
            // no acknowledgement: the claim stands, keep driving
            conditions::report(&Condition::Timeout {
                waiting_for: "done acknowledgement",
            });
        }

        let chosen = if let Some(direction) = overridden {
            log::info!("arbiter overrides the departure at {cell} to {direction}");
            direction
        } else if let Some(goal) = target {
            self.planet
                .shortest_path(cell, goal)
                .and_then(|route| route.first().map(|&(_, h)| h))
                .unwrap_or(tentative)
        } else {
            tentative
        };

        self.depart(cell, heading, chosen);
        Ok(None)
    }

    fn depart(&mut self, cell: Cell, heading: Heading, chosen: Heading) {
        log::debug!("leaving {cell} towards {chosen}");
        self.io.turn_to(chosen.relative_to(heading));
        self.robot.position = Some((cell, chosen));
        self.robot.departure = Some((cell, chosen));
        self.dead_reckoning.reset();
    }
}
