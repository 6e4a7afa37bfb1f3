use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::components::planet::Planet;
use crate::utils::conditions::{self, Condition};
use crate::utils::grid::{Cell, Heading};

/// Why the mission can stop successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    TargetReached,
    ExplorationComplete,
}

/// Decides where to go next from a field. Frontier-first when roaming,
/// shortest-path when a target is set, and an arbiter override beats both.
pub struct ExplorationPolicy {
    rng: StdRng,
}

impl ExplorationPolicy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Fixed seed for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Picks the departure heading from `cell`.
    ///
    /// Precedence: an arbiter override wins outright; with a target set the
    /// first hop of the cheapest known route is taken; otherwise a random
    /// unexplored exit; otherwise a random known exit, preferring not to
    /// drive into blocked paths or straight back where we came from.
    /// `None` only when the field has no exits at all.
    pub fn choose_heading(
        &mut self,
        planet: &Planet,
        cell: Cell,
        entered_in: Option<Heading>,
        observed: &BTreeSet<Heading>,
        target: Option<Cell>,
        pending_override: Option<Heading>,
    ) -> Option<Heading> {
        if let Some(direction) = pending_override {
            return Some(direction);
        }

        if let Some(target) = target {
            match planet.shortest_path(cell, target) {
                Some(route) => {
                    if let Some(&(_, heading)) = route.first() {
                        return Some(heading);
                    }
                    // empty route means we are standing on the target;
                    // fall through and keep exploring
                }
                None => {
                    conditions::report(&Condition::Unreachable { from: cell, target });
                }
            }
        }

        let known = planet.known_headings(cell);
        let frontier: Vec<Heading> = observed.difference(&known).copied().collect();
        if let Some(&heading) = frontier.choose(&mut self.rng) {
            return Some(heading);
        }

        let blocked = planet.blocked_headings(cell);
        let mut candidates: Vec<Heading> =
            observed.iter().copied().filter(|h| !blocked.contains(h)).collect();
        if let Some(back) = entered_in {
            if candidates.len() > 1 {
                candidates.retain(|&h| h != back);
            }
        }
        if candidates.is_empty() {
            candidates = observed.iter().copied().collect();
        }
        candidates.choose(&mut self.rng).copied()
    }

    /// Checks whether the mission is over at `cell`: standing on the
    /// target, or the whole reachable maze is mapped with no target set.
    pub fn check_completion(
        &self,
        planet: &Planet,
        cell: Cell,
        target: Option<Cell>,
    ) -> Option<Completion> {
        match target {
            Some(target) => {
                matches!(planet.shortest_path(cell, target), Some(route) if route.is_empty())
                    .then_some(Completion::TargetReached)
            }
            None => planet
                .is_fully_explored()
                .then_some(Completion::ExplorationComplete),
        }
    }
}

impl Default for ExplorationPolicy {
    fn default() -> Self {
        Self::new()
    }
}
