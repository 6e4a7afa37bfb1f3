use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use crate::utils::grid::{Cell, Heading};

/// Sentinel weight of an impassable path. A blocked edge is kept in the
/// map (it carries knowledge) but routing never crosses it.
pub const BLOCKED: i64 = -1;

/// Far end of a directed path entry: the cell reached, the heading under
/// which it is entered there, and the path's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEnd {
    pub cell: Cell,
    pub heading: Heading,
    pub weight: i64,
}

/// The accumulating map of the maze: a bidirectional weighted graph over
/// fields, keyed by the heading a path leaves a field under. Ordered maps
/// keep iteration, and with it routing, deterministic.
#[derive(Debug, Clone, Default)]
pub struct Planet {
    paths: BTreeMap<Cell, BTreeMap<Heading, PathEnd>>,
    observed: FxHashMap<Cell, BTreeSet<Heading>>,
}

impl Planet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a path between two (cell, heading) endpoints, in both
    /// directions. Re-adding an existing path overwrites its weight.
    /// Self-loops (same cell both ends) are legal and used for blocked
    /// exits.
    pub fn add_path(&mut self, start: (Cell, Heading), end: (Cell, Heading), weight: i64) {
        for ((from, out), (to, in_)) in [(start, end), (end, start)] {
            self.paths.entry(from).or_default().insert(
                out,
                PathEnd {
                    cell: to,
                    heading: in_,
                    weight,
                },
            );
        }
    }

    /// Records the full set of exits scanned at a field. Scanning is
    /// idempotent; a rescan replaces the previous observation.
    pub fn record_observation(&mut self, cell: Cell, exits: BTreeSet<Heading>) {
        self.observed.insert(cell, exits);
    }

    /// Exits scanned at a field, if it was ever scanned.
    pub fn observed_at(&self, cell: Cell) -> Option<&BTreeSet<Heading>> {
        self.observed.get(&cell)
    }

    /// Headings at `cell` with a recorded path, blocked ones included.
    pub fn known_headings(&self, cell: Cell) -> BTreeSet<Heading> {
        self.paths
            .get(&cell)
            .map(|ends| ends.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Headings at `cell` whose recorded path is blocked.
    pub fn blocked_headings(&self, cell: Cell) -> BTreeSet<Heading> {
        self.paths
            .get(&cell)
            .map(|ends| {
                ends.iter()
                    .filter(|(_, end)| end.weight == BLOCKED)
                    .map(|(h, _)| *h)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_cell(&self, cell: Cell) -> bool {
        self.paths.contains_key(&cell)
    }

    /// The recorded path entry leaving `cell` under `heading`.
    pub fn path_from(&self, cell: Cell, heading: Heading) -> Option<&PathEnd> {
        self.paths.get(&cell).and_then(|ends| ends.get(&heading))
    }

    /// Dijkstra over the known graph, skipping blocked edges. Returns the
    /// hops as (cell departed, heading taken); `Some(vec![])` when start
    /// and goal coincide, `None` when either cell is unknown or no
    /// unblocked route exists. Ties break on the smaller cell, so the
    /// route is stable across calls.
    pub fn shortest_path(&self, start: Cell, goal: Cell) -> Option<Vec<(Cell, Heading)>> {
        if !self.has_cell(start) || !self.has_cell(goal) {
            return None;
        }
        if start == goal {
            return Some(Vec::new());
        }

        // cell -> (distance, predecessor cell, heading taken there)
        let mut best: BTreeMap<Cell, (i64, Cell, Heading)> = BTreeMap::new();
        best.insert(start, (0, start, Heading::North));
        let mut unvisited: BTreeSet<Cell> = [start].into();
        let mut visited: BTreeSet<Cell> = BTreeSet::new();

        while let Some(current) = unvisited
            .iter()
            .map(|&cell| (best[&cell].0, cell))
            .min()
            .map(|(_, cell)| cell)
        {
            unvisited.remove(&current);
            if current == goal {
                break;
            }
            visited.insert(current);
            let dist = best[&current].0;

            if let Some(ends) = self.paths.get(&current) {
                for (&heading, end) in ends {
                    if end.weight == BLOCKED || visited.contains(&end.cell) {
                        continue;
                    }
                    let candidate = dist + end.weight;
                    let improves = best
                        .get(&end.cell)
                        .is_none_or(|(known, _, _)| candidate < *known);
                    if improves {
                        best.insert(end.cell, (candidate, current, heading));
                        unvisited.insert(end.cell);
                    }
                }
            }
        }

        if !best.contains_key(&goal) {
            return None;
        }
        let mut hops = Vec::new();
        let mut cursor = goal;
        while cursor != start {
            let (_, previous, heading) = best[&cursor];
            hops.push((previous, heading));
            cursor = previous;
        }
        hops.reverse();
        Some(hops)
    }

    /// Exploration is complete once more than one field was scanned and
    /// every scanned exit has a recorded path. A lone scanned field is
    /// never "complete": its exits still lead somewhere unknown.
    pub fn is_fully_explored(&self) -> bool {
        if self.observed.len() <= 1 {
            return false;
        }
        self.observed.iter().all(|(cell, exits)| {
            let known = self.known_headings(*cell);
            exits.is_subset(&known)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: i32, y: i32) -> Cell {
        Cell::new(x, y)
    }

    fn exits(headings: &[Heading]) -> BTreeSet<Heading> {
        headings.iter().copied().collect()
    }

    mod graph {
        use super::*;

        #[test]
        fn test_add_path_is_bidirectional() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 3);

            let forward = planet.path_from(cell(0, 0), Heading::North).unwrap();
            assert_eq!(forward.cell, cell(0, 1));
            assert_eq!(forward.heading, Heading::South);
            assert_eq!(forward.weight, 3);

            let back = planet.path_from(cell(0, 1), Heading::South).unwrap();
            assert_eq!(back.cell, cell(0, 0));
            assert_eq!(back.heading, Heading::North);
            assert_eq!(back.weight, 3);
        }

        #[test]
        fn test_re_adding_overwrites_instead_of_duplicating() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::East), (cell(1, 0), Heading::West), 5);
            planet.add_path((cell(0, 0), Heading::East), (cell(1, 0), Heading::West), 2);

            assert_eq!(planet.known_headings(cell(0, 0)).len(), 1);
            assert_eq!(planet.path_from(cell(0, 0), Heading::East).unwrap().weight, 2);
        }

        #[test]
        fn test_blocked_self_loop_is_recorded_once_per_heading() {
            let mut planet = Planet::new();
            planet.add_path(
                (cell(2, 2), Heading::North),
                (cell(2, 2), Heading::North),
                BLOCKED,
            );
            assert_eq!(planet.blocked_headings(cell(2, 2)), exits(&[Heading::North]));
            assert_eq!(planet.known_headings(cell(2, 2)).len(), 1);
        }
    }

    mod routing {
        use super::*;

        #[test]
        fn test_shortest_path_chains_headings() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 1);
            planet.add_path((cell(0, 1), Heading::East), (cell(1, 1), Heading::West), 2);

            let route = planet.shortest_path(cell(0, 0), cell(1, 1)).unwrap();
            assert_eq!(
                route,
                vec![(cell(0, 0), Heading::North), (cell(0, 1), Heading::East)]
            );
        }

        #[test]
        fn test_routing_never_crosses_a_blocked_edge() {
            let mut planet = Planet::new();
            // direct edge is blocked, detour costs more but exists
            planet.add_path(
                (cell(0, 0), Heading::North),
                (cell(0, 1), Heading::South),
                BLOCKED,
            );
            planet.add_path((cell(0, 0), Heading::East), (cell(1, 0), Heading::West), 1);
            planet.add_path((cell(1, 0), Heading::North), (cell(1, 1), Heading::South), 1);
            planet.add_path((cell(1, 1), Heading::West), (cell(0, 1), Heading::East), 1);

            let route = planet.shortest_path(cell(0, 0), cell(0, 1)).unwrap();
            assert_eq!(route.len(), 3);
            assert_eq!(route[0], (cell(0, 0), Heading::East));
        }

        #[test]
        fn test_blocked_self_loop_is_never_taken() {
            let mut planet = Planet::new();
            planet.add_path(
                (cell(2, 2), Heading::North),
                (cell(2, 2), Heading::North),
                BLOCKED,
            );
            planet.add_path((cell(2, 2), Heading::East), (cell(3, 2), Heading::West), 4);

            let route = planet.shortest_path(cell(2, 2), cell(3, 2)).unwrap();
            assert_eq!(route, vec![(cell(2, 2), Heading::East)]);
            assert!(route.iter().all(|&(c, h)| (c, h) != (cell(2, 2), Heading::North)));
        }

        #[test]
        fn test_cheaper_route_wins_over_fewer_hops() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 10);
            planet.add_path((cell(0, 0), Heading::East), (cell(1, 0), Heading::West), 2);
            planet.add_path((cell(1, 0), Heading::North), (cell(1, 1), Heading::South), 2);
            planet.add_path((cell(1, 1), Heading::West), (cell(0, 1), Heading::East), 2);

            let route = planet.shortest_path(cell(0, 0), cell(0, 1)).unwrap();
            assert_eq!(route.len(), 3);
        }

        #[test]
        fn test_same_cell_routes_to_an_empty_hop_list() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 1);
            assert_eq!(planet.shortest_path(cell(0, 0), cell(0, 0)), Some(vec![]));
        }

        #[test]
        fn test_unknown_or_unreachable_cells_have_no_route() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 1);
            // never recorded
            assert_eq!(planet.shortest_path(cell(0, 0), cell(5, 5)), None);

            // recorded but cut off behind a blocked edge
            planet.add_path(
                (cell(3, 3), Heading::North),
                (cell(3, 4), Heading::South),
                BLOCKED,
            );
            assert_eq!(planet.shortest_path(cell(0, 0), cell(3, 4)), None);
        }

        #[test]
        fn test_equal_cost_tie_breaks_deterministically() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 1);
            planet.add_path((cell(0, 0), Heading::East), (cell(1, 0), Heading::West), 1);
            planet.add_path((cell(0, 1), Heading::East), (cell(1, 1), Heading::West), 1);
            planet.add_path((cell(1, 0), Heading::North), (cell(1, 1), Heading::South), 1);

            let first = planet.shortest_path(cell(0, 0), cell(1, 1)).unwrap();
            for _ in 0..5 {
                assert_eq!(planet.shortest_path(cell(0, 0), cell(1, 1)).unwrap(), first);
            }
        }
    }

    mod completion {
        use super::*;

        #[test]
        fn test_single_scanned_field_is_never_complete() {
            let mut planet = Planet::new();
            planet.record_observation(cell(0, 0), exits(&[Heading::North]));
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 1);
            assert!(!planet.is_fully_explored());
        }

        #[test]
        fn test_complete_once_every_scanned_exit_is_mapped() {
            let mut planet = Planet::new();
            planet.add_path((cell(0, 0), Heading::North), (cell(0, 1), Heading::South), 1);
            planet.record_observation(cell(0, 0), exits(&[Heading::North]));
            planet.record_observation(cell(0, 1), exits(&[Heading::South, Heading::East]));
            assert!(!planet.is_fully_explored());

            planet.add_path(
                (cell(0, 1), Heading::East),
                (cell(0, 1), Heading::East),
                BLOCKED,
            );
            assert!(planet.is_fully_explored());
        }
    }
}
