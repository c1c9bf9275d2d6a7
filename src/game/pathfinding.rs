//! Grid A* pathfinding for flying enemies.
//!
//! Coordinates are grid cells. The caller's filter decides which cells are
//! walkable (inside the room, not a block). The search is bounded by
//! `max_iterations`; when the bound is hit the path to the closest cell
//! found so far is returned instead, so a blocked bat still drifts toward
//! the player.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

pub type Cell = (i32, i32);

const STRAIGHT_COST: i32 = 10;
const DIAGONAL_COST: i32 = 14;

pub fn manhattan(a: Cell, b: Cell) -> i32 {
    ((a.0 - b.0).abs() + (a.1 - b.1).abs()) * STRAIGHT_COST
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResult {
    /// Start cell first. `None` when no cell beyond the start was reachable.
    pub path: Option<Vec<Cell>>,
    pub target_reached: bool,
}

pub struct Pathfinder<'a> {
    start: Cell,
    target: Cell,
    allow_diagonal: bool,
    max_iterations: usize,
    filter: &'a dyn Fn(Cell) -> bool,
}

impl<'a> Pathfinder<'a> {
    pub fn new(start: Cell, target: Cell, filter: &'a dyn Fn(Cell) -> bool) -> Self {
        Self {
            start,
            target,
            allow_diagonal: true,
            max_iterations: 100,
            filter,
        }
    }

    pub fn allow_diagonal(mut self, allow: bool) -> Self {
        self.allow_diagonal = allow;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    fn neighbors(&self, cell: Cell) -> Vec<(Cell, i32)> {
        let mut out = Vec::with_capacity(8);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal && !self.allow_diagonal {
                    continue;
                }
                let next = (cell.0 + dx, cell.1 + dy);
                if (self.filter)(next) {
                    out.push((next, if diagonal { DIAGONAL_COST } else { STRAIGHT_COST }));
                }
            }
        }
        out
    }

    pub fn find(&self) -> PathResult {
        if self.start == self.target {
            return PathResult { path: Some(vec![self.start]), target_reached: true };
        }

        let mut open = BinaryHeap::new();
        let mut came_from: HashMap<Cell, Cell> = HashMap::new();
        let mut g_score: HashMap<Cell, i32> = HashMap::new();
        let mut closed: HashSet<Cell> = HashSet::new();
        let mut counter = 0u32;

        g_score.insert(self.start, 0);
        open.push(Reverse((manhattan(self.start, self.target), counter, self.start)));

        let mut best = self.start;
        let mut best_h = manhattan(self.start, self.target);
        let mut iterations = 0;

        while let Some(Reverse((_, _, current))) = open.pop() {
            if current == self.target {
                return PathResult {
                    path: Some(reconstruct(&came_from, current)),
                    target_reached: true,
                };
            }
            if !closed.insert(current) {
                continue;
            }

            iterations += 1;
            if iterations > self.max_iterations {
                break;
            }

            let current_g = g_score.get(&current).copied().unwrap_or(i32::MAX);
            for (next, cost) in self.neighbors(current) {
                if closed.contains(&next) {
                    continue;
                }
                let tentative = current_g + cost;
                if tentative < g_score.get(&next).copied().unwrap_or(i32::MAX) {
                    came_from.insert(next, current);
                    g_score.insert(next, tentative);
                    let h = manhattan(next, self.target);
                    if h < best_h {
                        best_h = h;
                        best = next;
                    }
                    counter += 1;
                    open.push(Reverse((tentative + h, counter, next)));
                }
            }

            // Open set exhausted means the target is walled off
            if open.is_empty() {
                return PathResult { path: None, target_reached: false };
            }
        }

        if best == self.start {
            return PathResult { path: None, target_reached: false };
        }
        PathResult {
            path: Some(reconstruct(&came_from, best)),
            target_reached: false,
        }
    }
}

fn reconstruct(came_from: &HashMap<Cell, Cell>, end: Cell) -> Vec<Cell> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Rows top to bottom; `!` blocks a cell.
    fn grid(rows: &[&str]) -> impl Fn(Cell) -> bool {
        let height = rows.len() as i32;
        let width = rows[0].len() as i32;
        let blocked: HashSet<Cell> = rows
            .iter()
            .enumerate()
            .flat_map(|(row, line)| {
                line.chars()
                    .enumerate()
                    .filter(|(_, c)| *c == '!')
                    .map(move |(x, _)| (x as i32, row as i32))
            })
            .collect();
        move |(x, y)| x >= 0 && y >= 0 && x < width && y < height && !blocked.contains(&(x, y))
    }

    fn is_connected(path: &[Cell], diagonal: bool) {
        for pair in path.windows(2) {
            let dx = (pair[0].0 - pair[1].0).abs();
            let dy = (pair[0].1 - pair[1].1).abs();
            assert!(dx <= 1 && dy <= 1 && dx + dy > 0);
            if !diagonal {
                assert_eq!(dx + dy, 1);
            }
        }
    }

    #[test]
    fn test_open_grid_diagonal() {
        let filter = grid(&["....", "....", "....", "...."]);
        let result = Pathfinder::new((0, 0), (3, 3), &filter).find();
        let path = result.path.unwrap();
        assert!(result.target_reached);
        assert_eq!(path, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_walls_without_diagonals() {
        let filter = grid(&["..!.", "!.!.", "..!.", "...."]);
        let result = Pathfinder::new((0, 0), (3, 0), &filter).allow_diagonal(false).find();
        let path = result.path.unwrap();
        assert_eq!(path.first(), Some(&(0, 0)));
        assert_eq!(path.last(), Some(&(3, 0)));
        assert_eq!(path.len(), 10);
        is_connected(&path, false);
        assert!(path.iter().all(|&c| filter(c)));
    }

    #[test]
    fn test_blocked_target() {
        let filter = grid(&["..!.", "!.!.", "..!.", "..!."]);
        let result = Pathfinder::new((0, 0), (3, 0), &filter).find();
        assert_eq!(result.path, None);
        assert!(!result.target_reached);
    }

    #[test]
    fn test_start_is_target() {
        let filter = grid(&["..", ".."]);
        let result = Pathfinder::new((1, 1), (1, 1), &filter).find();
        assert_eq!(result.path, Some(vec![(1, 1)]));
        assert!(result.target_reached);
    }

    #[test]
    fn test_iteration_cap_returns_closest_partial_path() {
        let filter = |_: Cell| true;
        let result = Pathfinder::new((0, 0), (50, 0), &filter).max_iterations(5).find();
        assert!(!result.target_reached);
        let path = result.path.unwrap();
        assert_eq!(path[0], (0, 0));
        assert!(path.last().unwrap().0 > 0);
        is_connected(&path, true);
    }
}
