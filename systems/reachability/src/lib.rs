#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Budgeted breadth-first reachability over the tile grid.
//!
//! The search walks the four orthogonal neighbours of every cell, spending
//! one unit of movement budget per edge. Two independent predicates steer it:
//! `passable(from, to)` decides whether an edge may be traversed and
//! `occupiable(cell)` decides whether a visited cell may be stood on. A cell
//! that is passable but not occupiable is still expanded, so actors can move
//! through cells they are not allowed to stop on.

use std::collections::VecDeque;

use iso_tactics_core::GridCoord;

/// Largest budget honoured by a search. Larger budgets are clamped.
pub const MAX_BUDGET: u32 = 1024;

/// Reusable breadth-first search workspace.
///
/// Keeping a single instance around avoids reallocating the visited window
/// and the frontier queue for every request.
#[derive(Clone, Debug, Default)]
pub struct ReachSearch {
    visited: Vec<bool>,
    queue: VecDeque<(GridCoord, u32)>,
}

impl ReachSearch {
    /// Creates an empty search workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every occupiable cell reachable from `origin` within `budget` edges.
    ///
    /// The search is confined to the `(2 * budget + 1)²` window centred on
    /// `origin`. The origin itself is tested against `occupiable` like any
    /// other cell. Cells are marked visited when they are enqueued, so every
    /// cell is expanded at most once with the largest budget it can receive.
    pub fn search<P, O>(
        &mut self,
        origin: GridCoord,
        budget: u32,
        mut passable: P,
        mut occupiable: O,
    ) -> ReachSet
    where
        P: FnMut(GridCoord, GridCoord) -> bool,
        O: FnMut(GridCoord) -> bool,
    {
        let window = Window::new(origin, budget);
        let area = window.area();

        self.visited.clear();
        self.visited.resize(area, false);
        self.queue.clear();

        let mut set = ReachSet {
            origin,
            budget: window.radius,
            members: vec![false; area],
            cells: Vec::new(),
        };

        if let Some(index) = window.index(origin) {
            self.visited[index] = true;
            self.queue.push_back((origin, window.radius));
        }

        while let Some((cell, remaining)) = self.queue.pop_front() {
            if occupiable(cell) {
                set.insert(&window, cell);
            }

            if remaining == 0 {
                continue;
            }

            for neighbor in cell.neighbors() {
                let Some(index) = window.index(neighbor) else {
                    continue;
                };
                if self.visited[index] || !passable(cell, neighbor) {
                    continue;
                }

                self.visited[index] = true;
                self.queue.push_back((neighbor, remaining - 1));
            }
        }

        set
    }
}

/// Runs a one-off search without keeping the workspace.
pub fn reach<P, O>(origin: GridCoord, budget: u32, passable: P, occupiable: O) -> ReachSet
where
    P: FnMut(GridCoord, GridCoord) -> bool,
    O: FnMut(GridCoord) -> bool,
{
    ReachSearch::new().search(origin, budget, passable, occupiable)
}

/// Cells an actor may legally end its move on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReachSet {
    origin: GridCoord,
    budget: u32,
    members: Vec<bool>,
    cells: Vec<GridCoord>,
}

impl ReachSet {
    /// Cell the search started from.
    #[must_use]
    pub const fn origin(&self) -> GridCoord {
        self.origin
    }

    /// Budget the search ran with after clamping.
    #[must_use]
    pub const fn budget(&self) -> u32 {
        self.budget
    }

    /// Reports whether the cell is reachable.
    #[must_use]
    pub fn contains(&self, cell: GridCoord) -> bool {
        Window::new(self.origin, self.budget)
            .index(cell)
            .and_then(|index| self.members.get(index).copied())
            .unwrap_or(false)
    }

    /// Reachable cells in the order the search discovered them.
    pub fn iter(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.cells.iter().copied()
    }

    /// Number of reachable cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell is reachable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn insert(&mut self, window: &Window, cell: GridCoord) {
        if let Some(index) = window.index(cell) {
            if !self.members[index] {
                self.members[index] = true;
                self.cells.push(cell);
            }
        }
    }
}

impl<'a> IntoIterator for &'a ReachSet {
    type Item = GridCoord;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, GridCoord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter().copied()
    }
}

/// Square search window centred on the origin.
#[derive(Clone, Copy, Debug)]
struct Window {
    origin: GridCoord,
    radius: u32,
}

impl Window {
    fn new(origin: GridCoord, budget: u32) -> Self {
        Self {
            origin,
            radius: budget.min(MAX_BUDGET),
        }
    }

    fn side(&self) -> usize {
        self.radius as usize * 2 + 1
    }

    fn area(&self) -> usize {
        self.side() * self.side()
    }

    fn index(&self, cell: GridCoord) -> Option<usize> {
        let radius = i64::from(self.radius);
        let column = i64::from(cell.x()) - i64::from(self.origin.x()) + radius;
        let row = i64::from(cell.y()) - i64::from(self.origin.y()) + radius;
        let side = i64::try_from(self.side()).ok()?;

        if !(0..side).contains(&column) || !(0..side).contains(&row) {
            return None;
        }

        usize::try_from(row * side + column).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_indexes_corners() {
        let window = Window::new(GridCoord::new(10, -3), 2);

        assert_eq!(window.area(), 25);
        assert_eq!(window.index(GridCoord::new(8, -5)), Some(0));
        assert_eq!(window.index(GridCoord::new(12, -1)), Some(24));
        assert_eq!(window.index(GridCoord::new(10, -3)), Some(12));
        assert_eq!(window.index(GridCoord::new(13, -3)), None);
        assert_eq!(window.index(GridCoord::new(10, 0)), None);
    }

    #[test]
    fn zero_budget_visits_only_origin() {
        let origin = GridCoord::new(4, 4);
        let set = reach(origin, 0, |_, _| true, |_| true);

        assert_eq!(set.len(), 1);
        assert!(set.contains(origin));
        assert!(!set.contains(GridCoord::new(4, 5)));
    }

    #[test]
    fn unoccupiable_origin_is_excluded() {
        let origin = GridCoord::new(0, 0);
        let set = reach(origin, 1, |_, _| true, |cell| cell != origin);

        assert_eq!(set.len(), 4);
        assert!(!set.contains(origin));
    }

    #[test]
    fn workspace_is_reused_between_searches() {
        let mut search = ReachSearch::new();

        let wide = search.search(GridCoord::new(0, 0), 3, |_, _| true, |_| true);
        let narrow = search.search(GridCoord::new(0, 0), 1, |_, _| true, |_| true);

        assert_eq!(wide.len(), 25);
        assert_eq!(narrow.len(), 5);
    }

    #[test]
    fn oversized_budget_is_clamped() {
        let set = reach(GridCoord::new(0, 0), u32::MAX, |_, _| false, |_| true);

        assert_eq!(set.budget(), MAX_BUDGET);
        assert_eq!(set.len(), 1);
    }
}
