use std::collections::BTreeSet;

use iso_tactics_core::GridCoord;
use iso_tactics_system_reachability::{reach, ReachSearch};
use proptest::prelude::*;

fn inside_grid(size: i32) -> impl Fn(GridCoord) -> bool {
    move |cell| (0..size).contains(&cell.x()) && (0..size).contains(&cell.y())
}

#[test]
fn open_grid_produces_manhattan_diamond() {
    let origin = GridCoord::new(2, 2);
    let in_bounds = inside_grid(5);

    let set = reach(origin, 2, |_, to| in_bounds(to), |_| true);

    assert_eq!(set.len(), 13);
    for x in 0..5 {
        for y in 0..5 {
            let cell = GridCoord::new(x, y);
            assert_eq!(
                set.contains(cell),
                cell.manhattan_distance(origin) <= 2,
                "unexpected membership for {cell:?}"
            );
        }
    }
    assert_eq!(set.iter().next(), Some(origin));
}

#[test]
fn corner_origin_is_clipped_by_the_grid() {
    let in_bounds = inside_grid(5);

    let set = reach(GridCoord::new(0, 0), 2, |_, to| in_bounds(to), |_| true);

    assert_eq!(set.len(), 6);
}

#[test]
fn walls_force_detours() {
    let walls: BTreeSet<GridCoord> = [GridCoord::new(1, 0), GridCoord::new(1, 1)]
        .into_iter()
        .collect();
    let in_bounds = inside_grid(5);

    let set = reach(
        GridCoord::new(0, 0),
        4,
        |_, to| in_bounds(to) && !walls.contains(&to),
        |_| true,
    );

    assert!(!set.contains(GridCoord::new(1, 0)));
    assert!(set.contains(GridCoord::new(1, 2)));
    assert!(!set.contains(GridCoord::new(2, 0)));
    assert!(set.contains(GridCoord::new(2, 2)));
}

#[test]
fn occupied_cells_can_be_crossed_but_not_claimed() {
    let ally = GridCoord::new(1, 0);
    let corridor = |_: GridCoord, to: GridCoord| to.y() == 0 && (0..4).contains(&to.x());

    let set = reach(GridCoord::new(0, 0), 3, corridor, |cell| cell != ally);

    let cells: Vec<_> = set.iter().collect();
    assert_eq!(
        cells,
        vec![
            GridCoord::new(0, 0),
            GridCoord::new(2, 0),
            GridCoord::new(3, 0)
        ]
    );
}

#[test]
fn passability_is_evaluated_per_edge() {
    let ledge = |from: GridCoord, to: GridCoord| !(from.x() == 0 && to.x() == 1);

    let set = reach(GridCoord::new(0, 0), 3, ledge, |_| true);

    assert!(!set.contains(GridCoord::new(1, 0)));
    assert!(set.contains(GridCoord::new(-1, 0)));
    assert!(set.contains(GridCoord::new(0, 3)));
}

fn walls_strategy() -> impl Strategy<Value = BTreeSet<(i32, i32)>> {
    proptest::collection::btree_set((-4i32..=4, -4i32..=4), 0..24)
}

proptest! {
    #[test]
    fn symmetric_passability_yields_symmetric_reach(
        walls in walls_strategy(),
        origin in (-4i32..=4, -4i32..=4),
        target in (-4i32..=4, -4i32..=4),
        budget in 0u32..6,
    ) {
        let blocked = |cell: GridCoord| walls.contains(&(cell.x(), cell.y()));
        let passable = |from: GridCoord, to: GridCoord| !blocked(from) && !blocked(to);
        let origin = GridCoord::new(origin.0, origin.1);
        let target = GridCoord::new(target.0, target.1);
        let mut search = ReachSearch::new();

        let forward = search.search(origin, budget, passable, |_| true).contains(target);
        let backward = search.search(target, budget, passable, |_| true).contains(origin);

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn reach_never_exceeds_budget(
        walls in walls_strategy(),
        origin in (-4i32..=4, -4i32..=4),
        budget in 0u32..8,
    ) {
        let origin = GridCoord::new(origin.0, origin.1);
        let set = reach(
            origin,
            budget,
            |_, to| !walls.contains(&(to.x(), to.y())),
            |_| true,
        );

        for cell in &set {
            prop_assert!(cell.manhattan_distance(origin) <= budget);
        }
        prop_assert!(set.len() <= (2 * budget as usize + 1).pow(2));
    }
}
