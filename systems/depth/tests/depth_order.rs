use std::collections::HashMap;

use iso_tactics_core::{Position, Projector, ScreenRect};
use iso_tactics_system_depth::{DepthBuffer, Footprint};
use proptest::prelude::*;

fn block(projector: &Projector, x: f32, y: f32, z: f32, height: f32) -> Footprint {
    let anchor = Position::new(x, y, z);
    Footprint::new(anchor, ScreenRect::of_box(projector, anchor, 0.5, height))
}

fn positions_of(order: &[usize]) -> HashMap<usize, usize> {
    order
        .iter()
        .enumerate()
        .map(|(position, &key)| (key, position))
        .collect()
}

#[test]
fn row_of_blocks_is_painted_back_to_front() {
    let projector = Projector::default();
    let footprints: Vec<_> = (0..4)
        .map(|step| block(&projector, step as f32 * 0.6, 0.0, 0.0, 1.0))
        .collect();
    let mut buffer = DepthBuffer::new();
    for key in [3, 1, 0, 2] {
        let _ = buffer.add(key);
    }

    let order = buffer
        .resolve(&|key: usize| footprints.get(key).copied())
        .to_vec();

    assert_eq!(order, vec![0, 1, 2, 3]);
}

#[test]
fn moving_an_object_reorders_it_after_marking_dirty() {
    let projector = Projector::default();
    let mut footprints = vec![
        block(&projector, 0.0, 0.0, 0.0, 1.0),
        block(&projector, 0.5, 0.0, 0.0, 1.0),
    ];
    let mut buffer = DepthBuffer::new();
    let mover = buffer.add(0usize);
    let _ = buffer.add(1usize);

    let before = buffer
        .resolve(&|key: usize| footprints.get(key).copied())
        .to_vec();
    assert_eq!(before, vec![0, 1]);

    footprints[0] = block(&projector, 1.0, 0.0, 0.0, 1.0);
    let stale = buffer
        .resolve(&|key: usize| footprints.get(key).copied())
        .to_vec();
    assert_eq!(stale, before);

    assert!(buffer.mark_dirty(mover));
    let after = buffer
        .resolve(&|key: usize| footprints.get(key).copied())
        .to_vec();
    assert_eq!(after, vec![1, 0]);
}

fn scene() -> impl Strategy<Value = Vec<(f32, f32, f32, f32)>> {
    proptest::collection::vec(
        (0.0f32..6.0, 0.0f32..6.0, 0.0f32..3.0, 0.0f32..2.0),
        1..24,
    )
}

proptest! {
    #[test]
    fn every_occlusion_edge_is_respected(objects in scene()) {
        let projector = Projector::default();
        let footprints: Vec<_> = objects
            .iter()
            .map(|&(x, y, z, height)| block(&projector, x, y, z, height))
            .collect();
        let mut buffer = DepthBuffer::new();
        for key in 0..footprints.len() {
            let _ = buffer.add(key);
        }

        let order = buffer
            .resolve(&|key: usize| footprints.get(key).copied())
            .to_vec();
        let positions = positions_of(&order);

        prop_assert_eq!(order.len(), footprints.len());
        for &(first, later) in buffer.edges() {
            prop_assert!(positions[&first] < positions[&later]);
        }
    }

    #[test]
    fn tolerant_buffers_still_order_everything_once(objects in scene(), tolerance in 0.0f32..1.0) {
        let projector = Projector::default();
        let footprints: Vec<_> = objects
            .iter()
            .map(|&(x, y, z, height)| block(&projector, x, y, z, height))
            .collect();
        let mut buffer = DepthBuffer::with_tolerance(tolerance);
        for key in 0..footprints.len() {
            let _ = buffer.add(key);
        }

        let mut order = buffer
            .resolve(&|key: usize| footprints.get(key).copied())
            .to_vec();
        order.sort_unstable();

        prop_assert_eq!(order, (0..footprints.len()).collect::<Vec<_>>());
    }
}
