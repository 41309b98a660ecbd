#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Painter's-order resolution for isometric scenes.
//!
//! Objects are registered with a [`DepthBuffer`] under a caller-chosen key.
//! Whenever the buffer is dirty, [`DepthBuffer::resolve`] looks every key up
//! through a [`SpatialIndex`], builds an occlusion graph from the pairs whose
//! screen rectangles overlap and sorts it topologically. The rule for a pair
//! is the painter's depth `x + y - z`: the larger value is nearer the camera
//! and is painted later. Depths within the buffer's tolerance count as a tie
//! and are broken by tier, then by registration order.
//!
//! Objects that share a stack (a grid cell with tiles piled on it and
//! whatever rests on top) skip the depth rule altogether: they are painted
//! bottom-up in tier order.
//!
//! A tolerance above zero makes the rule intransitive, so cycles can appear.
//! Cycles are collapsed into strongly connected components whose members are
//! painted in plain depth order.

mod graph;

use iso_tactics_core::{GridCoord, Position, ScreenRect};

use crate::graph::OcclusionGraph;

/// Opaque registration handle returned by [`DepthBuffer::add`].
///
/// Handles carry a generation so that a handle kept past its removal can
/// never address an unrelated object that later reuses the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthHandle {
    index: u32,
    generation: u32,
}

/// Geometry a [`DepthBuffer`] needs to place an object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    /// Logical anchor whose painter's depth orders the object.
    pub anchor: Position,
    /// Screen rectangle covered by the object.
    pub bounds: ScreenRect,
    /// Cell whose stack the object belongs to, if any.
    pub stack: Option<GridCoord>,
    /// Paint rank within a stack and among tied depths. Lower tiers are
    /// painted first.
    pub tier: u32,
}

impl Footprint {
    /// Footprint outside any stack, on the lowest tier.
    #[must_use]
    pub const fn new(anchor: Position, bounds: ScreenRect) -> Self {
        Self {
            anchor,
            bounds,
            stack: None,
            tier: 0,
        }
    }

    /// Places the footprint on `tier` of the stack at `cell`.
    #[must_use]
    pub const fn stacked(self, cell: GridCoord, tier: u32) -> Self {
        Self {
            stack: Some(cell),
            tier,
            ..self
        }
    }
}

/// Source of footprints for registered keys.
pub trait SpatialIndex<K> {
    /// Footprint of the object registered under `key`.
    ///
    /// Returning `None` leaves the object out of the resolved order.
    fn footprint(&self, key: K) -> Option<Footprint>;
}

impl<K, F> SpatialIndex<K> for F
where
    F: Fn(K) -> Option<Footprint>,
{
    fn footprint(&self, key: K) -> Option<Footprint> {
        self(key)
    }
}

#[derive(Clone, Debug)]
struct Slot<K> {
    generation: u32,
    entry: Option<Entry<K>>,
}

#[derive(Clone, Copy, Debug)]
struct Entry<K> {
    key: K,
    seq: u64,
}

#[derive(Clone, Copy, Debug)]
struct Node<K> {
    key: K,
    seq: u64,
    depth: f32,
    bounds: ScreenRect,
    stack: Option<GridCoord>,
    tier: u32,
}

/// Registry of drawable objects and their cached paint order.
#[derive(Clone, Debug)]
pub struct DepthBuffer<K> {
    slots: Vec<Slot<K>>,
    free: Vec<u32>,
    live: usize,
    next_seq: u64,
    tolerance: f32,
    dirty: bool,
    order: Vec<K>,
    edges: Vec<(K, K)>,
}

impl<K: Copy> DepthBuffer<K> {
    /// Creates an empty buffer that only treats identical depths as ties.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tolerance(0.0)
    }

    /// Creates an empty buffer treating depths closer than `tolerance` as ties.
    ///
    /// Negative or non-finite tolerances are treated as zero.
    #[must_use]
    pub fn with_tolerance(tolerance: f32) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            0.0
        };
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            next_seq: 0,
            tolerance,
            dirty: false,
            order: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Depth difference below which two objects are considered level.
    #[must_use]
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Registers a key and returns the handle that addresses it.
    pub fn add(&mut self, key: K) -> DepthHandle {
        let entry = Entry {
            key,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.live += 1;
        self.dirty = true;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return DepthHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        DepthHandle {
            index,
            generation: 0,
        }
    }

    /// Deregisters the object addressed by `handle`, returning its key.
    ///
    /// Stale handles are ignored.
    pub fn remove(&mut self, handle: DepthHandle) -> Option<K> {
        let Some(slot) = self.live_slot_mut(handle) else {
            tracing::debug!(index = handle.index, "ignoring removal through stale depth handle");
            return None;
        };

        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        self.dirty = true;
        Some(entry.key)
    }

    /// Key registered under `handle`, if the handle is still live.
    #[must_use]
    pub fn get(&self, handle: DepthHandle) -> Option<K> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.map(|entry| entry.key)
    }

    /// Reports whether `handle` still addresses a registered object.
    #[must_use]
    pub fn contains(&self, handle: DepthHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Flags the object addressed by `handle` as moved.
    ///
    /// Returns `false` for stale handles.
    pub fn mark_dirty(&mut self, handle: DepthHandle) -> bool {
        if self.contains(handle) {
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Forces the next resolution to rebuild the order, for example after the
    /// projection changed.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Reports whether the cached order is out of date.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of registered objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Reports whether no object is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Paint order computed by the most recent resolution.
    #[must_use]
    pub fn order(&self) -> &[K] {
        &self.order
    }

    /// Occlusion edges found by the most recent resolution, as
    /// `(painted first, painted later)` pairs.
    #[must_use]
    pub fn edges(&self) -> &[(K, K)] {
        &self.edges
    }

    /// Returns the paint order, rebuilding it first if anything changed.
    pub fn resolve<I>(&mut self, index: &I) -> &[K]
    where
        I: SpatialIndex<K> + ?Sized,
    {
        if self.dirty {
            self.rebuild(index);
            self.dirty = false;
        }
        &self.order
    }

    fn rebuild<I>(&mut self, index: &I)
    where
        I: SpatialIndex<K> + ?Sized,
    {
        let mut nodes = Vec::with_capacity(self.live);
        for entry in self.slots.iter().filter_map(|slot| slot.entry) {
            match index.footprint(entry.key) {
                Some(footprint) => nodes.push(Node {
                    key: entry.key,
                    seq: entry.seq,
                    depth: footprint.anchor.depth(),
                    bounds: footprint.bounds,
                    stack: footprint.stack,
                    tier: footprint.tier,
                }),
                None => {
                    tracing::debug!(seq = entry.seq, "skipping drawable without a footprint");
                }
            }
        }

        nodes.sort_by(|a, b| {
            a.depth
                .total_cmp(&b.depth)
                .then(a.tier.cmp(&b.tier))
                .then(a.seq.cmp(&b.seq))
        });

        let mut graph = OcclusionGraph::with_nodes(nodes.len());
        self.edges.clear();

        let mut sweep: Vec<usize> = (0..nodes.len()).collect();
        sweep.sort_by(|&a, &b| {
            nodes[a]
                .bounds
                .min()
                .x
                .total_cmp(&nodes[b].bounds.min().x)
                .then(a.cmp(&b))
        });

        for (position, &a) in sweep.iter().enumerate() {
            let right = nodes[a].bounds.max().x;
            for &b in &sweep[position + 1..] {
                if nodes[b].bounds.min().x >= right {
                    break;
                }
                if !nodes[a].bounds.intersects(&nodes[b].bounds) {
                    continue;
                }

                let (first, later) = if self.precedes(&nodes[a], &nodes[b]) {
                    (a, b)
                } else {
                    (b, a)
                };
                graph.add_edge(first, later);
                self.edges.push((nodes[first].key, nodes[later].key));
            }
        }

        let edge_count = graph.edge_count();
        let mut cycles = 0;
        self.order.clear();
        for mut component in graph.ordered_components() {
            if component.len() > 1 {
                cycles += 1;
                tracing::warn!(
                    members = component.len(),
                    "occlusion cycle broken by painter's depth"
                );
                component.sort_unstable();
            }
            self.order
                .extend(component.into_iter().map(|node| nodes[node].key));
        }

        tracing::trace!(
            nodes = nodes.len(),
            edges = edge_count,
            cycles,
            "resolved draw order"
        );
    }

    /// Reports whether `a` must be painted before `b`.
    fn precedes(&self, a: &Node<K>, b: &Node<K>) -> bool {
        let ranked = (a.tier, a.seq) < (b.tier, b.seq);
        if a.stack.is_some() && a.stack == b.stack {
            return ranked;
        }
        let difference = b.depth - a.depth;
        if difference.is_nan() || difference.abs() <= self.tolerance {
            ranked
        } else {
            difference > 0.0
        }
    }

    fn live_slot_mut(&mut self, handle: DepthHandle) -> Option<&mut Slot<K>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        (slot.generation == handle.generation && slot.entry.is_some()).then_some(slot)
    }
}

impl<K: Copy> Default for DepthBuffer<K> {
    fn default() -> Self {
        Self::new()
    }
}
