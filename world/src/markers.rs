//! Stateless overlays highlighting cells, such as a reach set.

use iso_tactics_core::{
    GridCoord, MarkerId, MarkerKind, PlanarOffset, Position, Projector, ScreenRect, Spatial,
};
use iso_tactics_system_depth::DepthHandle;

/// Flat overlay lying on the surface of a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    id: MarkerId,
    kind: MarkerKind,
    cell: GridCoord,
    elevation: f32,
}

impl Marker {
    /// Identifier assigned by the world.
    #[must_use]
    pub const fn id(&self) -> MarkerId {
        self.id
    }

    /// Purpose of the overlay.
    #[must_use]
    pub const fn kind(&self) -> MarkerKind {
        self.kind
    }

    /// Highlighted cell.
    #[must_use]
    pub const fn cell(&self) -> GridCoord {
        self.cell
    }
}

impl Spatial for Marker {
    fn position(&self) -> Position {
        self.cell.center(self.elevation)
    }

    fn height_at(&self, _offset: PlanarOffset) -> f32 {
        0.0
    }

    fn screen_bounds(&self, projector: &Projector) -> ScreenRect {
        ScreenRect::of_box(projector, self.position(), 0.5, 0.0)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MarkerLayer {
    entries: Vec<(Marker, DepthHandle)>,
    next_id: u32,
}

impl MarkerLayer {
    pub(crate) fn next_id(&self) -> MarkerId {
        MarkerId::new(self.next_id)
    }

    pub(crate) fn push(
        &mut self,
        kind: MarkerKind,
        cell: GridCoord,
        elevation: f32,
        depth: DepthHandle,
    ) -> MarkerId {
        let id = self.next_id();
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((
            Marker {
                id,
                kind,
                cell,
                elevation,
            },
            depth,
        ));
        id
    }

    /// Removes every marker of `kind`, returning their depth registrations.
    pub(crate) fn clear(&mut self, kind: MarkerKind) -> Vec<DepthHandle> {
        let mut released = Vec::new();
        self.entries.retain(|(marker, depth)| {
            if marker.kind == kind {
                released.push(*depth);
                false
            } else {
                true
            }
        });
        released
    }

    pub(crate) fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.entries
            .iter()
            .map(|(marker, _)| marker)
            .find(|marker| marker.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.entries.iter().map(|(marker, _)| marker)
    }
}

#[cfg(test)]
mod tests {
    use iso_tactics_system_depth::DepthBuffer;

    use super::*;

    #[test]
    fn clearing_releases_only_the_requested_kind() {
        let mut buffer = DepthBuffer::new();
        let mut layer = MarkerLayer::default();
        let reach = layer.push(MarkerKind::Reach, GridCoord::new(0, 0), 1.0, buffer.add(0));
        let path = layer.push(MarkerKind::Path, GridCoord::new(1, 0), 1.0, buffer.add(1));

        let released = layer.clear(MarkerKind::Reach);

        assert_eq!(released.len(), 1);
        assert!(layer.get(reach).is_none());
        assert_eq!(layer.get(path).map(Marker::kind), Some(MarkerKind::Path));
    }

    #[test]
    fn markers_lie_flat_on_the_surface() {
        let marker = Marker {
            id: MarkerId::new(0),
            kind: MarkerKind::Target,
            cell: GridCoord::new(2, 3),
            elevation: 1.5,
        };

        assert_eq!(marker.position(), Position::new(2.0, 3.0, 1.5));
        assert_eq!(marker.height_at(PlanarOffset::CENTER), 0.0);
    }
}
