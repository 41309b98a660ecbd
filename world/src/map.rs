//! Layered tile stacks forming the playable height field.

use std::collections::HashMap;

use iso_tactics_core::{
    ActorId, EditError, GridCoord, Ground, PlanarOffset, Position, Projector, ScreenRect,
    Spatial, TileId, TileShape, TileSpec,
};

/// Single layer of a tile stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    id: TileId,
    cell: GridCoord,
    layer: usize,
    height: f32,
    shape: TileShape,
    elevation: f32,
    occupant: Option<ActorId>,
}

impl Tile {
    /// Identifier assigned by the map.
    #[must_use]
    pub const fn id(&self) -> TileId {
        self.id
    }

    /// Cell containing the tile.
    #[must_use]
    pub const fn cell(&self) -> GridCoord {
        self.cell
    }

    /// Zero-based layer index within the stack, counted from the bottom.
    #[must_use]
    pub const fn layer(&self) -> usize {
        self.layer
    }

    /// Thickness of the tile.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Shape of the upper surface.
    #[must_use]
    pub const fn shape(&self) -> TileShape {
        self.shape
    }

    /// Elevation of the tile's bottom face.
    #[must_use]
    pub const fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Elevation of the tile's top at its thickest point.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.elevation + self.height
    }

    /// Elevation of the walkable surface at the provided offset from the centre.
    #[must_use]
    pub fn surface(&self, offset: PlanarOffset) -> f32 {
        self.elevation + self.height_at(offset)
    }

    /// Actor resting on the tile, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<ActorId> {
        self.occupant
    }
}

impl Spatial for Tile {
    fn position(&self) -> Position {
        self.cell.center(self.elevation)
    }

    fn height_at(&self, offset: PlanarOffset) -> f32 {
        self.shape.profile(self.height, offset)
    }

    fn screen_bounds(&self, projector: &Projector) -> ScreenRect {
        ScreenRect::of_box(projector, self.position(), 0.5, self.height)
    }
}

/// Outcome of a successful stack edit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StackEdit {
    /// Cell whose stack changed.
    pub cell: GridCoord,
    /// Tile that entered the stack and the layer it landed on.
    pub placed: Option<(TileId, usize)>,
    /// Tile that left the stack and the layer it occupied.
    pub removed: Option<(TileId, usize)>,
    /// Actor resting on the stack when the edit happened.
    pub occupant: Option<ActorId>,
    /// Change of the top surface under the occupant.
    pub rise: f32,
    /// Whether the stack became empty under its occupant.
    pub evicted: bool,
}

/// Grid of tile stacks.
#[derive(Clone, Debug)]
pub struct TileMap {
    width: u32,
    length: u32,
    stacks: Vec<Vec<Tile>>,
    locations: HashMap<TileId, GridCoord>,
    next_tile: u32,
}

impl TileMap {
    /// Creates an empty map spanning `width` cells along `x` and `length` along `y`.
    #[must_use]
    pub fn new(width: u32, length: u32) -> Self {
        let cells = (width as usize).saturating_mul(length as usize);
        Self {
            width,
            length,
            stacks: vec![Vec::new(); cells],
            locations: HashMap::new(),
            next_tile: 0,
        }
    }

    /// Number of cells along `x`.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of cells along `y`.
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Reports whether the cell lies inside the map.
    #[must_use]
    pub fn contains(&self, cell: GridCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Reports whether the cell is in bounds and holds at least one tile.
    #[must_use]
    pub fn valid(&self, cell: GridCoord) -> bool {
        self.stack(cell).is_some_and(|stack| !stack.is_empty())
    }

    /// Tiles of a cell from bottom to top. `None` when out of bounds.
    #[must_use]
    pub fn stack(&self, cell: GridCoord) -> Option<&[Tile]> {
        self.index(cell).map(|index| self.stacks[index].as_slice())
    }

    /// Every tile of the map, cell by cell.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.stacks.iter().flatten()
    }

    /// Tile carrying the provided identifier.
    #[must_use]
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        let cell = self.locations.get(&id)?;
        self.stack(*cell)?.iter().find(|tile| tile.id == id)
    }

    /// Top-most tile of the cell.
    #[must_use]
    pub fn at(&self, cell: GridCoord) -> Option<&Tile> {
        self.stack(cell)?.last()
    }

    /// Tile whose `[elevation, top)` interval contains `z`.
    ///
    /// Scans from the bottom and falls back to the top-most tile when `z` lies
    /// above the whole stack.
    #[must_use]
    pub fn at_elevation(&self, cell: GridCoord, z: f32) -> Option<&Tile> {
        let stack = self.stack(cell)?;
        stack.iter().find(|tile| z < tile.top()).or_else(|| stack.last())
    }

    /// Walkable surface at a fractional coordinate.
    ///
    /// Resolves the top tile of the cell nearest to `(x, y)` and evaluates its
    /// height profile at the offset from that cell's centre. `None` means
    /// there is no ground: the cell is out of bounds or empty.
    #[must_use]
    pub fn height(&self, x: f32, y: f32) -> Option<f32> {
        let position = Position::new(x, y, 0.0);
        let tile = self.at(position.cell())?;
        Some(tile.surface(position.offset_in_cell()))
    }

    /// Walkable surface at the centre of the cell.
    #[must_use]
    pub fn surface(&self, cell: GridCoord) -> Option<f32> {
        self.at(cell).map(|tile| tile.surface(PlanarOffset::CENTER))
    }

    /// Actor resting on the top tile of the cell.
    #[must_use]
    pub fn occupant_at(&self, cell: GridCoord) -> Option<ActorId> {
        self.at(cell).and_then(Tile::occupant)
    }

    /// Appends a tile to the top of the stack.
    ///
    /// The occupant of the previous top moves onto the new tile and rises by
    /// the change of the surface beneath it.
    pub fn place(&mut self, cell: GridCoord, spec: TileSpec) -> Result<StackEdit, EditError> {
        let layer = self.stack(cell).ok_or(EditError::OutOfBounds)?.len();
        self.insert(cell, layer, spec)
    }

    /// Inserts a tile at `layer`, lifting every tile above it.
    ///
    /// `layer` may equal the stack height, which is the same as [`Self::place`].
    pub fn insert(
        &mut self,
        cell: GridCoord,
        layer: usize,
        spec: TileSpec,
    ) -> Result<StackEdit, EditError> {
        let index = self.index(cell).ok_or(EditError::OutOfBounds)?;
        if layer > self.stacks[index].len() {
            return Err(EditError::MissingLayer);
        }

        let tile = self.mint(cell, spec);
        let id = tile.id;
        let before = self.top_surface(index);
        let occupant = self.take_occupant(index);

        self.stacks[index].insert(layer, tile);
        restack(&mut self.stacks[index], occupant);
        let _ = self.locations.insert(id, cell);

        Ok(StackEdit {
            cell,
            placed: Some((id, layer)),
            removed: None,
            occupant,
            rise: self.rise_from(index, before),
            evicted: false,
        })
    }

    /// Swaps the tile at `layer` for a new one, re-stacking the tiles above.
    pub fn replace(
        &mut self,
        cell: GridCoord,
        layer: usize,
        spec: TileSpec,
    ) -> Result<StackEdit, EditError> {
        let index = self.index(cell).ok_or(EditError::OutOfBounds)?;
        if layer >= self.stacks[index].len() {
            return Err(EditError::MissingLayer);
        }

        let tile = self.mint(cell, spec);
        let id = tile.id;
        let before = self.top_surface(index);
        let occupant = self.take_occupant(index);

        let old = std::mem::replace(&mut self.stacks[index][layer], tile);
        let _ = self.locations.remove(&old.id);
        restack(&mut self.stacks[index], occupant);
        let _ = self.locations.insert(id, cell);

        Ok(StackEdit {
            cell,
            placed: Some((id, layer)),
            removed: Some((old.id, layer)),
            occupant,
            rise: self.rise_from(index, before),
            evicted: false,
        })
    }

    /// Removes the tile at `layer`, lowering every tile above it.
    ///
    /// Removing the last tile under an occupant evicts it: the edit reports
    /// `evicted` and the occupant is no longer registered anywhere.
    pub fn remove(&mut self, cell: GridCoord, layer: usize) -> Result<StackEdit, EditError> {
        let index = self.index(cell).ok_or(EditError::OutOfBounds)?;
        if layer >= self.stacks[index].len() {
            return Err(EditError::MissingLayer);
        }

        let before = self.top_surface(index);
        let occupant = self.take_occupant(index);

        let old = self.stacks[index].remove(layer);
        let _ = self.locations.remove(&old.id);
        restack(&mut self.stacks[index], occupant);

        let evicted = occupant.is_some() && self.stacks[index].is_empty();
        let rise = if evicted {
            0.0
        } else {
            self.rise_from(index, before)
        };

        Ok(StackEdit {
            cell,
            placed: None,
            removed: Some((old.id, layer)),
            occupant,
            rise,
            evicted,
        })
    }

    /// Registers or clears the occupant of the cell's top tile.
    ///
    /// Returns the previous occupant.
    pub(crate) fn set_occupant(
        &mut self,
        cell: GridCoord,
        occupant: Option<ActorId>,
    ) -> Result<Option<ActorId>, EditError> {
        let index = self.index(cell).ok_or(EditError::OutOfBounds)?;
        let top = self.stacks[index]
            .last_mut()
            .ok_or(EditError::MissingGround)?;
        Ok(std::mem::replace(&mut top.occupant, occupant))
    }

    fn mint(&mut self, cell: GridCoord, spec: TileSpec) -> Tile {
        let id = TileId::new(self.next_tile);
        self.next_tile = self.next_tile.wrapping_add(1);
        Tile {
            id,
            cell,
            layer: 0,
            height: spec.sanitized_height(),
            shape: spec.shape,
            elevation: 0.0,
            occupant: None,
        }
    }

    fn take_occupant(&mut self, index: usize) -> Option<ActorId> {
        self.stacks[index]
            .last_mut()
            .and_then(|tile| tile.occupant.take())
    }

    fn top_surface(&self, index: usize) -> Option<f32> {
        self.stacks[index]
            .last()
            .map(|tile| tile.surface(PlanarOffset::CENTER))
    }

    fn rise_from(&self, index: usize, before: Option<f32>) -> f32 {
        match (before, self.top_surface(index)) {
            (Some(before), Some(after)) => after - before,
            _ => 0.0,
        }
    }

    fn index(&self, cell: GridCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let y = u32::try_from(cell.y()).ok()?;
        if x >= self.width || y >= self.length {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl Ground for TileMap {
    fn ground_height(&self, x: f32, y: f32) -> Option<f32> {
        self.height(x, y)
    }
}

/// Recomputes layers and elevations bottom-up and seats the occupant on top.
fn restack(stack: &mut [Tile], occupant: Option<ActorId>) {
    let mut elevation = 0.0;
    for (layer, tile) in stack.iter_mut().enumerate() {
        tile.layer = layer;
        tile.elevation = elevation;
        tile.occupant = None;
        elevation += tile.height;
    }
    if let Some(top) = stack.last_mut() {
        top.occupant = occupant;
    }
}

#[cfg(test)]
mod tests {
    use iso_tactics_core::Direction;

    use super::*;

    fn cell(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    #[test]
    fn placement_outside_the_map_is_rejected() {
        let mut map = TileMap::new(2, 2);

        assert_eq!(
            map.place(cell(2, 0), TileSpec::flat(1.0)),
            Err(EditError::OutOfBounds)
        );
        assert_eq!(
            map.place(cell(0, -1), TileSpec::flat(1.0)),
            Err(EditError::OutOfBounds)
        );
        assert_eq!(map.tiles().count(), 0);
    }

    #[test]
    fn stacked_tiles_accumulate_elevation() {
        let mut map = TileMap::new(1, 1);
        let _ = map.place(cell(0, 0), TileSpec::flat(2.0));
        let _ = map.place(cell(0, 0), TileSpec::flat(1.0));

        let stack = map.stack(cell(0, 0)).unwrap_or_default();
        assert_eq!(stack[0].elevation(), 0.0);
        assert_eq!(stack[1].elevation(), 2.0);
        assert_eq!(stack[1].layer(), 1);
        assert_eq!(map.height(0.0, 0.0), Some(3.0));
    }

    #[test]
    fn occupant_rides_the_new_top() {
        let mut map = TileMap::new(1, 1);
        let actor = ActorId::new(4);
        let _ = map.place(cell(0, 0), TileSpec::flat(2.0));
        assert_eq!(map.set_occupant(cell(0, 0), Some(actor)), Ok(None));

        let edit = map.place(cell(0, 0), TileSpec::flat(1.0));

        let edit = edit.unwrap_or_else(|error| panic!("placement failed: {error:?}"));
        assert_eq!(edit.occupant, Some(actor));
        assert_eq!(edit.rise, 1.0);
        assert_eq!(map.occupant_at(cell(0, 0)), Some(actor));
        assert_eq!(map.stack(cell(0, 0)).map(|s| s[0].occupant()), Some(None));
    }

    #[test]
    fn insertion_below_lifts_upper_layers() {
        let mut map = TileMap::new(1, 1);
        let _ = map.place(cell(0, 0), TileSpec::flat(1.0));
        let _ = map.place(cell(0, 0), TileSpec::flat(1.0));

        let edit = map.insert(cell(0, 0), 0, TileSpec::flat(0.5));

        assert_eq!(edit.map(|edit| edit.rise), Ok(0.5));
        let elevations: Vec<_> = map
            .stack(cell(0, 0))
            .unwrap_or_default()
            .iter()
            .map(Tile::elevation)
            .collect();
        assert_eq!(elevations, vec![0.0, 0.5, 1.5]);
    }

    #[test]
    fn layer_edits_validate_indices() {
        let mut map = TileMap::new(1, 1);
        let _ = map.place(cell(0, 0), TileSpec::flat(1.0));

        assert_eq!(
            map.insert(cell(0, 0), 3, TileSpec::flat(1.0)),
            Err(EditError::MissingLayer)
        );
        assert_eq!(
            map.replace(cell(0, 0), 1, TileSpec::flat(1.0)),
            Err(EditError::MissingLayer)
        );
        assert_eq!(map.remove(cell(0, 0), 1), Err(EditError::MissingLayer));
    }

    #[test]
    fn replacing_a_layer_restacks_and_reports_rise() {
        let mut map = TileMap::new(1, 1);
        let actor = ActorId::new(0);
        let _ = map.place(cell(0, 0), TileSpec::flat(2.0));
        let _ = map.place(cell(0, 0), TileSpec::flat(1.0));
        let _ = map.set_occupant(cell(0, 0), Some(actor));

        let edit = map.replace(cell(0, 0), 0, TileSpec::flat(0.5));

        let edit = edit.unwrap_or_else(|error| panic!("replace failed: {error:?}"));
        assert_eq!(edit.rise, -1.5);
        assert!(edit.removed.is_some());
        assert_eq!(map.height(0.0, 0.0), Some(1.5));
        assert_eq!(map.occupant_at(cell(0, 0)), Some(actor));
    }

    #[test]
    fn removing_the_last_tile_evicts_the_occupant() {
        let mut map = TileMap::new(1, 1);
        let actor = ActorId::new(0);
        let _ = map.place(cell(0, 0), TileSpec::flat(1.0));
        let _ = map.set_occupant(cell(0, 0), Some(actor));

        let edit = map.remove(cell(0, 0), 0);

        let edit = edit.unwrap_or_else(|error| panic!("remove failed: {error:?}"));
        assert!(edit.evicted);
        assert_eq!(edit.occupant, Some(actor));
        assert!(!map.valid(cell(0, 0)));
        assert_eq!(map.height(0.0, 0.0), None);
    }

    #[test]
    fn elevation_lookup_scans_bottom_up() {
        let mut map = TileMap::new(1, 1);
        let _ = map.place(cell(0, 0), TileSpec::flat(2.0));
        let _ = map.place(cell(0, 0), TileSpec::flat(1.0));

        let layer_at = |z: f32| map.at_elevation(cell(0, 0), z).map(Tile::layer);

        assert_eq!(layer_at(-1.0), Some(0));
        assert_eq!(layer_at(0.0), Some(0));
        assert_eq!(layer_at(1.99), Some(0));
        assert_eq!(layer_at(2.0), Some(1));
        assert_eq!(layer_at(10.0), Some(1));
        assert_eq!(map.at_elevation(cell(1, 0), 0.0), None);
    }

    #[test]
    fn ramps_shape_the_height_field() {
        let mut map = TileMap::new(2, 1);
        let _ = map.place(cell(1, 0), TileSpec::flat(1.0));
        let _ = map.place(cell(1, 0), TileSpec::ramp(2.0, Direction::East));

        assert_eq!(map.height(0.5, 0.0), Some(1.0));
        assert_eq!(map.height(1.0, 0.0), Some(2.0));
        assert_eq!(map.height(1.25, 0.2), Some(2.5));
        assert_eq!(map.height(0.0, 0.0), None);
        assert_eq!(map.surface(cell(1, 0)), Some(2.0));
    }

    #[test]
    fn tiles_are_found_by_identifier() {
        let mut map = TileMap::new(3, 3);
        let edit = map.place(cell(2, 1), TileSpec::flat(1.0));
        let Ok(StackEdit {
            placed: Some((id, _)),
            ..
        }) = edit
        else {
            panic!("placement failed");
        };

        assert_eq!(map.tile(id).map(Tile::cell), Some(cell(2, 1)));
        let _ = map.remove(cell(2, 1), 0);
        assert_eq!(map.tile(id), None);
    }
}
