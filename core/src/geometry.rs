//! Logical and screen-space geometry shared by every crate.

use serde::{Deserialize, Serialize};

/// Position of an object in logical simulation space.
///
/// `x` and `y` are grid coordinates that may be fractional while an actor is
/// between cells, `z` is the elevation. Screen coordinates are always derived
/// through a [`Projector`] and never stored alongside.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Grid axis that runs toward the lower-right corner of the screen.
    pub x: f32,
    /// Grid axis that runs toward the lower-left corner of the screen.
    pub y: f32,
    /// Elevation; larger values are drawn higher on screen.
    pub z: f32,
}

impl Position {
    /// Logical origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new logical position.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns a copy of the position with the elevation replaced.
    #[must_use]
    pub const fn with_z(self, z: f32) -> Self {
        Self {
            x: self.x,
            y: self.y,
            z,
        }
    }

    /// Euclidean distance between two positions ignoring elevation.
    #[must_use]
    pub fn planar_distance(self, other: Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Grid cell containing the position, rounding each axis to the nearest integer.
    #[must_use]
    pub fn cell(self) -> GridCoord {
        GridCoord::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Horizontal offset of the position from the centre of its cell.
    #[must_use]
    pub fn offset_in_cell(self) -> PlanarOffset {
        PlanarOffset::new(self.x - self.x.round(), self.y - self.y.round())
    }

    /// Painter's depth of the position: larger values are nearer the camera.
    #[must_use]
    pub fn depth(self) -> f32 {
        self.x + self.y - self.z
    }
}

/// Horizontal displacement measured from the centre of a cell or object.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlanarOffset {
    /// Offset along the grid's x axis.
    pub dx: f32,
    /// Offset along the grid's y axis.
    pub dy: f32,
}

impl PlanarOffset {
    /// Offset pointing at the exact centre.
    pub const CENTER: Self = Self::new(0.0, 0.0);

    /// Creates a new planar offset.
    #[must_use]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Integral cell coordinate on the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    x: i32,
    y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell along the grid's x axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell along the grid's y axis.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Cell displaced by the provided deltas, saturating at the integer bounds.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Neighbouring cell one step in the provided direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        match direction {
            Direction::North => self.offset(0, -1),
            Direction::East => self.offset(1, 0),
            Direction::South => self.offset(0, 1),
            Direction::West => self.offset(-1, 0),
        }
    }

    /// Orthogonal neighbours in north, east, south, west order.
    #[must_use]
    pub const fn neighbors(self) -> [GridCoord; 4] {
        [
            self.step(Direction::North),
            self.step(Direction::East),
            self.step(Direction::South),
            self.step(Direction::West),
        ]
    }

    /// Logical position of the cell centre at the provided elevation.
    #[must_use]
    pub fn center(self, z: f32) -> Position {
        Position::new(self.x as f32, self.y as f32, z)
    }
}

/// Cardinal directions on the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing `y`.
    North,
    /// Toward increasing `x`.
    East,
    /// Toward increasing `y`.
    South,
    /// Toward decreasing `x`.
    West,
}

/// Isometric projection from logical positions into screen offsets.
///
/// ```text
/// screen_x = 0.5 * sx * (x - y)
/// screen_y = 0.5 * sy * (x + y) - sz * z
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projector {
    sx: f32,
    sy: f32,
    sz: f32,
}

impl Projector {
    /// Smallest scale accepted on any axis.
    pub const MIN_SCALE: f32 = 1.0;

    /// Creates a projector, clamping each scale constant to [`Self::MIN_SCALE`].
    #[must_use]
    pub fn new(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            sx: clamp_scale(sx),
            sy: clamp_scale(sy),
            sz: clamp_scale(sz),
        }
    }

    /// Horizontal scale applied to the `x - y` diagonal.
    #[must_use]
    pub const fn sx(&self) -> f32 {
        self.sx
    }

    /// Vertical scale applied to the `x + y` diagonal.
    #[must_use]
    pub const fn sy(&self) -> f32 {
        self.sy
    }

    /// Vertical scale applied to elevation.
    #[must_use]
    pub const fn sz(&self) -> f32 {
        self.sz
    }

    /// Projects a logical position onto the screen.
    #[must_use]
    pub fn project(&self, position: Position) -> ScreenOffset {
        ScreenOffset::new(
            0.5 * self.sx * (position.x - position.y),
            0.5 * self.sy * (position.x + position.y) - self.sz * position.z,
        )
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(64.0, 32.0, 16.0)
    }
}

fn clamp_scale(value: f32) -> f32 {
    if value >= Projector::MIN_SCALE {
        value
    } else {
        Projector::MIN_SCALE
    }
}

/// Screen-space translation produced by a [`Projector`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenOffset {
    /// Horizontal offset in screen units, growing to the right.
    pub x: f32,
    /// Vertical offset in screen units, growing downward.
    pub y: f32,
}

impl ScreenOffset {
    /// Creates a new screen offset.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen rectangle covering a projected object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    min: ScreenOffset,
    max: ScreenOffset,
}

impl ScreenRect {
    /// Creates a rectangle from two opposite corners in any order.
    #[must_use]
    pub fn from_corners(a: ScreenOffset, b: ScreenOffset) -> Self {
        Self {
            min: ScreenOffset::new(a.x.min(b.x), a.y.min(b.y)),
            max: ScreenOffset::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Screen bounds of a logical box centred on `base` horizontally.
    ///
    /// The box spans `half_extent` on either side of `base` along both grid
    /// axes and rises `height` above `base.z`.
    #[must_use]
    pub fn of_box(projector: &Projector, base: Position, half_extent: f32, height: f32) -> Self {
        let half = half_extent.max(0.0);
        let top = base.z + height.max(0.0);
        let left = projector.project(Position::new(base.x - half, base.y + half, base.z));
        let right = projector.project(Position::new(base.x + half, base.y - half, base.z));
        let upper = projector.project(Position::new(base.x - half, base.y - half, top));
        let lower = projector.project(Position::new(base.x + half, base.y + half, base.z));

        Self {
            min: ScreenOffset::new(left.x, upper.y),
            max: ScreenOffset::new(right.x, lower.y),
        }
    }

    /// Upper-left corner.
    #[must_use]
    pub const fn min(&self) -> ScreenOffset {
        self.min
    }

    /// Lower-right corner.
    #[must_use]
    pub const fn max(&self) -> ScreenOffset {
        self.max
    }

    /// Reports whether the interiors of two rectangles overlap.
    ///
    /// Rectangles that merely share an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &ScreenRect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// Capabilities shared by every object placed in logical space.
pub trait Spatial {
    /// Logical anchor of the object.
    fn position(&self) -> Position;

    /// Height of the object's upper surface above its anchor at the provided
    /// horizontal offset from its centre.
    fn height_at(&self, offset: PlanarOffset) -> f32;

    /// Screen rectangle covered by the object once projected.
    fn screen_bounds(&self, projector: &Projector) -> ScreenRect;
}

/// Terrain that can be sampled for a ground elevation.
pub trait Ground {
    /// Elevation of the walkable surface at the provided logical coordinate.
    ///
    /// Returns `None` where no terrain exists.
    fn ground_height(&self, x: f32, y: f32) -> Option<f32>;
}
