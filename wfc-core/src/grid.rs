use crate::BoundaryMode;
use wfc_rules::Direction;

/// Dense 3D storage, indexed `z * width * height + y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub(crate) data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    /// Creates a new grid with the given dimensions, initialized with default values.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        let size = width * height * depth;
        let data = vec![T::default(); size];
        Self {
            width,
            height,
            depth,
            data,
        }
    }
}

impl<T> Grid<T> {
    /// Returns an immutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        self.index(x, y, z).and_then(|idx| self.data.get(idx))
    }

    /// Returns a mutable reference to the element at the given coordinates,
    /// or None if the coordinates are out of bounds.
    pub fn get_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut T> {
        self.index(x, y, z)
            .and_then(move |idx| self.data.get_mut(idx))
    }

    /// Calculates the 1D index for the given 3D coordinates.
    /// Returns None if the coordinates are out of bounds.
    pub fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.width && y < self.height && z < self.depth {
            Some(z * self.width * self.height + y * self.width + x)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cells in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

/// Per-axis boundary handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Boundaries {
    /// Handling along x.
    pub x: BoundaryMode,
    /// Handling along y.
    pub y: BoundaryMode,
    /// Handling along z.
    pub z: BoundaryMode,
}

impl Boundaries {
    /// The same mode on all three axes.
    pub fn uniform(mode: BoundaryMode) -> Self {
        Self {
            x: mode,
            y: mode,
            z: mode,
        }
    }

    /// All axes periodic when `periodic` is set, otherwise all clamped.
    pub fn from_periodic(periodic: bool) -> Self {
        Self::uniform(if periodic {
            BoundaryMode::Periodic
        } else {
            BoundaryMode::Clamped
        })
    }

    /// The cell whose domain constrains `(x, y, z)` along `direction`.
    ///
    /// `+x` reads from `x - 1`, `+y` from `y + 1`, `+z` from `z + 1`; the
    /// negative directions read from the opposite side. Returns `None` when the
    /// step leaves a clamped axis.
    pub fn source_cell(
        &self,
        (x, y, z): (usize, usize, usize),
        direction: Direction,
        (width, height, depth): (usize, usize, usize),
    ) -> Option<(usize, usize, usize)> {
        match direction {
            Direction::PosX => Some((step_back(x, width, self.x)?, y, z)),
            Direction::NegX => Some((step_forward(x, width, self.x)?, y, z)),
            Direction::PosY => Some((x, step_forward(y, height, self.y)?, z)),
            Direction::NegY => Some((x, step_back(y, height, self.y)?, z)),
            Direction::PosZ => Some((x, y, step_forward(z, depth, self.z)?)),
            Direction::NegZ => Some((x, y, step_back(z, depth, self.z)?)),
        }
    }
}

fn step_back(coord: usize, size: usize, mode: BoundaryMode) -> Option<usize> {
    if coord > 0 {
        Some(coord - 1)
    } else {
        match mode {
            BoundaryMode::Periodic => Some(size - 1),
            BoundaryMode::Clamped => None,
        }
    }
}

fn step_forward(coord: usize, size: usize, mode: BoundaryMode) -> Option<usize> {
    if coord + 1 < size {
        Some(coord + 1)
    } else {
        match mode {
            BoundaryMode::Periodic => Some(0),
            BoundaryMode::Clamped => None,
        }
    }
}
