//! Common grid types and traits.
//!
//! Everything in the planner lives on an integer grid: containers are
//! `width × depth` cells per layer, items cover a rectangular block of cells
//! across one or more consecutive layers.

use serde::{Deserialize, Serialize};

/// Size of a block in grid units (width along x, depth along y, height in layers).
///
/// # Examples
/// ```
/// use drawer_tidy::types::Extent;
///
/// let extent = Extent::new(2, 3, 1);
/// assert_eq!(extent.volume(), 6);
/// assert_eq!(extent.rotated(), Extent::new(3, 2, 1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub width: u32,
    pub depth: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, depth: u32, height: u32) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// Number of cells covered across all layers.
    #[inline]
    pub fn volume(&self) -> u64 {
        u64::from(self.width) * u64::from(self.depth) * u64::from(self.height)
    }

    /// Number of cells covered on a single layer.
    #[inline]
    pub fn footprint_area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.depth)
    }

    /// Same block turned 90° in the horizontal plane.
    #[inline]
    pub const fn rotated(&self) -> Self {
        Self::new(self.depth, self.width, self.height)
    }

    /// Whether width and depth are equal, so rotating changes nothing.
    #[inline]
    pub const fn is_square(&self) -> bool {
        self.width == self.depth
    }

    /// Checks the horizontal footprint against a `width × depth` area.
    #[inline]
    pub const fn fits_footprint(&self, width: u32, depth: u32) -> bool {
        self.width <= width && self.depth <= depth
    }

    /// Checks footprint and height against another extent.
    #[inline]
    pub const fn fits_within(&self, outer: &Self) -> bool {
        self.fits_footprint(outer.width, outer.depth) && self.height <= outer.height
    }
}

/// A cell address: `x` along the width, `y` along the depth, `z` the layer index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridPos {
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Trait for anything occupying a block of grid cells.
pub trait Dimensional {
    /// Returns the block size.
    fn extent(&self) -> Extent;

    /// Cells covered across all layers.
    fn volume(&self) -> u64 {
        self.extent().volume()
    }
}

/// Axis-aligned block of cells anchored at its lowest corner.
///
/// Used to reason about the final layout of a plan (overlap and support
/// checks) independently of any container state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellBox {
    pub min: GridPos,
    pub extent: Extent,
}

impl CellBox {
    #[inline]
    pub const fn new(min: GridPos, extent: Extent) -> Self {
        Self { min, extent }
    }

    /// Exclusive upper corner.
    #[inline]
    pub fn max(&self) -> GridPos {
        GridPos::new(
            self.min.x + self.extent.width,
            self.min.y + self.extent.depth,
            self.min.z + self.extent.height,
        )
    }

    /// Index of the highest layer covered by the block.
    #[inline]
    pub fn top_layer(&self) -> u32 {
        self.min.z + self.extent.height.max(1) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_volume_and_area() {
        let extent = Extent::new(2, 3, 4);
        assert_eq!(extent.volume(), 24);
        assert_eq!(extent.footprint_area(), 6);
    }

    #[test]
    fn test_extent_rotation() {
        let extent = Extent::new(1, 3, 2);
        assert_eq!(extent.rotated(), Extent::new(3, 1, 2));
        assert!(!extent.is_square());
        assert!(Extent::new(2, 2, 5).is_square());
    }

    #[test]
    fn test_extent_fits() {
        let small = Extent::new(2, 3, 1);
        let outer = Extent::new(3, 2, 2);

        assert!(!small.fits_within(&outer));
        assert!(small.rotated().fits_within(&outer));
        assert!(!Extent::new(1, 1, 3).fits_within(&outer));
    }

    #[test]
    fn test_cell_box_corners() {
        let block = CellBox::new(GridPos::new(1, 1, 0), Extent::new(2, 1, 2));

        assert_eq!(block.max(), GridPos::new(3, 2, 2));
        assert_eq!(block.top_layer(), 1);
    }
}
