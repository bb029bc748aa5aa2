//! Geometric helpers for grid collision checks and distance scoring.

use crate::types::{CellBox, GridPos};

/// Checks whether two blocks share at least one cell.
///
/// Two blocks do NOT overlap when they are separated along at least one axis.
pub fn intersects(a: &CellBox, b: &CellBox) -> bool {
    let (a_max, b_max) = (a.max(), b.max());

    !(a_max.x <= b.min.x
        || b_max.x <= a.min.x
        || a_max.y <= b.min.y
        || b_max.y <= a.min.y
        || a_max.z <= b.min.z
        || b_max.z <= a.min.z)
}

/// Length of the overlap of two half-open intervals `[a1, a2)` and `[b1, b2)`.
///
/// # Example
/// ```
/// use drawer_tidy::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0, 5, 3, 8), 2);
/// assert_eq!(overlap_1d(0, 2, 4, 6), 0);
/// ```
pub fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    a2.min(b2).saturating_sub(a1.max(b1))
}

/// Number of cells shared by two blocks on the same layers.
pub fn overlap_area_xy(a: &CellBox, b: &CellBox) -> u64 {
    let (a_max, b_max) = (a.max(), b.max());
    let overlap_x = overlap_1d(a.min.x, a_max.x, b.min.x, b_max.x);
    let overlap_y = overlap_1d(a.min.y, a_max.y, b.min.y, b_max.y);
    u64::from(overlap_x) * u64::from(overlap_y)
}

/// Manhattan distance between two cells with the vertical axis weighted.
///
/// A `vertical_factor` above 1 makes changing layers costlier than sliding
/// sideways on the same layer.
pub fn weighted_manhattan(a: GridPos, b: GridPos, vertical_factor: u64) -> u64 {
    (u64::from(a.x.abs_diff(b.x)) + u64::from(a.y.abs_diff(b.y)))
        .saturating_add(u64::from(a.z.abs_diff(b.z)).saturating_mul(vertical_factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Extent;

    #[test]
    fn separated_blocks_do_not_intersect() {
        let a = CellBox::new(GridPos::new(0, 0, 0), Extent::new(2, 2, 1));
        let b = CellBox::new(GridPos::new(2, 0, 0), Extent::new(2, 2, 1));
        let above = CellBox::new(GridPos::new(0, 0, 1), Extent::new(2, 2, 1));

        assert!(!intersects(&a, &b));
        assert!(!intersects(&a, &above));
        assert_eq!(overlap_area_xy(&a, &above), 4);
    }

    #[test]
    fn tall_block_intersects_block_on_upper_layer() {
        let tall = CellBox::new(GridPos::new(1, 1, 0), Extent::new(1, 1, 3));
        let upper = CellBox::new(GridPos::new(0, 0, 2), Extent::new(2, 2, 1));

        assert!(intersects(&tall, &upper));
    }

    #[test]
    fn weighted_distance_penalizes_layers() {
        let a = GridPos::new(0, 0, 0);
        assert_eq!(weighted_manhattan(a, GridPos::new(2, 1, 0), 4), 3);
        assert_eq!(weighted_manhattan(a, GridPos::new(0, 0, 1), 4), 4);
        assert_eq!(weighted_manhattan(GridPos::new(3, 3, 2), a, 4), 14);
    }
}
