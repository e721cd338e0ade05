//! Duplicate suppression for cross-boundary pairs.
//!
//! A pair whose boxes straddle a shared cell boundary is rediscovered in
//! every cell both geometries were replicated into. The reference-corner
//! rule designates exactly one owner: the cell containing the lower-left
//! corner of the intersection rectangle. Cells tile the universe without
//! interior overlap, so that corner lies in exactly one cell, and the
//! owner is always among the cells both geometries were assigned to.

use crate::cell_join::CandidatePair;
use crate::grid::{CellId, Grid};
use crate::types::BoundingBox;

/// Whether `cell` is the canonical owner of the pair `(a, b)`.
///
/// Pure function of the two boxes, the candidate cell, and the grid.
/// Returns `false` for non-overlapping boxes, so it doubles as a final
/// overlap check.
///
/// # Examples
///
/// ```
/// use gridjoin::{is_owning_cell, BoundingBox, CellId, Grid};
///
/// let grid = Grid::new(BoundingBox::new(0.0, 0.0, 6.0, 6.0), 3)?;
/// let a = BoundingBox::new(1.5, 0.5, 2.5, 1.5); // straddles cols 0 and 1
/// let b = BoundingBox::new(1.8, 0.5, 3.0, 1.5);
///
/// // The overlap region starts at x = 1.8, inside column 0.
/// assert!(is_owning_cell(&a, &b, CellId::new(0, 0), &grid));
/// assert!(!is_owning_cell(&a, &b, CellId::new(0, 1), &grid));
/// # Ok::<(), gridjoin::JoinError>(())
/// ```
pub fn is_owning_cell(a: &BoundingBox, b: &BoundingBox, cell: CellId, grid: &Grid) -> bool {
    match a.intersection(b) {
        Some(overlap) => grid.cell_containing(overlap.min_x, overlap.min_y) == cell,
        None => false,
    }
}

/// Apply the reference-corner rule to a candidate pair.
pub fn owns_pair(pair: &CandidatePair, grid: &Grid) -> bool {
    is_owning_cell(&pair.a.bbox, &pair.b.bbox, pair.cell, grid)
}
