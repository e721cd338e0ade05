//! Uniform n×n grid decomposition of the covered space.
//!
//! The grid tiles the universe exactly: cell boundaries are half-open on
//! the upper edge except for the last row/column, which close the grid at
//! the universe's maximum. Every point of the universe therefore belongs
//! to exactly one cell, while a box straddling a boundary overlaps several
//! cells by design.

use crate::error::{JoinError, Result};
use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one grid cell, row-major.
///
/// Ordering is lexicographic on `(row, col)`, which the deduplication rule
/// relies on being total and unambiguous.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CellId {
    /// Row index in `[0, n)`.
    pub row: usize,
    /// Column index in `[0, n)`.
    pub col: usize,
}

impl CellId {
    /// Create a cell id from row and column indices.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Inclusive rectangular range of cells overlapped by a bounding box.
///
/// Iterates the covered cells in row-major order.
#[derive(Debug, Clone)]
pub struct CellRange {
    row_min: usize,
    row_max: usize,
    col_min: usize,
    col_max: usize,
    next: Option<CellId>,
}

impl CellRange {
    fn new(row_min: usize, row_max: usize, col_min: usize, col_max: usize) -> Self {
        Self {
            row_min,
            row_max,
            col_min,
            col_max,
            next: Some(CellId::new(row_min, col_min)),
        }
    }

    /// Number of cells in the range.
    pub fn len(&self) -> usize {
        (self.row_max - self.row_min + 1) * (self.col_max - self.col_min + 1)
    }

    /// A range always covers at least one cell; provided for completeness.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the range covers the given cell.
    pub fn contains(&self, cell: CellId) -> bool {
        (self.row_min..=self.row_max).contains(&cell.row)
            && (self.col_min..=self.col_max).contains(&cell.col)
    }
}

impl Iterator for CellRange {
    type Item = CellId;

    fn next(&mut self) -> Option<CellId> {
        let current = self.next?;
        self.next = if current.col < self.col_max {
            Some(CellId::new(current.row, current.col + 1))
        } else if current.row < self.row_max {
            Some(CellId::new(current.row + 1, self.col_min))
        } else {
            None
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(cell) => {
                let width = self.col_max - self.col_min + 1;
                self.len() - (cell.row - self.row_min) * width - (cell.col - self.col_min)
            }
            None => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRange {}

/// The n×n decomposition of the universe into equal-sized cells.
///
/// Pure geometry: built once per join invocation and read-only afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    universe: BoundingBox,
    n: usize,
    cell_width: f64,
    cell_height: f64,
}

impl Grid {
    /// Build a grid covering `universe` with `n` partitions per axis.
    ///
    /// A degenerate universe (zero width or height) is only accepted with
    /// `n == 1`, the single-partition fallback.
    ///
    /// # Errors
    ///
    /// [`JoinError::InvalidConfiguration`] when `n == 0`, when the universe
    /// is malformed, or when the universe is degenerate with `n > 1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridjoin::{BoundingBox, Grid};
    ///
    /// let grid = Grid::new(BoundingBox::new(0.0, 0.0, 6.0, 6.0), 3)?;
    /// assert_eq!(grid.cell_count(), 9);
    /// # Ok::<(), gridjoin::JoinError>(())
    /// ```
    pub fn new(universe: BoundingBox, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(JoinError::InvalidConfiguration(
                "grid needs at least one partition per axis".to_string(),
            ));
        }
        if !universe.is_valid() {
            return Err(JoinError::InvalidConfiguration(
                "universe bounding box is malformed".to_string(),
            ));
        }
        if n > 1 && universe.is_degenerate() {
            return Err(JoinError::InvalidConfiguration(format!(
                "degenerate universe (width {}, height {}) requires n = 1",
                universe.width(),
                universe.height()
            )));
        }

        Ok(Self {
            universe,
            n,
            cell_width: universe.width() / n as f64,
            cell_height: universe.height() / n as f64,
        })
    }

    /// The covered bounding region.
    pub fn universe(&self) -> &BoundingBox {
        &self.universe
    }

    /// Partitions per axis.
    pub fn partitions_per_axis(&self) -> usize {
        self.n
    }

    /// Total number of cells (`n * n`).
    pub fn cell_count(&self) -> usize {
        self.n * self.n
    }

    /// Map one axis coordinate to a clamped cell index.
    fn axis_index(offset: f64, cell_size: f64, n: usize) -> usize {
        if n == 1 || cell_size <= 0.0 {
            return 0;
        }
        let idx = (offset / cell_size).floor();
        if idx < 0.0 {
            0
        } else if idx >= n as f64 {
            n - 1
        } else {
            idx as usize
        }
    }

    /// Cell containing the point `(x, y)`.
    ///
    /// Coordinates outside the universe clamp to the nearest border cell,
    /// so the mapping is total.
    pub fn cell_containing(&self, x: f64, y: f64) -> CellId {
        CellId::new(
            Self::axis_index(y - self.universe.min_y, self.cell_height, self.n),
            Self::axis_index(x - self.universe.min_x, self.cell_width, self.n),
        )
    }

    /// Cells whose extents overlap `bbox`.
    ///
    /// Computed by direct arithmetic on the inclusive row and column
    /// ranges, O(1) in the grid resolution. Boxes reaching outside the
    /// universe clamp to the border cells rather than being dropped.
    pub fn cells_overlapping(&self, bbox: &BoundingBox) -> CellRange {
        let min = self.cell_containing(bbox.min_x, bbox.min_y);
        let max = self.cell_containing(bbox.max_x, bbox.max_y);
        CellRange::new(min.row, max.row, min.col, max.col)
    }

    /// Extent of one cell.
    ///
    /// The last row and column close exactly at the universe's maximum so
    /// the cells tile the universe with no gap.
    pub fn cell_extent(&self, cell: CellId) -> BoundingBox {
        let min_x = self.universe.min_x + cell.col as f64 * self.cell_width;
        let min_y = self.universe.min_y + cell.row as f64 * self.cell_height;
        let max_x = if cell.col + 1 == self.n {
            self.universe.max_x
        } else {
            self.universe.min_x + (cell.col + 1) as f64 * self.cell_width
        };
        let max_y = if cell.row + 1 == self.n {
            self.universe.max_y
        } else {
            self.universe.min_y + (cell.row + 1) as f64 * self.cell_height
        };
        BoundingBox::new(min_x, min_y, max_x, max_y)
    }

    /// Iterate all cells in row-major order.
    pub fn cells(&self) -> CellRange {
        CellRange::new(0, self.n - 1, 0, self.n - 1)
    }
}
