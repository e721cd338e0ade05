//! Assignment of input geometries to grid cells.
//!
//! Each geometry lands in every cell its bounding box overlaps, so a
//! boundary-straddling box is replicated into several buckets. Buckets hold
//! cheap copies of the `(id, bbox)` records; the caller's geometry payloads
//! are never touched.

use crate::error::{JoinError, Result};
use crate::grid::{CellId, Grid};
use crate::types::{Config, MalformedPolicy, OverflowReport, SpatialItem};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Which input dataset a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The left (outer) dataset.
    A,
    /// The right (inner) dataset.
    B,
}

/// Per-cell pair of input sequences, consumed exactly once by the
/// cell-local join.
#[derive(Debug, Clone, Default)]
pub struct CellBucket {
    /// A-side records assigned to this cell.
    pub a: Vec<SpatialItem>,
    /// B-side records assigned to this cell.
    pub b: Vec<SpatialItem>,
}

impl CellBucket {
    /// Total records in the bucket, both sides combined.
    pub fn len(&self) -> usize {
        self.a.len() + self.b.len()
    }

    /// Whether the bucket holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty()
    }

    fn push(&mut self, side: Side, item: SpatialItem) {
        match side {
            Side::A => self.a.push(item),
            Side::B => self.b.push(item),
        }
    }
}

/// Buckets two datasets into the cells of a grid.
///
/// Built once per join invocation; [`Partitioner::finish`] hands the
/// buckets over to the orchestrator along with any overflow reports.
#[derive(Debug)]
pub struct Partitioner<'g> {
    grid: &'g Grid,
    capacity: usize,
    malformed_policy: MalformedPolicy,
    buckets: FxHashMap<CellId, CellBucket>,
    assignments: usize,
    replicated: usize,
    malformed_skipped: usize,
}

impl<'g> Partitioner<'g> {
    /// Create a partitioner for the given grid and configuration.
    pub fn new(grid: &'g Grid, config: &Config) -> Self {
        Self {
            grid,
            capacity: config.cell_capacity,
            malformed_policy: config.malformed_policy,
            buckets: FxHashMap::default(),
            assignments: 0,
            replicated: 0,
            malformed_skipped: 0,
        }
    }

    /// Assign every record of `items` to the cells its box overlaps.
    ///
    /// # Errors
    ///
    /// [`JoinError::MalformedBoundingBox`] on the first invalid box when
    /// the policy is [`MalformedPolicy::Fail`]; under
    /// [`MalformedPolicy::SkipAndReport`] invalid records are logged,
    /// counted, and skipped.
    pub fn assign(&mut self, side: Side, items: &[SpatialItem]) -> Result<()> {
        for item in items {
            if !item.bbox.is_valid() {
                match self.malformed_policy {
                    MalformedPolicy::Fail => {
                        return Err(JoinError::MalformedBoundingBox { id: item.id });
                    }
                    MalformedPolicy::SkipAndReport => {
                        log::warn!(
                            "skipping geometry {} with malformed bounding box {:?}",
                            item.id,
                            item.bbox
                        );
                        self.malformed_skipped += 1;
                        continue;
                    }
                }
            }

            // Most boxes are small relative to a cell; 4 covers the common
            // corner-straddling case without a heap allocation.
            let cells: SmallVec<[CellId; 4]> =
                self.grid.cells_overlapping(&item.bbox).collect();
            self.assignments += cells.len();
            self.replicated += cells.len() - 1;
            for cell in cells {
                self.buckets.entry(cell).or_default().push(side, *item);
            }
        }
        Ok(())
    }

    /// Number of malformed records skipped so far.
    pub fn malformed_skipped(&self) -> usize {
        self.malformed_skipped
    }

    /// Total bucket insertions so far, counting replicas.
    pub fn assignments(&self) -> usize {
        self.assignments
    }

    /// Extra copies created by cross-boundary replication so far.
    pub fn replicated(&self) -> usize {
        self.replicated
    }

    /// Finish partitioning: return the populated buckets sorted by cell id
    /// and an overflow report for every cell exceeding the capacity.
    pub fn finish(self) -> (Vec<(CellId, CellBucket)>, Vec<OverflowReport>) {
        let mut overflows = Vec::new();
        let mut buckets: Vec<(CellId, CellBucket)> = self.buckets.into_iter().collect();
        buckets.sort_by_key(|(cell, _)| *cell);

        for (cell, bucket) in &buckets {
            if bucket.len() > self.capacity {
                log::warn!(
                    "cell {} holds {} items, exceeding capacity {}",
                    cell,
                    bucket.len(),
                    self.capacity
                );
                overflows.push(OverflowReport {
                    cell: *cell,
                    observed: bucket.len(),
                    capacity: self.capacity,
                });
            }
        }

        (buckets, overflows)
    }
}
