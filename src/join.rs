//! Join orchestration: grid construction, partitioning, and per-cell
//! execution.
//!
//! Cells are independent units of work: each consumes only its own bucket
//! and produces only its own pairs. [`SpatialJoin::run`] processes them
//! lazily on the calling thread; [`SpatialJoin::run_parallel`] fans them
//! out on the rayon pool with the result sink and stats behind mutexes as
//! the only shared state.

use crate::cell_join::join_cell;
use crate::dedup::owns_pair;
use crate::error::{JoinError, Result};
use crate::grid::{CellId, Grid};
use crate::partition::{CellBucket, Partitioner, Side};
use crate::types::{
    BoundingBox, Config, GeomId, JoinStats, MalformedPolicy, OverflowReport, SpatialItem,
};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Builder-style entry point for a spatial join.
///
/// A fresh builder is needed per invocation conceptually, but the builder
/// itself is reusable; every call to [`run`](Self::run) rebuilds the grid
/// and assignment from scratch.
///
/// # Examples
///
/// ```
/// use gridjoin::{BoundingBox, Config, SpatialItem, SpatialJoin};
///
/// let a = vec![SpatialItem::new(1, BoundingBox::new(0.0, 0.0, 2.0, 2.0))];
/// let b = vec![
///     SpatialItem::new(2, BoundingBox::new(1.0, 1.0, 3.0, 3.0)),
///     SpatialItem::new(3, BoundingBox::new(5.0, 5.0, 6.0, 6.0)),
/// ];
///
/// let config = Config::default()
///     .with_universe(BoundingBox::new(0.0, 0.0, 6.0, 6.0))
///     .with_partitions(3);
/// let pairs: Vec<_> = SpatialJoin::new().config(config).run(&a, &b)?.collect();
/// assert_eq!(pairs, vec![(1, 2)]);
/// # Ok::<(), gridjoin::JoinError>(())
/// ```
#[derive(Debug, Default)]
pub struct SpatialJoin {
    config: Config,
    cancel: Option<Arc<AtomicBool>>,
}

/// Partitioned state shared by the sequential and parallel drivers.
enum Prepared {
    /// Nothing to join; carries whatever was observed during setup.
    Empty {
        overflows: Vec<OverflowReport>,
        stats: JoinStats,
    },
    Ready {
        grid: Grid,
        buckets: Vec<(CellId, CellBucket)>,
        overflows: Vec<OverflowReport>,
        stats: JoinStats,
    },
}

impl SpatialJoin {
    /// Create a join with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Attach a cancellation token, checked between cells.
    ///
    /// Setting the flag abandons the join at the next cell boundary; a
    /// half-joined cell is not resumable.
    pub fn cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run the join, producing a lazy sequence of `(id_a, id_b)` pairs.
    ///
    /// The sequence is finite and not restartable; overflow reports and
    /// statistics ride alongside on the returned [`JoinResults`].
    ///
    /// # Errors
    ///
    /// [`JoinError::InvalidConfiguration`] for a bad config or grid,
    /// [`JoinError::MalformedBoundingBox`] under the default malformed
    /// policy, and [`JoinError::PartitionOverflow`] when
    /// `strict_capacity` is set and a cell overflows. All fatal errors
    /// surface here, before any pair is emitted.
    pub fn run(&self, a: &[SpatialItem], b: &[SpatialItem]) -> Result<JoinResults> {
        match self.prepare(a, b)? {
            Prepared::Empty { overflows, stats } => Ok(JoinResults {
                grid: None,
                cells: Vec::new().into_iter(),
                pending: Vec::new().into_iter(),
                overflows,
                stats,
                cancel: self.cancel.clone(),
            }),
            Prepared::Ready {
                grid,
                buckets,
                overflows,
                stats,
            } => Ok(JoinResults {
                grid: Some(grid),
                cells: buckets.into_iter(),
                pending: Vec::new().into_iter(),
                overflows,
                stats,
                cancel: self.cancel.clone(),
            }),
        }
    }

    /// Run the join with per-cell parallelism on the rayon pool.
    ///
    /// Produces the same multiset of pairs as [`run`](Self::run); only the
    /// output order differs. Cancellation skips cells not yet started.
    pub fn run_parallel(&self, a: &[SpatialItem], b: &[SpatialItem]) -> Result<JoinOutput> {
        let (grid, buckets, overflows, mut stats) = match self.prepare(a, b)? {
            Prepared::Empty { overflows, stats } => {
                return Ok(JoinOutput {
                    pairs: Vec::new(),
                    overflows,
                    stats,
                });
            }
            Prepared::Ready {
                grid,
                buckets,
                overflows,
                stats,
            } => (grid, buckets, overflows, stats),
        };

        let sink: Mutex<Vec<(GeomId, GeomId)>> = Mutex::new(Vec::new());
        let cell_stats: Mutex<JoinStats> = Mutex::new(JoinStats::new());
        let cancel = self.cancel.clone();

        buckets.into_par_iter().for_each(|(cell, bucket)| {
            if let Some(token) = &cancel {
                if token.load(Ordering::Relaxed) {
                    return;
                }
            }

            let candidates = join_cell(cell, &bucket);
            let mut kept: Vec<(GeomId, GeomId)> = candidates
                .iter()
                .filter(|pair| owns_pair(pair, &grid))
                .map(|pair| (pair.a.id, pair.b.id))
                .collect();

            cell_stats.lock().record_cell(candidates.len(), kept.len());
            sink.lock().append(&mut kept);
        });

        stats.merge(&cell_stats.into_inner());
        Ok(JoinOutput {
            pairs: sink.into_inner(),
            overflows,
            stats,
        })
    }

    /// Build the grid, partition both sides, and apply fatal policies.
    fn prepare(&self, a: &[SpatialItem], b: &[SpatialItem]) -> Result<Prepared> {
        self.config
            .validate()
            .map_err(JoinError::InvalidConfiguration)?;

        if a.is_empty() || b.is_empty() {
            return Ok(Prepared::Empty {
                overflows: Vec::new(),
                stats: JoinStats::new(),
            });
        }

        let universe = match self.config.universe {
            Some(universe) => universe,
            None => {
                let extent = BoundingBox::union_of(
                    a.iter()
                        .chain(b.iter())
                        .filter(|item| item.bbox.is_valid())
                        .map(|item| &item.bbox),
                );
                match extent {
                    Some(universe) => universe,
                    // Every input box is malformed
                    None => match self.config.malformed_policy {
                        MalformedPolicy::Fail => {
                            return Err(JoinError::MalformedBoundingBox { id: a[0].id });
                        }
                        MalformedPolicy::SkipAndReport => {
                            log::warn!("all input bounding boxes are malformed; empty join");
                            let stats = JoinStats {
                                malformed_skipped: a.len() + b.len(),
                                ..Default::default()
                            };
                            return Ok(Prepared::Empty {
                                overflows: Vec::new(),
                                stats,
                            });
                        }
                    },
                }
            }
        };

        // A degenerate extent only supports a single partition; respect an
        // explicit resolution (Grid::new rejects it) but adapt the
        // automatic one.
        let n = if universe.is_degenerate() && self.config.partitions_per_axis.is_none() {
            1
        } else {
            self.config.auto_partitions(a.len(), b.len())
        };
        let grid = Grid::new(universe, n)?;
        log::debug!(
            "joining |A| = {}, |B| = {} on a {n}x{n} grid over {:?}",
            a.len(),
            b.len(),
            grid.universe()
        );

        let mut partitioner = Partitioner::new(&grid, &self.config);
        partitioner.assign(Side::A, a)?;
        partitioner.assign(Side::B, b)?;

        let mut stats = JoinStats {
            assignments: partitioner.assignments(),
            replicated: partitioner.replicated(),
            malformed_skipped: partitioner.malformed_skipped(),
            ..Default::default()
        };

        let (buckets, overflows) = partitioner.finish();
        stats.cells_populated = buckets.len();
        stats.overflowed_cells = overflows.len();

        if self.config.strict_capacity {
            if let Some(report) = overflows.first() {
                return Err(JoinError::PartitionOverflow {
                    cell: report.cell,
                    observed: report.observed,
                    capacity: report.capacity,
                });
            }
        }

        Ok(Prepared::Ready {
            grid,
            buckets,
            overflows,
            stats,
        })
    }
}

/// Lazy stream of deduplicated join pairs.
///
/// Each call to `next` may run one cell-local join; the iterator is finite
/// and cannot be restarted. Statistics are complete only once the iterator
/// is exhausted.
#[derive(Debug)]
pub struct JoinResults {
    grid: Option<Grid>,
    cells: std::vec::IntoIter<(CellId, CellBucket)>,
    pending: std::vec::IntoIter<(GeomId, GeomId)>,
    overflows: Vec<OverflowReport>,
    stats: JoinStats,
    cancel: Option<Arc<AtomicBool>>,
}

impl JoinResults {
    /// Capacity overflow reports collected during partitioning.
    pub fn overflow_reports(&self) -> &[OverflowReport] {
        &self.overflows
    }

    /// Statistics observed so far.
    pub fn stats(&self) -> &JoinStats {
        &self.stats
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|token| token.load(Ordering::Relaxed))
    }
}

impl Iterator for JoinResults {
    type Item = (GeomId, GeomId);

    fn next(&mut self) -> Option<(GeomId, GeomId)> {
        loop {
            if let Some(pair) = self.pending.next() {
                return Some(pair);
            }
            if self.is_cancelled() {
                log::debug!("join cancelled; abandoning remaining cells");
                return None;
            }

            let (cell, bucket) = self.cells.next()?;
            let grid = self.grid.as_ref()?;
            let candidates = join_cell(cell, &bucket);
            let kept: Vec<(GeomId, GeomId)> = candidates
                .iter()
                .filter(|pair| owns_pair(pair, grid))
                .map(|pair| (pair.a.id, pair.b.id))
                .collect();
            self.stats.record_cell(candidates.len(), kept.len());
            self.pending = kept.into_iter();
        }
    }
}

/// Output of a parallel join: the full pair set plus side channels.
#[derive(Debug)]
pub struct JoinOutput {
    /// Deduplicated `(id_a, id_b)` pairs, in unspecified order.
    pub pairs: Vec<(GeomId, GeomId)>,
    /// Capacity overflow reports collected during partitioning.
    pub overflows: Vec<OverflowReport>,
    /// Statistics for the completed join.
    pub stats: JoinStats,
}
