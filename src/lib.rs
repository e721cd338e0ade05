//! Partition-based spatial-merge (PBSM) join engine for large geometry datasets.
//!
//! Grids the covered space, buckets both inputs per cell (replicating
//! boundary-straddling boxes), joins each cell locally with an x-axis
//! sort-merge sweep, and suppresses cross-boundary duplicates with a
//! reference-corner rule.
//!
//! ```rust
//! use gridjoin::{BoundingBox, SpatialItem, SpatialJoin};
//!
//! let a = vec![SpatialItem::new(1, BoundingBox::new(0.0, 0.0, 2.0, 2.0))];
//! let b = vec![SpatialItem::new(2, BoundingBox::new(1.0, 1.0, 3.0, 3.0))];
//!
//! let pairs: Vec<_> = SpatialJoin::new().run(&a, &b)?.collect();
//! assert_eq!(pairs, vec![(1, 2)]);
//! # Ok::<(), gridjoin::JoinError>(())
//! ```

pub mod cell_join;
pub mod dedup;
pub mod error;
pub mod grid;
pub mod join;
pub mod partition;
pub mod types;

pub use error::{JoinError, Result};

pub use types::{
    BoundingBox, Config, GeomId, JoinStats, MalformedPolicy, OverflowReport, SpatialItem,
};

pub use grid::{CellId, CellRange, Grid};

pub use partition::{CellBucket, Partitioner, Side};

pub use cell_join::{CandidatePair, join_cell, nested_loop_join};

pub use dedup::is_owning_cell;

pub use join::{JoinOutput, JoinResults, SpatialJoin};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{BoundingBox, Config, GeomId, SpatialItem};

    pub use crate::{JoinError, Result};

    pub use crate::{JoinOutput, JoinResults, SpatialJoin};

    pub use crate::{JoinStats, MalformedPolicy, OverflowReport};
}
