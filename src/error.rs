//! Error types for the join engine.

use crate::grid::CellId;
use crate::types::GeomId;
use thiserror::Error;

/// Errors produced while configuring or running a spatial join.
///
/// Fatal conditions abort the join before any pair is emitted; there is no
/// partial output. Capacity overflows are recoverable and normally travel as
/// [`OverflowReport`](crate::types::OverflowReport)s alongside the result
/// stream, becoming a `PartitionOverflow` error only when
/// [`Config::strict_capacity`](crate::types::Config) is set.
#[derive(Debug, Error)]
pub enum JoinError {
    /// Rejected configuration: non-positive grid resolution, a degenerate
    /// universe with more than one partition per axis, or invalid settings.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input geometry carries a bounding box with `min > max` on some
    /// axis, or non-finite coordinates. Never silently joined.
    #[error("malformed bounding box for geometry {id}")]
    MalformedBoundingBox {
        /// Identifier of the offending geometry.
        id: GeomId,
    },

    /// A cell exceeded the configured capacity while `strict_capacity` was
    /// enabled.
    #[error("partition {cell} holds {observed} items, exceeding capacity {capacity}")]
    PartitionOverflow {
        /// The overflowing cell.
        cell: CellId,
        /// Total items (both sides) assigned to the cell.
        observed: usize,
        /// The configured advisory capacity.
        capacity: usize,
    },
}

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, JoinError>;
