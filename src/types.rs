//! Core types and configuration for gridjoin
//!
//! This module provides the bounding-box geometry the join operates on and
//! the serializable configuration controlling grid resolution, cell
//! capacity, and error policy.

use geo::Rect;
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Opaque identifier for an input geometry.
///
/// The engine never inspects geometry payloads; callers map ids back to
/// their records after the join.
pub type GeomId = u64;

/// A 2D axis-aligned bounding box.
///
/// Stores the raw corner coordinates rather than a normalized `geo::Rect`
/// so that malformed input (`min > max`) can be detected and reported
/// instead of being silently reordered. Conversions to and from
/// [`geo::Rect`] are provided for interop with the `geo` ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x coordinate
    pub min_x: f64,
    /// Minimum y coordinate
    pub min_y: f64,
    /// Maximum x coordinate
    pub max_x: f64,
    /// Maximum y coordinate
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from minimum and maximum coordinates.
    ///
    /// No validation is performed here; see [`BoundingBox::is_valid`].
    ///
    /// # Examples
    ///
    /// ```
    /// use gridjoin::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
    /// assert_eq!(bbox.width(), 2.0);
    /// ```
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a bounding box from a `geo::Rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Convert to a `geo::Rect`. Only meaningful for valid boxes.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            geo::coord! { x: self.min_x, y: self.min_y },
            geo::coord! { x: self.max_x, y: self.max_y },
        )
    }

    /// Check that all coordinates are finite and `min <= max` on both axes.
    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// True when the box has zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }

    /// Check whether two boxes overlap, boundaries included.
    ///
    /// Boxes that merely touch along an edge or corner count as
    /// intersecting, matching the candidate-pair semantics of the join.
    ///
    /// # Examples
    ///
    /// ```
    /// use gridjoin::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
    /// let b = BoundingBox::new(1.0, 1.0, 3.0, 3.0);
    /// let c = BoundingBox::new(5.0, 5.0, 6.0, 6.0);
    ///
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&c));
    /// ```
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Compute the intersection rectangle of two boxes, if any.
    ///
    /// The result may be degenerate (zero width or height) when the boxes
    /// only touch.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        ))
    }

    /// Compute the smallest box covering both inputs.
    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Compute the union extent of a collection of boxes.
    ///
    /// Returns `None` for an empty iterator.
    pub fn union_of<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<Self>, bbox| match acc {
                Some(u) => Some(u.union(bbox)),
                None => Some(*bbox),
            })
    }
}

/// An input record: an opaque geometry identifier plus its bounding box.
///
/// The join operates purely on bounding boxes; payload retrieval is a
/// caller concern after the join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialItem {
    /// Caller-assigned identifier.
    pub id: GeomId,
    /// Bounding box of the geometry, computed upstream.
    pub bbox: BoundingBox,
}

impl SpatialItem {
    /// Create a new spatial item.
    pub fn new(id: GeomId, bbox: BoundingBox) -> Self {
        Self { id, bbox }
    }
}

/// Policy for input records whose bounding boxes fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Abort the whole join on the first malformed box (default).
    #[default]
    Fail,
    /// Skip malformed records, log a warning, and count them in the stats.
    SkipAndReport,
}

/// Join engine configuration
///
/// Designed to be easily serializable and loadable from JSON while keeping
/// complexity minimal.
///
/// # Example
///
/// ```rust
/// use gridjoin::Config;
///
/// // Create default config
/// let config = Config::default();
///
/// // Load from JSON
/// let json = r#"{
///     "partitions_per_axis": 8,
///     "cell_capacity": 500,
///     "malformed_policy": "skip_and_report"
/// }"#;
/// let config: Config = Config::from_json(json).unwrap();
/// assert_eq!(config.partitions_per_axis, Some(8));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Grid partitions per row/column. `None` picks
    /// `ceil(sqrt(max(|A|, |B|) / cell_capacity))` so the expected
    /// population per cell stays near `cell_capacity`.
    #[serde(default)]
    pub partitions_per_axis: Option<usize>,

    /// Advisory maximum number of items per cell (both sides combined).
    /// Exceeding it is reported, not fatal, unless `strict_capacity` is set.
    #[serde(default = "Config::default_cell_capacity")]
    pub cell_capacity: usize,

    /// Explicit bounding region to grid. `None` computes the union extent
    /// of both input datasets.
    #[serde(default)]
    pub universe: Option<BoundingBox>,

    /// Treat a capacity overflow as a fatal error instead of a report.
    #[serde(default)]
    pub strict_capacity: bool,

    /// What to do with malformed bounding boxes.
    #[serde(default)]
    pub malformed_policy: MalformedPolicy,
}

impl Config {
    const fn default_cell_capacity() -> usize {
        1000
    }

    /// Set an explicit grid resolution.
    pub fn with_partitions(mut self, n: usize) -> Self {
        self.partitions_per_axis = Some(n);
        self
    }

    /// Set the advisory per-cell capacity.
    pub fn with_cell_capacity(mut self, capacity: usize) -> Self {
        self.cell_capacity = capacity;
        self
    }

    /// Supply an explicit universe instead of computing the union extent.
    pub fn with_universe(mut self, universe: BoundingBox) -> Self {
        self.universe = Some(universe);
        self
    }

    /// Fail the join when any cell exceeds the configured capacity.
    pub fn with_strict_capacity(mut self) -> Self {
        self.strict_capacity = true;
        self
    }

    /// Set the malformed-input policy.
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    /// Grid resolution for the given dataset sizes when none is configured.
    pub fn auto_partitions(&self, len_a: usize, len_b: usize) -> usize {
        if let Some(n) = self.partitions_per_axis {
            return n;
        }
        let largest = len_a.max(len_b);
        let n = ((largest as f64 / self.cell_capacity as f64).sqrt()).ceil() as usize;
        n.max(1)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.partitions_per_axis == Some(0) {
            return Err("partitions_per_axis must be at least 1".to_string());
        }

        if self.cell_capacity == 0 {
            return Err("cell_capacity must be greater than zero".to_string());
        }

        if let Some(universe) = &self.universe {
            if !universe.is_valid() {
                return Err("universe bounding box is malformed".to_string());
            }
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partitions_per_axis: None,
            cell_capacity: Self::default_cell_capacity(),
            universe: None,
            strict_capacity: false,
            malformed_policy: MalformedPolicy::default(),
        }
    }
}

/// Report emitted when a cell's population exceeds the configured capacity.
///
/// Overflow violates the performance assumption of the partitioning, not
/// correctness; the join proceeds and remains exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowReport {
    /// The overflowing cell.
    pub cell: crate::grid::CellId,
    /// Total items (A-side + B-side) assigned to the cell.
    pub observed: usize,
    /// The configured advisory capacity.
    pub capacity: usize,
}

/// Counters describing a completed (or in-progress) join.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinStats {
    /// Number of grid cells holding at least one item.
    pub cells_populated: usize,
    /// Total bucket insertions across all cells, counting replicas.
    pub assignments: usize,
    /// Extra copies created by cross-boundary replication.
    pub replicated: usize,
    /// Candidate pairs that passed the full 2D overlap test in some cell.
    pub candidate_pairs: usize,
    /// Pairs surviving deduplication.
    pub pairs_emitted: usize,
    /// Candidate pairs suppressed by the reference-corner rule.
    pub pairs_suppressed: usize,
    /// Cells whose population exceeded the configured capacity.
    pub overflowed_cells: usize,
    /// Malformed records skipped under `MalformedPolicy::SkipAndReport`.
    pub malformed_skipped: usize,
}

impl JoinStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one cell-local join.
    pub fn record_cell(&mut self, candidates: usize, emitted: usize) {
        self.candidate_pairs += candidates;
        self.pairs_emitted += emitted;
        self.pairs_suppressed += candidates - emitted;
    }

    /// Merge counters from another stats instance.
    pub fn merge(&mut self, other: &Self) {
        self.cells_populated += other.cells_populated;
        self.assignments += other.assignments;
        self.replicated += other.replicated;
        self.candidate_pairs += other.candidate_pairs;
        self.pairs_emitted += other.pairs_emitted;
        self.pairs_suppressed += other.pairs_suppressed;
        self.overflowed_cells += other.overflowed_cells;
        self.malformed_skipped += other.malformed_skipped;
    }
}
