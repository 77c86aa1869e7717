//! Error types for the polyplan workspace, organized by subsystem:
//! names, graph validation, key parsing, catalog construction,
//! scheduling, plan dispatch, and configuration.
//!
//! Graph and configuration errors are caller mistakes reported with the
//! offending block or value. Catalog and schedule errors signal a broken
//! internal invariant; they always name the key involved.

use crate::id::{PolymerId, StreamId, VertexId};

/// A monomer-type or seed name failed validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// Monomer names must be non-empty ASCII letters or `_`.
    #[error("invalid monomer type '{0}': use ASCII letters or '_' only")]
    MonomerType(String),
    /// Seed names must be non-empty and free of key delimiters.
    #[error("invalid seed name '{0}': must be non-empty without ()[]{{}},:")]
    Seed(String),
}

// ── Graph validation ────────────────────────────────────────────

/// Fatal errors raised while validating one polymer's blocks.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The polymer has no blocks.
    #[error("polymer has no blocks")]
    EmptyPolymer,
    /// A block's contour length is zero, negative, or not finite.
    #[error("block {block}: contour length {contour_length} must be positive")]
    NonPositiveContourLength {
        /// Index of the block in the input list.
        block: usize,
        /// The rejected contour length.
        contour_length: f64,
    },
    /// `contour_length / ds` is not an integer within tolerance.
    #[error("block {block}: contour length {contour_length} is not a multiple of ds = {ds} (ratio {ratio})")]
    NonIntegralSegments {
        /// Index of the block in the input list.
        block: usize,
        /// The block's contour length.
        contour_length: f64,
        /// The contour step.
        ds: f64,
        /// The computed ratio `contour_length / ds`.
        ratio: f64,
    },
    /// The block rounds to zero segments.
    #[error("block {block}: contour length {contour_length} is shorter than one segment")]
    ZeroSegments {
        /// Index of the block in the input list.
        block: usize,
        /// The block's contour length.
        contour_length: f64,
    },
    /// The block's monomer type has no bond length.
    #[error("block {block}: unknown monomer type '{monomer}'")]
    UnknownMonomerType {
        /// Index of the block in the input list.
        block: usize,
        /// The unknown name.
        monomer: String,
    },
    /// Two blocks join the same pair of vertices.
    #[error("duplicate edge between vertices {v} and {u}")]
    DuplicateEdge {
        /// First endpoint.
        v: VertexId,
        /// Second endpoint.
        u: VertexId,
    },
    /// A block starts and ends at the same vertex.
    #[error("block {block}: self-loop at vertex {vertex}")]
    SelfLoop {
        /// Index of the block in the input list.
        block: usize,
        /// The repeated vertex.
        vertex: VertexId,
    },
    /// A vertex id is negative.
    #[error("block {block}: negative vertex id {vertex}")]
    NegativeVertex {
        /// Index of the block in the input list.
        block: usize,
        /// The rejected id.
        vertex: i64,
    },
    /// A vertex id does not fit the vertex id range.
    #[error("block {block}: vertex id {vertex} is out of range")]
    VertexOutOfRange {
        /// Index of the block in the input list.
        block: usize,
        /// The rejected id.
        vertex: i64,
    },
    /// Depth-first search revisited a vertex through a non-parent edge.
    #[error("polymer graph contains a cycle through edge {v}-{u}")]
    Cycle {
        /// Vertex being expanded when the cycle was found.
        v: VertexId,
        /// Already-visited neighbour that closes the cycle.
        u: VertexId,
    },
    /// Some vertices are not reachable from the first vertex.
    #[error("polymer graph is disconnected; unreachable vertices: {vertices:?}")]
    Disconnected {
        /// All unreachable vertices, ascending.
        vertices: Vec<VertexId>,
    },
    /// A seed was given for a vertex that does not appear in any block.
    #[error("seed attached to vertex {vertex}, which is not part of the polymer")]
    UnknownSeedVertex {
        /// The vertex named by the seed map.
        vertex: i64,
    },
    /// The volume fraction is not a finite positive number.
    #[error("volume fraction {value} must be positive and finite")]
    InvalidVolumeFraction {
        /// The rejected value.
        value: f64,
    },
    /// A monomer or seed name is malformed.
    #[error(transparent)]
    InvalidName(#[from] NameError),
}

// ── Key text ────────────────────────────────────────────────────

/// Errors from parsing propagator key text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The key text is empty.
    #[error("empty propagator key")]
    Empty,
    /// An opening bracket has no matching closing bracket, or vice versa.
    #[error("unbalanced brackets in key '{key}' at byte {position}")]
    Unbalanced {
        /// The full key text.
        key: String,
        /// Byte offset of the problem.
        position: usize,
    },
    /// A child key is not followed by its segment count.
    #[error("missing segment count in key '{key}' at byte {position}")]
    MissingSegmentCount {
        /// The full key text.
        key: String,
        /// Byte offset where digits were expected.
        position: usize,
    },
    /// A segment or repeat count does not fit in `u32` or is zero where a
    /// positive value is required.
    #[error("invalid count in key '{key}' at byte {position}")]
    InvalidCount {
        /// The full key text.
        key: String,
        /// Byte offset of the count.
        position: usize,
    },
    /// An unexpected character appeared.
    #[error("unexpected '{found}' in key '{key}' at byte {position}")]
    UnexpectedCharacter {
        /// The full key text.
        key: String,
        /// Byte offset of the character.
        position: usize,
        /// The character found.
        found: char,
    },
    /// A bracket group with no children, e.g. `()A`.
    #[error("empty child list in key '{key}' at byte {position}")]
    EmptyChildren {
        /// The full key text.
        key: String,
        /// Byte offset of the opening bracket.
        position: usize,
    },
    /// The trailing monomer type or an embedded seed is malformed.
    #[error(transparent)]
    InvalidName(#[from] NameError),
}

// ── Catalog invariants ──────────────────────────────────────────

/// Internal invariant violations detected while building the catalog.
///
/// These indicate a construction bug rather than bad input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// A node depends on a key that is missing from the catalog or is
    /// registered with fewer segments than required.
    #[error("catalog miss: '{key}' needs '{dependency}' at {required} segments (available: {available:?})")]
    MissingDependency {
        /// The dependent key.
        key: String,
        /// The missing or short dependency.
        dependency: String,
        /// Segments the dependent key reads.
        required: u32,
        /// Segments registered for the dependency, if present.
        available: Option<u32>,
    },
    /// The slices serving a block do not tile its segment range.
    #[error("polymer {polymer}: slices of block {v}-{u} do not tile [0, {n_segment}): {detail}")]
    CoverageGap {
        /// Polymer owning the block.
        polymer: PolymerId,
        /// First endpoint.
        v: VertexId,
        /// Second endpoint.
        u: VertexId,
        /// The block's segment count.
        n_segment: u32,
        /// Description of the first gap or overlap.
        detail: String,
    },
    /// Re-keying tried to move a block into a sibling group that was
    /// already finalized.
    #[error("re-keying reached finalized group '{key}'")]
    FinalizedGroup {
        /// Left key of the finalized group.
        key: String,
    },
    /// Two aggregation passes produced the same synthetic key.
    #[error("synthetic key '{key}' produced twice in one group")]
    DuplicateAggregate {
        /// The repeated synthetic key.
        key: String,
    },
    /// A block lookup named an edge absent from the polymer.
    #[error("no block joins vertices {v} and {u}")]
    UnknownEdge {
        /// First endpoint.
        v: VertexId,
        /// Second endpoint.
        u: VertexId,
    },
    /// Key construction produced malformed text.
    #[error(transparent)]
    Key(#[from] KeyError),
}

// ── Scheduling ──────────────────────────────────────────────────

/// Errors from building or checking an execution plan.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// At least one stream is required.
    #[error("schedule needs at least one stream")]
    NoStreams,
    /// A dependency had no recorded finish time when its dependent was
    /// scheduled.
    #[error("'{key}' depends on '{dependency}', which has not been scheduled")]
    MissingDependency {
        /// The node being scheduled.
        key: String,
        /// The unscheduled dependency.
        dependency: String,
    },
    /// A plan violates the ordering contract.
    #[error("infeasible plan at '{key}': {reason}")]
    Infeasible {
        /// The node whose placement is invalid.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

// ── Dispatch ────────────────────────────────────────────────────

/// Errors from driving a plan across worker threads.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The caller's stepper rejected a job.
    #[error("stream {stream} failed on '{key}': {reason}")]
    StepFailed {
        /// Stream that ran the job.
        stream: StreamId,
        /// The node being advanced.
        key: String,
        /// Reason reported by the stepper.
        reason: String,
    },
    /// A worker thread exited before the plan finished.
    #[error("worker for stream {stream} disconnected")]
    WorkerLost {
        /// The stream whose worker vanished.
        stream: StreamId,
    },
}

// ── Configuration ───────────────────────────────────────────────

/// Invalid mixture configuration.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The contour step is not a finite positive number.
    #[error("ds = {value} must be positive and finite")]
    InvalidDs {
        /// The rejected step.
        value: f64,
    },
    /// A bond length is not a finite positive number.
    #[error("bond length {value} for monomer '{monomer}' must be positive and finite")]
    InvalidBondLength {
        /// The monomer type.
        monomer: String,
        /// The rejected length.
        value: f64,
    },
    /// No monomer types were configured.
    #[error("bond length table is empty")]
    NoMonomerTypes,
    /// The chain model name is not recognised.
    #[error("'{name}' is not a chain model; use 'continuous' or 'discrete'")]
    UnknownChainModel {
        /// The rejected name.
        name: String,
    },
    /// The default stream count is zero.
    #[error("n_streams must be at least 1")]
    NoStreams,
}
