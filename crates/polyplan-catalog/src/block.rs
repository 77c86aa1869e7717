//! Essential blocks: how the solver evaluates each physical block.

use std::ops::Range;

use polyplan_core::{MonomerType, PolymerId, VertexId};
use polyplan_key::PropagatorKey;

/// Identifies an essential block: the pair of propagators whose product
/// integrates to the concentration of one or more physical blocks.
///
/// `dep_v` outranks `dep_u`: it is never deeper, and at equal height it
/// is the lesser under [`PropagatorKey`]'s order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    /// Owning polymer.
    pub polymer: PolymerId,
    /// Propagator arriving from the `v` side.
    pub dep_v: PropagatorKey,
    /// Propagator arriving from the `u` side.
    pub dep_u: PropagatorKey,
}

/// One essential block.
///
/// `dep_u` is evaluated for `n_segment_allocated` segments starting at
/// `n_segment_offset` of the longest served block, whose length is
/// `n_segment_original`. Served blocks shorter than that are aligned at
/// their far end; see [`ComputationBlock::local_range`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputationBlock {
    /// Monomer type of the served blocks.
    pub monomer: MonomerType,
    /// Segments of `dep_u` this slice covers.
    pub n_segment_allocated: u32,
    /// Where the slice starts along the longest served block.
    pub n_segment_offset: u32,
    /// Length of the longest served block.
    pub n_segment_original: u32,
    /// How many times the slice's concentration is counted.
    pub n_repeated: u32,
    /// Physical blocks served, as `(v, u)` with `dep_v` leaving `v`.
    pub edges: Vec<(VertexId, VertexId)>,
}

impl ComputationBlock {
    /// The segment range this slice covers on a served block of
    /// `n_segment` segments, or `None` if that block is too short to hold
    /// the slice.
    pub fn local_range(&self, n_segment: u32) -> Option<Range<u32>> {
        let shift = self.n_segment_original.checked_sub(n_segment)?;
        let start = self.n_segment_offset.checked_sub(shift)?;
        let end = start.checked_add(self.n_segment_allocated)?;
        (end <= n_segment).then_some(start..end)
    }

    /// Whether the slice reaches the far end of its served blocks.
    pub fn is_complete(&self) -> bool {
        self.n_segment_offset + self.n_segment_allocated == self.n_segment_original
    }
}
