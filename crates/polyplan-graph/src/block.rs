//! Block input records and validated blocks.

use polyplan_core::{MonomerType, VertexId};

/// Absolute tolerance on `contour_length / ds` being an integer.
pub const SEGMENT_TOLERANCE: f64 = 1e-6;

/// One block as supplied by the caller, before validation.
///
/// Vertex ids are signed so that negative ids can be reported rather
/// than silently wrapped.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockInput {
    /// Monomer species of the block.
    pub monomer_type: String,
    /// Contour length in units of the reference chain length.
    pub contour_length: f64,
    /// First endpoint.
    pub v: i64,
    /// Second endpoint.
    pub u: i64,
}

impl BlockInput {
    /// Convenience constructor.
    pub fn new(monomer_type: impl Into<String>, contour_length: f64, v: i64, u: i64) -> Self {
        Self {
            monomer_type: monomer_type.into(),
            contour_length,
            v,
            u,
        }
    }
}

/// A validated block.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Monomer species.
    pub monomer: MonomerType,
    /// Contour length as given.
    pub contour_length: f64,
    /// `round(contour_length / ds)`, always at least 1.
    pub n_segment: u32,
    /// First endpoint.
    pub v: VertexId,
    /// Second endpoint.
    pub u: VertexId,
}

impl Block {
    /// The endpoint opposite `vertex`, or `None` if `vertex` is not an
    /// endpoint of this block.
    pub fn other_end(&self, vertex: VertexId) -> Option<VertexId> {
        if vertex == self.v {
            Some(self.u)
        } else if vertex == self.u {
            Some(self.v)
        } else {
            None
        }
    }
}

/// Segment count for a contour length. Fails with the raw ratio when it
/// is not integral within [`SEGMENT_TOLERANCE`].
pub(crate) fn segment_count(contour_length: f64, ds: f64) -> Result<u32, f64> {
    let ratio = contour_length / ds;
    let rounded = ratio.round();
    if (rounded - ratio).abs() > SEGMENT_TOLERANCE || rounded > f64::from(u32::MAX) {
        return Err(ratio);
    }
    Ok(rounded as u32)
}
