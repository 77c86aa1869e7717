//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a vertex (chain end or junction) within one polymer graph.
///
/// Vertex ids are supplied by the caller; validation rejects negative
/// values before they are wrapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VertexId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a polymer species within a mixture.
///
/// Polymers are numbered in the order they are added; `PolymerId(n)`
/// is the n-th successfully added polymer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolymerId(pub u32);

impl fmt::Display for PolymerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PolymerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a logical execution stream in a schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Position of this stream in per-stream vectors.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_as_bare_numbers() {
        assert_eq!(VertexId(7).to_string(), "7");
        assert_eq!(PolymerId(0).to_string(), "0");
        assert_eq!(StreamId(3).to_string(), "3");
    }

    #[test]
    fn stream_index_matches_raw_value() {
        assert_eq!(StreamId::from(5).index(), 5);
    }
}
