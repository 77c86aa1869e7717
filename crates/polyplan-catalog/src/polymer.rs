//! One validated molecule with its canonical directed-edge keys.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use polyplan_core::{GraphError, MonomerType, PolymerId, SeedName, VertexId};
use polyplan_graph::{Block, BlockInput, PolymerGraph};
use polyplan_key::{DirectedEdge, KeyBuilder, PropagatorKey};

/// Caller-supplied description of one molecule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolymerInput {
    /// Volume fraction of this species in the mixture.
    pub volume_fraction: f64,
    /// Blocks, in any order.
    pub blocks: Vec<BlockInput>,
    /// Seed names attached to chain-end vertices.
    pub seeds: BTreeMap<i64, String>,
}

impl PolymerInput {
    /// A molecule with no seeds.
    pub fn new(volume_fraction: f64, blocks: Vec<BlockInput>) -> Self {
        Self {
            volume_fraction,
            blocks,
            seeds: BTreeMap::new(),
        }
    }

    /// Attach `seed` to chain end `vertex`.
    pub fn with_seed(mut self, vertex: i64, seed: impl Into<String>) -> Self {
        self.seeds.insert(vertex, seed.into());
        self
    }
}

/// A validated molecule.
///
/// Holds the block graph, the effective seeds and the canonical key of
/// every directed edge. Keys here are the plain keys before any sibling
/// aggregation; the catalog may serve a block through synthetic keys
/// instead.
#[derive(Clone, Debug)]
pub struct Polymer {
    id: PolymerId,
    volume_fraction: f64,
    graph: PolymerGraph,
    seeds: BTreeMap<VertexId, SeedName>,
    keys: IndexMap<DirectedEdge, PropagatorKey>,
}

impl Polymer {
    /// Validate `input` and derive its keys.
    ///
    /// A seed on a vertex that is not a chain end is ignored with a
    /// warning, since only chain ends start a propagator.
    ///
    /// # Errors
    ///
    /// Any [`GraphError`] from [`PolymerGraph::build`], plus
    /// `InvalidVolumeFraction`, `UnknownSeedVertex` and `InvalidName` for
    /// bad seeds.
    pub fn build(
        id: PolymerId,
        input: &PolymerInput,
        ds: f64,
        bond_lengths: &IndexMap<MonomerType, f64>,
    ) -> Result<Self, GraphError> {
        if !(input.volume_fraction.is_finite() && input.volume_fraction > 0.0) {
            return Err(GraphError::InvalidVolumeFraction {
                value: input.volume_fraction,
            });
        }
        let graph = PolymerGraph::build(&input.blocks, ds, bond_lengths)?;

        let mut seeds = BTreeMap::new();
        for (&raw, name) in &input.seeds {
            let vertex = u32::try_from(raw)
                .map(VertexId)
                .ok()
                .filter(|&v| graph.contains_vertex(v))
                .ok_or(GraphError::UnknownSeedVertex { vertex: raw })?;
            let seed = SeedName::new(name)?;
            if graph.is_chain_end(vertex) {
                seeds.insert(vertex, seed);
            } else {
                tracing::warn!(
                    polymer = %id,
                    vertex = %vertex,
                    seed = %seed,
                    "seed attached to a junction is ignored"
                );
            }
        }

        let keys = KeyBuilder::new(&graph, &seeds).all_keys();
        Ok(Self {
            id,
            volume_fraction: input.volume_fraction,
            graph,
            seeds,
            keys,
        })
    }

    /// Identifier assigned by the owning mixture.
    pub fn id(&self) -> PolymerId {
        self.id
    }

    /// Volume fraction.
    pub fn volume_fraction(&self) -> f64 {
        self.volume_fraction
    }

    /// Block graph.
    pub fn graph(&self) -> &PolymerGraph {
        &self.graph
    }

    /// Validated blocks in input order.
    pub fn blocks(&self) -> &[Block] {
        self.graph.blocks()
    }

    /// Block joining `v` and `u`, in either direction.
    pub fn block(&self, v: VertexId, u: VertexId) -> Option<&Block> {
        self.graph.block_between(v, u)
    }

    /// Total contour length relative to the reference chain.
    pub fn alpha(&self) -> f64 {
        self.graph.alpha()
    }

    /// Total segment count over all blocks.
    pub fn total_segments(&self) -> u64 {
        self.graph.total_segments()
    }

    /// Effective seeds: those attached to chain ends.
    pub fn seeds(&self) -> &BTreeMap<VertexId, SeedName> {
        &self.seeds
    }

    /// Canonical key of the propagator leaving `from` towards `to`.
    pub fn key(&self, from: VertexId, to: VertexId) -> Option<&PropagatorKey> {
        self.keys.get(&(from, to))
    }

    /// All directed-edge keys, in block order.
    pub fn keys(&self) -> &IndexMap<DirectedEdge, PropagatorKey> {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bonds() -> IndexMap<MonomerType, f64> {
        ["A", "B"]
            .into_iter()
            .map(|m| (MonomerType::new(m).unwrap(), 1.0))
            .collect()
    }

    fn diblock() -> PolymerInput {
        PolymerInput::new(
            1.0,
            vec![BlockInput::new("A", 0.5, 0, 1), BlockInput::new("B", 0.5, 1, 2)],
        )
    }

    #[test]
    fn diblock_has_four_keys() {
        let p = Polymer::build(PolymerId(0), &diblock(), 0.25, &bonds()).unwrap();
        assert_eq!(p.keys().len(), 4);
        assert_eq!(p.key(VertexId(0), VertexId(1)).unwrap().as_str(), "A");
        assert_eq!(p.key(VertexId(1), VertexId(0)).unwrap().as_str(), "(B2)A");
        assert_eq!(p.total_segments(), 4);
        assert!((p.alpha() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_volume_fraction() {
        let mut input = diblock();
        input.volume_fraction = 0.0;
        match Polymer::build(PolymerId(0), &input, 0.25, &bonds()) {
            Err(GraphError::InvalidVolumeFraction { .. }) => {}
            other => panic!("expected InvalidVolumeFraction, got {other:?}"),
        }
        input.volume_fraction = f64::NAN;
        assert!(Polymer::build(PolymerId(0), &input, 0.25, &bonds()).is_err());
    }

    #[test]
    fn seed_on_unknown_vertex_is_rejected() {
        let input = diblock().with_seed(7, "wall");
        match Polymer::build(PolymerId(0), &input, 0.25, &bonds()) {
            Err(GraphError::UnknownSeedVertex { vertex: 7 }) => {}
            other => panic!("expected UnknownSeedVertex, got {other:?}"),
        }
        let input = diblock().with_seed(-1, "wall");
        assert!(Polymer::build(PolymerId(0), &input, 0.25, &bonds()).is_err());
    }

    #[test]
    fn seed_with_delimiters_is_rejected() {
        let input = diblock().with_seed(0, "a,b");
        match Polymer::build(PolymerId(0), &input, 0.25, &bonds()) {
            Err(GraphError::InvalidName(_)) => {}
            other => panic!("expected InvalidName, got {other:?}"),
        }
    }

    #[test]
    fn seeds_on_chain_ends_change_keys() {
        let input = diblock().with_seed(0, "wall");
        let p = Polymer::build(PolymerId(0), &input, 0.25, &bonds()).unwrap();
        assert_eq!(p.key(VertexId(0), VertexId(1)).unwrap().as_str(), "{wall}A");
        assert_eq!(p.key(VertexId(1), VertexId(2)).unwrap().as_str(), "({wall}A2)B");
    }

    #[test]
    fn seeds_on_junctions_are_ignored() {
        let input = diblock().with_seed(1, "mid");
        let p = Polymer::build(PolymerId(0), &input, 0.25, &bonds()).unwrap();
        assert!(p.seeds().is_empty());
        assert_eq!(p.key(VertexId(0), VertexId(1)).unwrap().as_str(), "A");
    }
}
