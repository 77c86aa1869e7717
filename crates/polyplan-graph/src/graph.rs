//! Construction and validation of [`PolymerGraph`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use polyplan_core::{GraphError, MonomerType, VertexId};
use smallvec::SmallVec;

use crate::block::{segment_count, Block, BlockInput};

/// Neighbour list of one vertex, in block input order.
pub type Neighbors = SmallVec<[VertexId; 4]>;

/// A validated polymer: blocks forming a single tree.
///
/// Every block has at least one segment, every vertex is reachable from
/// the first block's `v`, and there are no cycles, self-loops or
/// duplicate edges.
#[derive(Clone, Debug)]
pub struct PolymerGraph {
    blocks: Vec<Block>,
    adjacency: BTreeMap<VertexId, Neighbors>,
    edges: HashMap<(VertexId, VertexId), usize>,
}

impl PolymerGraph {
    /// Validate `inputs` and build the graph.
    ///
    /// `bond_lengths` is the table of known monomer types; a block whose
    /// type is not a key of the table is rejected.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] found. Per-block checks (contour
    /// length, segment count, monomer type) run before vertex checks,
    /// which run before the cycle and connectivity search.
    pub fn build(
        inputs: &[BlockInput],
        ds: f64,
        bond_lengths: &IndexMap<MonomerType, f64>,
    ) -> Result<Self, GraphError> {
        if inputs.is_empty() {
            return Err(GraphError::EmptyPolymer);
        }

        // 1. Per-block lengths and monomer types.
        let mut specs = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.iter().enumerate() {
            if !(input.contour_length.is_finite() && input.contour_length > 0.0) {
                return Err(GraphError::NonPositiveContourLength {
                    block: i,
                    contour_length: input.contour_length,
                });
            }
            let n_segment = segment_count(input.contour_length, ds).map_err(|ratio| {
                GraphError::NonIntegralSegments {
                    block: i,
                    contour_length: input.contour_length,
                    ds,
                    ratio,
                }
            })?;
            if n_segment == 0 {
                return Err(GraphError::ZeroSegments {
                    block: i,
                    contour_length: input.contour_length,
                });
            }
            let Some((monomer, _)) = bond_lengths.get_key_value(input.monomer_type.as_str())
            else {
                return Err(GraphError::UnknownMonomerType {
                    block: i,
                    monomer: input.monomer_type.clone(),
                });
            };
            specs.push((monomer.clone(), n_segment));
        }

        // 2. Vertex ids.
        let mut blocks = Vec::with_capacity(inputs.len());
        for (i, (input, (monomer, n_segment))) in inputs.iter().zip(specs).enumerate() {
            let v = vertex_id(i, input.v)?;
            let u = vertex_id(i, input.u)?;
            if v == u {
                return Err(GraphError::SelfLoop { block: i, vertex: v });
            }
            blocks.push(Block {
                monomer,
                contour_length: input.contour_length,
                n_segment,
                v,
                u,
            });
        }

        // 3. Duplicate edges and adjacency.
        let mut edges = HashMap::with_capacity(blocks.len() * 2);
        let mut adjacency: BTreeMap<VertexId, Neighbors> = BTreeMap::new();
        for (i, block) in blocks.iter().enumerate() {
            if edges.insert((block.v, block.u), i).is_some() {
                return Err(GraphError::DuplicateEdge {
                    v: block.v,
                    u: block.u,
                });
            }
            edges.insert((block.u, block.v), i);
            adjacency.entry(block.v).or_default().push(block.u);
            adjacency.entry(block.u).or_default().push(block.v);
        }

        // 4. Depth-first search from the first vertex.
        let root = blocks[0].v;
        let mut visited = BTreeSet::from([root]);
        let mut stack: Vec<(VertexId, Option<VertexId>)> = vec![(root, None)];
        while let Some((current, parent)) = stack.pop() {
            for &next in adjacency.get(&current).into_iter().flatten() {
                if Some(next) == parent {
                    continue;
                }
                if !visited.insert(next) {
                    return Err(GraphError::Cycle {
                        v: current,
                        u: next,
                    });
                }
                stack.push((next, Some(current)));
            }
        }

        // 5. Everything must be reachable.
        let unreachable: Vec<VertexId> = adjacency
            .keys()
            .filter(|v| !visited.contains(v))
            .copied()
            .collect();
        if !unreachable.is_empty() {
            return Err(GraphError::Disconnected {
                vertices: unreachable,
            });
        }

        tracing::debug!(
            blocks = blocks.len(),
            vertices = adjacency.len(),
            "polymer graph validated"
        );

        Ok(Self {
            blocks,
            adjacency,
            edges,
        })
    }

    /// All blocks in input order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Block at `index` in input order.
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Input index of the block joining `v` and `u`, in either order.
    pub fn block_index(&self, v: VertexId, u: VertexId) -> Option<usize> {
        self.edges.get(&(v, u)).copied()
    }

    /// The block joining `v` and `u`, in either order.
    pub fn block_between(&self, v: VertexId, u: VertexId) -> Option<&Block> {
        self.block_index(v, u).map(|i| &self.blocks[i])
    }

    /// Neighbours of `vertex`, in block input order. Empty for unknown
    /// vertices.
    pub fn neighbors(&self, vertex: VertexId) -> &[VertexId] {
        self.adjacency
            .get(&vertex)
            .map(|n| n.as_slice())
            .unwrap_or(&[])
    }

    /// Number of blocks meeting at `vertex`.
    pub fn degree(&self, vertex: VertexId) -> usize {
        self.neighbors(vertex).len()
    }

    /// Whether `vertex` is a chain end (exactly one block).
    pub fn is_chain_end(&self, vertex: VertexId) -> bool {
        self.degree(vertex) == 1
    }

    /// Whether `vertex` appears in any block.
    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.adjacency.contains_key(&vertex)
    }

    /// All vertices, ascending.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Every block in both directions, as `(from, to)` pairs.
    pub fn directed_edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.blocks
            .iter()
            .flat_map(|b| [(b.v, b.u), (b.u, b.v)])
    }

    /// Sum of block contour lengths, relative to the reference chain.
    pub fn alpha(&self) -> f64 {
        self.blocks.iter().map(|b| b.contour_length).sum()
    }

    /// Sum of block segment counts.
    pub fn total_segments(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.n_segment)).sum()
    }
}

fn vertex_id(block: usize, raw: i64) -> Result<VertexId, GraphError> {
    if raw < 0 {
        return Err(GraphError::NegativeVertex { block, vertex: raw });
    }
    u32::try_from(raw)
        .map(VertexId)
        .map_err(|_| GraphError::VertexOutOfRange { block, vertex: raw })
}
