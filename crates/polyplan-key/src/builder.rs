//! Per-molecule derivation of directed-edge keys.

use std::collections::{BTreeMap, HashMap, VecDeque};

use indexmap::IndexMap;
use polyplan_core::{SeedName, VertexId};
use polyplan_graph::PolymerGraph;
use smallvec::SmallVec;

use crate::key::{KeyChild, PropagatorKey};

/// A directed edge `(from, to)`: the propagator leaving `from` along the
/// block towards `to`.
pub type DirectedEdge = (VertexId, VertexId);

/// Derives and memoizes the key of every directed edge of one polymer.
///
/// The key of `(from, to)` is built from the keys of all other edges
/// arriving at `from`, each paired with its block's segment count. A
/// chain end has no such edges and becomes a leaf, seeded if the caller
/// attached a seed to that vertex.
///
/// Derivation is iterative, so deep chains do not grow the call stack.
/// The memo table lives and dies with the builder.
#[derive(Debug)]
pub struct KeyBuilder<'g> {
    graph: &'g PolymerGraph,
    seeds: &'g BTreeMap<VertexId, SeedName>,
    memo: HashMap<DirectedEdge, PropagatorKey>,
    overrides: HashMap<DirectedEdge, KeyChild>,
}

impl<'g> KeyBuilder<'g> {
    /// A builder with an empty memo table.
    pub fn new(graph: &'g PolymerGraph, seeds: &'g BTreeMap<VertexId, SeedName>) -> Self {
        Self {
            graph,
            seeds,
            memo: HashMap::with_capacity(graph.blocks().len() * 2),
            overrides: HashMap::new(),
        }
    }

    /// The graph keys are derived for.
    pub fn graph(&self) -> &'g PolymerGraph {
        self.graph
    }

    /// Key of the directed edge `(from, to)`, or `None` if no block joins
    /// the two vertices.
    pub fn key(&mut self, from: VertexId, to: VertexId) -> Option<PropagatorKey> {
        self.graph.block_index(from, to)?;
        let mut stack: Vec<DirectedEdge> = vec![(from, to)];
        while let Some(&(a, b)) = stack.last() {
            if self.memo.contains_key(&(a, b)) {
                stack.pop();
                continue;
            }
            let pending: SmallVec<[DirectedEdge; 4]> = self
                .graph
                .neighbors(a)
                .iter()
                .filter(|&&x| x != b)
                .map(|&x| (x, a))
                .filter(|e| !self.memo.contains_key(e) && !self.overrides.contains_key(e))
                .collect();
            if pending.is_empty() {
                let key = self.assemble(a, b)?;
                self.memo.insert((a, b), key);
                stack.pop();
            } else {
                stack.extend(pending);
            }
        }
        self.memo.get(&(from, to)).cloned()
    }

    /// Keys of every directed edge, in block order (`v→u` then `u→v`).
    pub fn all_keys(&mut self) -> IndexMap<DirectedEdge, PropagatorKey> {
        let graph = self.graph;
        graph
            .directed_edges()
            .filter_map(|(from, to)| Some(((from, to), self.key(from, to)?)))
            .collect()
    }

    /// The value arriving at `to` from `from`, as a child of downstream
    /// keys: the override if one is set, else the memoized key paired
    /// with the block's segment count.
    pub fn incoming(&mut self, from: VertexId, to: VertexId) -> Option<KeyChild> {
        if let Some(child) = self.overrides.get(&(from, to)) {
            return Some(child.clone());
        }
        let n_segment = self.graph.block_between(from, to)?.n_segment;
        Some(KeyChild::new(self.key(from, to)?, n_segment))
    }

    /// Replace the value arriving at `to` from `from` with `child`.
    ///
    /// Every memoized key downstream of that arrival (leaving `to` away
    /// from `from`, and so on outward) is forgotten. Returns those
    /// directed edges in breadth-first order, nearest first.
    pub fn override_incoming(
        &mut self,
        from: VertexId,
        to: VertexId,
        child: KeyChild,
    ) -> Vec<DirectedEdge> {
        self.overrides.insert((from, to), child);
        let mut invalidated = Vec::new();
        let mut queue = VecDeque::from([(from, to)]);
        while let Some((prev, at)) = queue.pop_front() {
            for &next in self.graph.neighbors(at) {
                if next == prev {
                    continue;
                }
                self.memo.remove(&(at, next));
                invalidated.push((at, next));
                queue.push_back((at, next));
            }
        }
        invalidated
    }

    fn assemble(&self, from: VertexId, to: VertexId) -> Option<PropagatorKey> {
        let block = self.graph.block_between(from, to)?;
        let mut children = Vec::with_capacity(self.graph.degree(from).saturating_sub(1));
        for &x in self.graph.neighbors(from) {
            if x == to {
                continue;
            }
            let child = match self.overrides.get(&(x, from)) {
                Some(child) => child.clone(),
                None => KeyChild::new(
                    self.memo.get(&(x, from))?.clone(),
                    self.graph.block_between(x, from)?.n_segment,
                ),
            };
            children.push(child);
        }
        if children.is_empty() {
            let seed = self.seeds.get(&from).cloned();
            return Some(PropagatorKey::leaf(block.monomer.clone(), seed));
        }
        Some(PropagatorKey::branch(block.monomer.clone(), children))
    }
}
