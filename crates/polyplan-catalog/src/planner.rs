//! Per-polymer planning: file every block under its `dep_v` key, then
//! aggregate sibling groups and re-key what the aggregates feed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use polyplan_core::{CatalogError, VertexId};
use polyplan_key::{DirectedEdge, KeyBuilder, KeyChild, PropagatorKey};

use crate::block::{BlockKey, ComputationBlock};
use crate::catalog::PlanOptions;
use crate::polymer::Polymer;
use crate::superpose::{self, Entry, Feed, Group, ServedEdge};

/// Undirected block identity.
type Pair = (VertexId, VertexId);

fn pair(a: VertexId, b: VertexId) -> Pair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Working state for one polymer.
struct Planner<'p> {
    polymer: &'p Polymer,
    builder: KeyBuilder<'p>,
    /// Pending groups by `dep_v`.
    groups: BTreeMap<PropagatorKey, Group>,
    /// Groups already aggregated.
    finalized: BTreeMap<PropagatorKey, Group>,
    /// Where each pending block is filed: `(dep_v, dep_u)`.
    slots: HashMap<Pair, (PropagatorKey, PropagatorKey)>,
}

/// Essential blocks of `polymer`.
pub(crate) fn plan_polymer(
    polymer: &Polymer,
    options: PlanOptions,
) -> Result<BTreeMap<BlockKey, ComputationBlock>, CatalogError> {
    let mut planner = Planner {
        polymer,
        builder: KeyBuilder::new(polymer.graph(), polymer.seeds()),
        groups: BTreeMap::new(),
        finalized: BTreeMap::new(),
        slots: HashMap::new(),
    };
    planner.file_all()?;
    if options.aggregate {
        planner.aggregate(options)?;
    }
    Ok(planner.into_blocks())
}

impl Planner<'_> {
    fn directed_keys(
        &mut self,
        v: VertexId,
        u: VertexId,
    ) -> Result<(PropagatorKey, PropagatorKey), CatalogError> {
        let missing = CatalogError::UnknownEdge { v, u };
        let forward = self.builder.key(v, u).ok_or(missing.clone())?;
        let backward = self.builder.key(u, v).ok_or(missing)?;
        Ok((forward, backward))
    }

    fn file_all(&mut self) -> Result<(), CatalogError> {
        let polymer = self.polymer;
        for block in polymer.blocks() {
            let (forward, backward) = self.directed_keys(block.v, block.u)?;
            // The shallower key leads; the block is stored leaving its end.
            let (v, u, left, right) = if forward <= backward {
                (block.v, block.u, forward, backward)
            } else {
                (block.u, block.v, backward, forward)
            };
            self.file(v, u, left, right, None)?;
        }
        Ok(())
    }

    fn file(
        &mut self,
        v: VertexId,
        u: VertexId,
        left: PropagatorKey,
        right: PropagatorKey,
        feed: Option<Feed>,
    ) -> Result<(), CatalogError> {
        if self.finalized.contains_key(&left) {
            return Err(CatalogError::FinalizedGroup {
                key: left.to_string(),
            });
        }
        let block = self
            .polymer
            .block(v, u)
            .ok_or(CatalogError::UnknownEdge { v, u })?;
        self.groups
            .entry(left.clone())
            .or_default()
            .entry(right.clone())
            .or_insert_with(|| Entry::whole(block.monomer.clone(), block.n_segment))
            .edges
            .push(ServedEdge { v, u, feed });
        self.slots.insert(pair(v, u), (left, right));
        Ok(())
    }

    /// Take the block joining `a` and `b` out of its pending group.
    fn unfile(&mut self, a: VertexId, b: VertexId) -> Result<(), CatalogError> {
        let Some((left, right)) = self.slots.remove(&pair(a, b)) else {
            let key = self
                .builder
                .key(b, a)
                .map_or_else(|| format!("{a}-{b}"), |k| k.to_string());
            return Err(CatalogError::FinalizedGroup { key });
        };
        let Some(group) = self.groups.get_mut(&left) else {
            return Err(CatalogError::FinalizedGroup {
                key: left.to_string(),
            });
        };
        if let Some(entry) = group.get_mut(&right) {
            entry.edges.retain(|e| pair(e.v, e.u) != pair(a, b));
            if entry.edges.is_empty() {
                group.remove(&right);
            }
        }
        if group.is_empty() {
            self.groups.remove(&left);
        }
        Ok(())
    }

    /// Process groups deepest `dep_v` first. Every block an aggregate
    /// re-keys has a strictly shallower `dep_v` than the group that made
    /// the aggregate, so it always lands in a group still pending.
    fn aggregate(&mut self, options: PlanOptions) -> Result<(), CatalogError> {
        let mut pending: BTreeSet<PropagatorKey> = self.groups.keys().cloned().collect();
        while let Some(left) = pending.pop_last() {
            let Some(group) = self.groups.remove(&left) else {
                continue;
            };
            for entry in group.values() {
                for edge in &entry.edges {
                    self.slots.remove(&pair(edge.v, edge.u));
                }
            }
            let group = superpose::superpose(group, options.model)?;

            let mut overrides = Vec::new();
            for (key, entry) in &group {
                if key.is_aggregate() && entry.is_complete() {
                    for edge in &entry.edges {
                        overrides.push((
                            edge.u,
                            edge.v,
                            KeyChild::new(key.clone(), entry.n_allocated),
                        ));
                    }
                }
            }
            self.finalized.insert(left.clone(), group);

            let mut touched: IndexMap<DirectedEdge, VertexId> = IndexMap::new();
            for (from, junction, child) in overrides {
                for edge in self.builder.override_incoming(from, junction, child) {
                    touched.insert(edge, junction);
                }
            }
            for ((from, to), junction) in touched {
                self.unfile(from, to)?;
                let (right, new_left) = self.directed_keys(from, to)?;
                tracing::debug!(
                    polymer = %self.polymer.id(),
                    from = %from,
                    to = %to,
                    dep_v = %new_left,
                    dep_u = %right,
                    "re-keyed block downstream of synthetic node"
                );
                let feed = Feed {
                    origin: left.clone(),
                    junction,
                };
                self.file(to, from, new_left.clone(), right, Some(feed))?;
                pending.insert(new_left);
            }
        }
        Ok(())
    }

    fn into_blocks(self) -> BTreeMap<BlockKey, ComputationBlock> {
        let polymer = self.polymer.id();
        self.finalized
            .into_iter()
            .chain(self.groups)
            .flat_map(|(dep_v, group)| {
                group.into_iter().map(move |(dep_u, entry)| {
                    let block = ComputationBlock {
                        monomer: entry.monomer.clone(),
                        n_segment_allocated: entry.n_allocated,
                        n_segment_offset: entry.n_offset,
                        n_segment_original: entry.n_original,
                        n_repeated: entry.repeat(&dep_u),
                        edges: entry.edges.iter().map(|e| (e.v, e.u)).collect(),
                    };
                    let key = BlockKey {
                        polymer,
                        dep_v: dep_v.clone(),
                        dep_u,
                    };
                    (key, block)
                })
            })
            .collect()
    }
}
