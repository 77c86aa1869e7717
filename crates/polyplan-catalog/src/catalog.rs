//! The mixture-wide propagator catalog.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;

use polyplan_core::{CatalogError, ChainModel, MonomerType, PolymerId, VertexId};
use polyplan_key::{KeyChild, PropagatorKey};

use crate::block::{BlockKey, ComputationBlock};
use crate::planner;
use crate::polymer::Polymer;

/// How a polymer's blocks are planned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlanOptions {
    /// Chain model; decides how aggregation treats segment parity.
    pub model: ChainModel,
    /// Merge sibling computations into synthetic nodes.
    pub aggregate: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            model: ChainModel::Continuous,
            aggregate: true,
        }
    }
}

/// One unique propagator computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogNode {
    /// Canonical key.
    pub key: PropagatorKey,
    /// Largest segment index any block or dependent reads.
    pub max_n_segment: u32,
}

impl CatalogNode {
    /// Monomer type the propagator runs along.
    pub fn monomer(&self) -> &MonomerType {
        self.key.monomer()
    }

    /// Nesting depth; dependencies are always strictly shallower.
    pub fn height(&self) -> u32 {
        self.key.height()
    }

    /// Direct dependencies.
    pub fn dependencies(&self) -> &[KeyChild] {
        self.key.children()
    }
}

/// Deduplicated propagator registry shared by every polymer of a
/// mixture, together with each polymer's essential blocks.
///
/// Adding a polymer is all-or-nothing: its contribution is planned and
/// checked in isolation and only merged in if every check passes.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    nodes: BTreeMap<PropagatorKey, CatalogNode>,
    blocks: BTreeMap<BlockKey, ComputationBlock>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan `polymer` and merge its computations into the catalog.
    ///
    /// # Errors
    ///
    /// A [`CatalogError`] if planning breaks an internal invariant: a
    /// block whose slices do not tile it, or a node whose dependency is
    /// missing or too short. The catalog is unchanged on error.
    pub fn add_polymer(
        &mut self,
        polymer: &Polymer,
        options: PlanOptions,
    ) -> Result<(), CatalogError> {
        let blocks = planner::plan_polymer(polymer, options)?;
        check_coverage(polymer, &blocks)?;

        let mut staged: BTreeMap<PropagatorKey, u32> = BTreeMap::new();
        for (key, block) in &blocks {
            stage(&mut staged, &key.dep_v, block.n_segment_original);
            stage(&mut staged, &key.dep_u, block.n_segment_allocated);
        }
        for key in staged.keys() {
            self.check_dependencies(key, &staged)?;
        }

        let before = self.nodes.len();
        for (key, n_segment) in staged {
            self.nodes
                .entry(key.clone())
                .and_modify(|node| node.max_n_segment = node.max_n_segment.max(n_segment))
                .or_insert(CatalogNode {
                    key,
                    max_n_segment: n_segment,
                });
        }
        let n_blocks = blocks.len();
        self.blocks.extend(blocks);
        tracing::info!(
            polymer = %polymer.id(),
            new_nodes = self.nodes.len() - before,
            blocks = n_blocks,
            total_nodes = self.nodes.len(),
            total_segment_steps = self.total_segment_steps(),
            "polymer committed to catalog"
        );
        Ok(())
    }

    fn available(&self, key: &PropagatorKey, staged: &BTreeMap<PropagatorKey, u32>) -> Option<u32> {
        let committed = self.nodes.get(key).map(|n| n.max_n_segment);
        match (committed, staged.get(key).copied()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    fn check_dependencies(
        &self,
        key: &PropagatorKey,
        staged: &BTreeMap<PropagatorKey, u32>,
    ) -> Result<(), CatalogError> {
        for child in key.children() {
            let available = self.available(&child.key, staged);
            if available.is_none_or(|n| n < child.n_segment) {
                return Err(CatalogError::MissingDependency {
                    key: key.to_string(),
                    dependency: child.key.to_string(),
                    required: child.n_segment,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Number of unique propagators.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no polymer has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in key order (shallowest first).
    pub fn nodes(&self) -> impl Iterator<Item = &CatalogNode> + '_ {
        self.nodes.values()
    }

    /// Node for `key`.
    pub fn node(&self, key: &PropagatorKey) -> Option<&CatalogNode> {
        self.nodes.get(key)
    }

    /// Node whose canonical text is `text`.
    pub fn node_by_text(&self, text: &str) -> Option<&CatalogNode> {
        let key = polyplan_key::grammar::parse(text).ok()?;
        self.nodes.get(&key)
    }

    /// All essential blocks.
    pub fn blocks(&self) -> impl Iterator<Item = (&BlockKey, &ComputationBlock)> + '_ {
        self.blocks.iter()
    }

    /// Essential block for `key`.
    pub fn block(&self, key: &BlockKey) -> Option<&ComputationBlock> {
        self.blocks.get(key)
    }

    /// Essential blocks of one polymer.
    pub fn blocks_of(
        &self,
        polymer: PolymerId,
    ) -> impl Iterator<Item = (&BlockKey, &ComputationBlock)> + '_ {
        self.blocks.iter().filter(move |(k, _)| k.polymer == polymer)
    }

    /// Essential blocks serving the physical block joining `v` and `u`.
    pub fn blocks_serving(
        &self,
        polymer: PolymerId,
        v: VertexId,
        u: VertexId,
    ) -> impl Iterator<Item = (&BlockKey, &ComputationBlock)> + '_ {
        self.blocks_of(polymer).filter(move |(_, b)| {
            b.edges
                .iter()
                .any(|&(a, c)| (a, c) == (v, u) || (a, c) == (u, v))
        })
    }

    /// Total propagator steps: the sum of `max_n_segment` over all nodes.
    pub fn total_segment_steps(&self) -> u64 {
        self.nodes.values().map(|n| u64::from(n.max_n_segment)).sum()
    }

    /// Printable table of essential blocks.
    pub fn block_table(&self) -> BlockTable<'_> {
        BlockTable(self)
    }
}

fn stage(staged: &mut BTreeMap<PropagatorKey, u32>, key: &PropagatorKey, n_segment: u32) {
    staged
        .entry(key.clone())
        .and_modify(|n| *n = (*n).max(n_segment))
        .or_insert(n_segment);
}

/// Verify that the slices serving each block of `polymer` tile its
/// segment range exactly.
fn check_coverage(
    polymer: &Polymer,
    blocks: &BTreeMap<BlockKey, ComputationBlock>,
) -> Result<(), CatalogError> {
    let mut ranges: HashMap<(VertexId, VertexId), Vec<Range<u32>>> = HashMap::new();
    for block in polymer.blocks() {
        ranges.insert((block.v, block.u), Vec::new());
    }
    for slice in blocks.values() {
        for &(a, b) in &slice.edges {
            let Some(block) = polymer.block(a, b) else {
                return Err(CatalogError::UnknownEdge { v: a, u: b });
            };
            let gap = |detail: String| CatalogError::CoverageGap {
                polymer: polymer.id(),
                v: block.v,
                u: block.u,
                n_segment: block.n_segment,
                detail,
            };
            let range = slice.local_range(block.n_segment).ok_or_else(|| {
                gap(format!(
                    "slice at offset {} of {} does not fit",
                    slice.n_segment_offset, slice.n_segment_original
                ))
            })?;
            ranges.entry((block.v, block.u)).or_default().push(range);
        }
    }

    for block in polymer.blocks() {
        let mut covered = ranges.remove(&(block.v, block.u)).unwrap_or_default();
        covered.sort_by_key(|r| (r.start, r.end));
        let mut cursor = 0;
        for range in covered.iter().filter(|r| !r.is_empty()) {
            if range.start != cursor {
                return Err(CatalogError::CoverageGap {
                    polymer: polymer.id(),
                    v: block.v,
                    u: block.u,
                    n_segment: block.n_segment,
                    detail: format!("expected a slice at {cursor}, found {range:?}"),
                });
            }
            cursor = range.end;
        }
        if cursor != block.n_segment {
            return Err(CatalogError::CoverageGap {
                polymer: polymer.id(),
                v: block.v,
                u: block.u,
                n_segment: block.n_segment,
                detail: format!("covered up to {cursor}"),
            });
        }
    }
    Ok(())
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} propagators, {} segment steps",
            self.nodes.len(),
            self.total_segment_steps()
        )?;
        writeln!(f, "{:>6}  {:>6}  {:<8}  key", "height", "n_seg", "monomer")?;
        for node in self.nodes.values() {
            writeln!(
                f,
                "{:>6}  {:>6}  {:<8}  {}",
                node.height(),
                node.max_n_segment,
                node.monomer(),
                node.key
            )?;
        }
        Ok(())
    }
}

/// [`Display`](fmt::Display) adapter listing every essential block.
#[derive(Debug)]
pub struct BlockTable<'a>(&'a Catalog);

impl fmt::Display for BlockTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>7}  {:>5}  {:>6}  {:>8}  {:>3}  edges / dep_v / dep_u",
            "polymer", "alloc", "offset", "original", "rep"
        )?;
        for (key, block) in &self.0.blocks {
            write!(
                f,
                "{:>7}  {:>5}  {:>6}  {:>8}  {:>3}  ",
                key.polymer,
                block.n_segment_allocated,
                block.n_segment_offset,
                block.n_segment_original,
                block.n_repeated
            )?;
            for (i, (v, u)) in block.edges.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "({v},{u})")?;
            }
            writeln!(f, "  {}  {}", key.dep_v, key.dep_u)?;
        }
        Ok(())
    }
}
