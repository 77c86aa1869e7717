//! Height-layered greedy list scheduling.

use std::collections::{BTreeMap, HashMap};

use polyplan_catalog::{Catalog, CatalogNode};
use polyplan_core::{ScheduleError, StreamId};
use polyplan_key::PropagatorKey;

use crate::plan::{ExecutionPlan, ScheduledNode};

/// Assigns catalog nodes to a fixed number of streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduler {
    n_streams: usize,
}

impl Scheduler {
    /// A scheduler for `n_streams` parallel streams.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::NoStreams`] if `n_streams` is zero.
    pub fn new(n_streams: usize) -> Result<Self, ScheduleError> {
        if n_streams == 0 {
            return Err(ScheduleError::NoStreams);
        }
        Ok(Self { n_streams })
    }

    /// Number of streams.
    pub fn n_streams(&self) -> usize {
        self.n_streams
    }

    /// Schedule every node of `catalog`.
    ///
    /// Levels are processed by increasing height, so every dependency is
    /// placed before its dependents. Within a level, nodes whose inputs
    /// resolve earliest go first, each onto the stream that frees up
    /// first (lowest index on ties). A node occupies
    /// `max(max_n_segment, 1)` time units.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::MissingDependency`] if a node depends on a key
    /// that is not in the catalog.
    pub fn plan(&self, catalog: &Catalog) -> Result<ExecutionPlan, ScheduleError> {
        let mut levels: BTreeMap<u32, Vec<&CatalogNode>> = BTreeMap::new();
        for node in catalog.nodes() {
            levels.entry(node.height()).or_default().push(node);
        }

        let mut finish_times: HashMap<&PropagatorKey, u64> = HashMap::with_capacity(catalog.len());
        let mut stream_free = vec![0u64; self.n_streams];
        let mut placed = Vec::with_capacity(catalog.len());

        for level in levels.into_values() {
            let mut ready = Vec::with_capacity(level.len());
            for node in level {
                let mut resolved = 0;
                for dep in node.dependencies() {
                    let finish = finish_times.get(&dep.key).ok_or_else(|| {
                        ScheduleError::MissingDependency {
                            key: node.key.to_string(),
                            dependency: dep.key.to_string(),
                        }
                    })?;
                    resolved = resolved.max(*finish);
                }
                ready.push((node, resolved));
            }
            ready.sort_by_key(|&(_, resolved)| resolved);

            for (node, resolved) in ready {
                let (stream, free) = stream_free
                    .iter()
                    .copied()
                    .enumerate()
                    .min_by_key(|&(i, t)| (t, i))
                    .unwrap_or((0, 0));
                let start = free.max(resolved);
                let finish = start + u64::from(node.max_n_segment.max(1));
                if let Some(slot) = stream_free.get_mut(stream) {
                    *slot = finish;
                }
                finish_times.insert(&node.key, finish);
                placed.push(ScheduledNode {
                    key: node.key.clone(),
                    stream: StreamId(u32::try_from(stream).unwrap_or(u32::MAX)),
                    n_segment: node.max_n_segment,
                    resolved,
                    start,
                    finish,
                });
            }
        }

        let plan = ExecutionPlan::new(self.n_streams, placed);
        tracing::debug!(
            n_streams = self.n_streams,
            nodes = plan.nodes().len(),
            slices = plan.slices().len(),
            makespan = plan.makespan(),
            "built execution plan"
        );
        Ok(plan)
    }
}
