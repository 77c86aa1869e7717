//! The execution plan handed to a solver.

use std::collections::HashMap;
use std::fmt;

use polyplan_catalog::Catalog;
use polyplan_core::{ScheduleError, StreamId};
use polyplan_key::PropagatorKey;

/// Placement of one catalog node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledNode {
    /// The propagator.
    pub key: PropagatorKey,
    /// Stream it runs on.
    pub stream: StreamId,
    /// Segments it advances (`max_n_segment`; may be 0).
    pub n_segment: u32,
    /// Earliest time all dependencies are finished.
    pub resolved: u64,
    /// First time unit it occupies.
    pub start: u64,
    /// One past its last time unit: `start + max(n_segment, 1)`.
    pub finish: u64,
}

/// Work for one stream during one time slice: advance `key` over the
/// 1-based inclusive segment range `segment_from..=segment_to`.
///
/// A node with zero segments is still given its slot and reports the
/// empty range `1..=0`; the solver only has to set its initial value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamJob {
    /// Stream running the job.
    pub stream: StreamId,
    /// The propagator being advanced.
    pub key: PropagatorKey,
    /// First segment computed in this slice.
    pub segment_from: u32,
    /// Last segment computed in this slice.
    pub segment_to: u32,
}

impl StreamJob {
    /// Whether the job starts the propagator (computes its initial value).
    pub fn is_first(&self) -> bool {
        self.segment_from == 1
    }

    /// Segments advanced.
    pub fn len(&self) -> u32 {
        (self.segment_to + 1).saturating_sub(self.segment_from)
    }

    /// Whether no segment is advanced.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One interval `[start, end)` of the timeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeSlice {
    /// Interval start.
    pub start: u64,
    /// Interval end.
    pub end: u64,
    /// Jobs of the busy streams, by stream index.
    pub jobs: Vec<StreamJob>,
}

/// A complete stream assignment for a catalog.
///
/// Streams execute their queues in order; jobs in the same slice on
/// different streams touch disjoint nodes and may run concurrently.
#[derive(Clone, Debug)]
pub struct ExecutionPlan {
    pub(crate) n_streams: usize,
    pub(crate) nodes: Vec<ScheduledNode>,
    pub(crate) queues: Vec<Vec<usize>>,
    pub(crate) slices: Vec<TimeSlice>,
}

impl ExecutionPlan {
    /// Assemble a plan from placed nodes, in placement order.
    pub(crate) fn new(n_streams: usize, nodes: Vec<ScheduledNode>) -> Self {
        let mut queues = vec![Vec::new(); n_streams];
        for (i, node) in nodes.iter().enumerate() {
            if let Some(queue) = queues.get_mut(node.stream.index()) {
                queue.push(i);
            }
        }
        let slices = timeline(&nodes, &queues);
        Self {
            n_streams,
            nodes,
            queues,
            slices,
        }
    }

    /// Number of streams.
    pub fn n_streams(&self) -> usize {
        self.n_streams
    }

    /// Placed nodes, in the order they were scheduled.
    pub fn nodes(&self) -> &[ScheduledNode] {
        &self.nodes
    }

    /// Placement of `key`.
    pub fn node(&self, key: &PropagatorKey) -> Option<&ScheduledNode> {
        self.nodes.iter().find(|n| n.key == *key)
    }

    /// Nodes queued on `stream`, in execution order.
    pub fn queue(&self, stream: StreamId) -> impl Iterator<Item = &ScheduledNode> + '_ {
        self.queues
            .get(stream.index())
            .into_iter()
            .flatten()
            .filter_map(|&i| self.nodes.get(i))
    }

    /// The time-sliced plan.
    pub fn slices(&self) -> &[TimeSlice] {
        &self.slices
    }

    /// Time at which the last stream finishes.
    pub fn makespan(&self) -> u64 {
        self.nodes.iter().map(|n| n.finish).max().unwrap_or(0)
    }

    /// Check the plan against the ordering contract for `catalog`.
    ///
    /// Every catalog node is placed exactly once with the right segment
    /// count, starts no earlier than each dependency finishes, and never
    /// overlaps another node on its stream. Slices must cover each node's
    /// segments exactly once, in order.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::Infeasible`] naming the first offending node.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), ScheduleError> {
        let infeasible = |key: &PropagatorKey, reason: String| ScheduleError::Infeasible {
            key: key.to_string(),
            reason,
        };

        let mut placed: HashMap<&PropagatorKey, &ScheduledNode> = HashMap::new();
        for node in &self.nodes {
            if placed.insert(&node.key, node).is_some() {
                return Err(infeasible(&node.key, "scheduled twice".into()));
            }
            if node.stream.index() >= self.n_streams {
                return Err(infeasible(&node.key, format!("unknown stream {}", node.stream)));
            }
            if node.finish != node.start + u64::from(node.n_segment.max(1)) {
                return Err(infeasible(&node.key, "duration mismatch".into()));
            }
            if node.start < node.resolved {
                return Err(infeasible(
                    &node.key,
                    format!("starts at {} before dependencies resolve at {}", node.start, node.resolved),
                ));
            }
        }

        for cat in catalog.nodes() {
            let Some(node) = placed.get(&cat.key) else {
                return Err(infeasible(&cat.key, "not scheduled".into()));
            };
            if node.n_segment != cat.max_n_segment {
                return Err(infeasible(
                    &cat.key,
                    format!("runs {} segments, catalog needs {}", node.n_segment, cat.max_n_segment),
                ));
            }
            for dep in cat.dependencies() {
                match placed.get(&dep.key) {
                    Some(d) if d.finish <= node.start => {}
                    Some(d) => {
                        return Err(infeasible(
                            &cat.key,
                            format!("starts at {} before '{}' finishes at {}", node.start, dep.key, d.finish),
                        ))
                    }
                    None => return Err(infeasible(&cat.key, format!("dependency '{}' not scheduled", dep.key))),
                }
            }
        }
        if placed.len() != catalog.len() {
            return Err(ScheduleError::Infeasible {
                key: String::new(),
                reason: format!("{} nodes scheduled for a catalog of {}", placed.len(), catalog.len()),
            });
        }

        for queue in &self.queues {
            for pair in queue.windows(2) {
                let (Some(a), Some(b)) = (self.nodes.get(pair[0]), self.nodes.get(pair[1])) else {
                    continue;
                };
                if b.start < a.finish {
                    return Err(infeasible(&b.key, format!("overlaps '{}' on stream {}", a.key, a.stream)));
                }
            }
        }

        let mut progress: HashMap<&PropagatorKey, u32> = HashMap::new();
        for slice in &self.slices {
            for job in &slice.jobs {
                let done = progress.entry(&job.key).or_insert(0);
                if !job.is_empty() && job.segment_from != *done + 1 {
                    return Err(infeasible(
                        &job.key,
                        format!("slice starts at segment {} after {}", job.segment_from, done),
                    ));
                }
                *done = (*done).max(job.segment_to);
            }
        }
        for node in &self.nodes {
            let done = progress.get(&node.key).copied().unwrap_or(0);
            if done != node.n_segment {
                return Err(infeasible(
                    &node.key,
                    format!("slices reach segment {done} of {}", node.n_segment),
                ));
            }
        }
        Ok(())
    }
}

/// Cut the schedule at every start and finish time and list, for each
/// interval, the job each stream is running.
fn timeline(nodes: &[ScheduledNode], queues: &[Vec<usize>]) -> Vec<TimeSlice> {
    let mut stamps: Vec<u64> = nodes.iter().flat_map(|n| [n.start, n.finish]).collect();
    stamps.sort_unstable();
    stamps.dedup();

    let mut cursors = vec![0usize; queues.len()];
    let mut slices = Vec::with_capacity(stamps.len().saturating_sub(1));
    for window in stamps.windows(2) {
        let (t0, t1) = (window[0], window[1]);
        let mut jobs = Vec::new();
        for (queue, cursor) in queues.iter().zip(cursors.iter_mut()) {
            while let Some(node) = queue.get(*cursor).and_then(|&i| nodes.get(i)) {
                if node.finish <= t0 {
                    *cursor += 1;
                    continue;
                }
                if node.start <= t0 && t1 <= node.finish {
                    jobs.push(job_for(node, t0, t1));
                }
                break;
            }
        }
        slices.push(TimeSlice {
            start: t0,
            end: t1,
            jobs,
        });
    }
    slices
}

fn job_for(node: &ScheduledNode, t0: u64, t1: u64) -> StreamJob {
    let (segment_from, segment_to) = if node.n_segment == 0 {
        (1, 0)
    } else {
        let offset = |t: u64| u32::try_from(t - node.start).unwrap_or(u32::MAX);
        (1 + offset(t0), offset(t1))
    };
    StreamJob {
        stream: node.stream,
        key: node.key.clone(),
        segment_from,
        segment_to,
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} streams, {} nodes, {} slices, makespan {}",
            self.n_streams,
            self.nodes.len(),
            self.slices.len(),
            self.makespan()
        )?;
        for slice in &self.slices {
            write!(f, "[{:>5}, {:>5})", slice.start, slice.end)?;
            for job in &slice.jobs {
                write!(
                    f,
                    "  s{}: {} {}..={}",
                    job.stream, job.key, job.segment_from, job.segment_to
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
