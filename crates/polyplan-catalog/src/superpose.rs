//! Sibling aggregation within one group of blocks sharing a `dep_v` key.
//!
//! Siblings `b1..bk` needing `n1 ≥ n2 ≥ … ≥ nk` segments of the same
//! monomer obey the same linear recurrence, so after `b1` runs alone for
//! `n1 − n2` steps the sum of all members can be advanced as one
//! propagator for the remaining steps. Each pass keeps a leading slice of
//! every member and replaces the common trailing part with a synthetic
//! [`KeyKind::Aggregate`](polyplan_key::KeyKind::Aggregate) entry, which
//! may itself be merged again at a lower level.

use std::collections::BTreeMap;

use polyplan_core::{CatalogError, ChainModel, MonomerType, VertexId};
use polyplan_key::{KeyChild, PropagatorKey};

/// Where a re-keyed block's new `dep_u` came from: the group whose
/// aggregate replaced an incoming value, and the junction it replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Feed {
    pub origin: PropagatorKey,
    pub junction: VertexId,
}

/// A physical block served by an entry, oriented so the group's key
/// leaves `v`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ServedEdge {
    pub v: VertexId,
    pub u: VertexId,
    pub feed: Option<Feed>,
}

/// One `dep_u` of a group and the slice of it the group needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Entry {
    pub monomer: MonomerType,
    pub n_allocated: u32,
    pub n_offset: u32,
    pub n_original: u32,
    pub edges: Vec<ServedEdge>,
}

/// Entries of one group, keyed by `dep_u`.
pub(crate) type Group = BTreeMap<PropagatorKey, Entry>;

impl Entry {
    /// A whole block of `n_segment` segments, not yet serving any edge.
    pub fn whole(monomer: MonomerType, n_segment: u32) -> Self {
        Self {
            monomer,
            n_allocated: n_segment,
            n_offset: 0,
            n_original: n_segment,
            edges: Vec::new(),
        }
    }

    /// Whether the slice reaches the far end of its blocks.
    pub fn is_complete(&self) -> bool {
        self.n_offset + self.n_allocated == self.n_original
    }

    /// How many times this entry's value is counted when `key` is its
    /// `dep_u`.
    ///
    /// Synthetic keys already sum their members. A plain key counts each
    /// served edge. A re-keyed key carries an aggregate summing every
    /// junction of its origin group, so only the edges hanging off one of
    /// those junctions are counted.
    pub fn repeat(&self, key: &PropagatorKey) -> u32 {
        if key.is_aggregate() {
            return 1;
        }
        let mut first_junction: BTreeMap<&PropagatorKey, VertexId> = BTreeMap::new();
        for feed in self.edges.iter().filter_map(|e| e.feed.as_ref()) {
            first_junction
                .entry(&feed.origin)
                .and_modify(|j| *j = (*j).min(feed.junction))
                .or_insert(feed.junction);
        }
        let count = self
            .edges
            .iter()
            .filter(|e| match &e.feed {
                None => true,
                Some(feed) => first_junction.get(&feed.origin) == Some(&feed.junction),
            })
            .count();
        u32::try_from(count).unwrap_or(u32::MAX).max(1)
    }
}

/// Aggregate one group under `model`.
///
/// The continuous model weights even and odd segment counts differently
/// in its quadrature, so the two parities are merged in separate passes
/// whose results are then combined. The discrete model merges everything
/// in one pass but always leaves at least one segment to each member.
pub(crate) fn superpose(group: Group, model: ChainModel) -> Result<Group, CatalogError> {
    match model {
        ChainModel::Discrete => superpose_common(group, 1),
        ChainModel::Continuous => {
            let (even, odd): (Group, Group) = group
                .into_iter()
                .partition(|(_, entry)| entry.n_allocated % 2 == 0);
            let mut out = superpose_common(even, 0)?;
            for (key, entry) in superpose_common(odd, 0)? {
                if out.contains_key(&key) {
                    return Err(CatalogError::DuplicateAggregate {
                        key: key.to_string(),
                    });
                }
                out.insert(key, entry);
            }
            Ok(out)
        }
    }
}

/// One aggregation pass, lowering the merge threshold from the largest
/// outstanding segment count.
///
/// Members of a merge keep a leading slice of `allocated − current + min`
/// segments; the synthetic entry takes the remaining `current − min`.
fn superpose_common(mut remaining: Group, min_segment: u32) -> Result<Group, CatalogError> {
    let mut finals = Group::new();
    let mut current = remaining.values().map(|e| e.n_allocated).max().unwrap_or(0);

    loop {
        let exhausted: Vec<PropagatorKey> = remaining
            .iter()
            .filter(|(_, e)| e.n_allocated <= 1)
            .map(|(k, _)| k.clone())
            .collect();
        for key in exhausted {
            if let Some(entry) = remaining.remove(&key) {
                finals.insert(key, entry);
            }
        }
        if remaining.is_empty() {
            break;
        }

        let level: Vec<PropagatorKey> = remaining
            .iter()
            .filter(|(_, e)| e.n_allocated >= current)
            .map(|(k, _)| k.clone())
            .collect();
        let next = remaining
            .values()
            .map(|e| e.n_allocated)
            .filter(|&n| n < current)
            .max();

        if level.len() >= 2 {
            merge(&mut remaining, &mut finals, level, current, min_segment)?;
        } else if let Some(next) = next {
            current = next;
        } else {
            finals.append(&mut remaining);
            break;
        }
    }
    Ok(finals)
}

fn merge(
    remaining: &mut Group,
    finals: &mut Group,
    mut level: Vec<PropagatorKey>,
    current: u32,
    min_segment: u32,
) -> Result<(), CatalogError> {
    level.sort_by(|a, b| b.height().cmp(&a.height()).then_with(|| a.cmp(b)));

    let mut children = Vec::with_capacity(level.len());
    let mut monomer = None;
    let mut n_offset = 0;
    let mut n_original = 0;
    let mut edges = Vec::new();
    for key in level {
        let Some(mut entry) = remaining.remove(&key) else {
            continue;
        };
        entry.n_allocated = entry.n_allocated + min_segment - current;
        n_offset = n_offset.max(entry.n_offset + entry.n_allocated);
        n_original = n_original.max(entry.n_original);
        edges.extend(entry.edges.iter().cloned());
        children.push(KeyChild::repeated(
            key.clone(),
            entry.n_allocated,
            entry.repeat(&key),
        ));
        monomer.get_or_insert_with(|| entry.monomer.clone());
        finals.insert(key, entry);
    }
    let Some(monomer) = monomer else {
        return Ok(());
    };

    let members = children.len();
    let key = PropagatorKey::aggregate(monomer.clone(), children);
    let n_allocated = current.saturating_sub(min_segment);
    tracing::debug!(
        key = %key,
        members,
        n_allocated,
        n_offset,
        "merged siblings into synthetic node"
    );
    if remaining.contains_key(&key) || finals.contains_key(&key) {
        return Err(CatalogError::DuplicateAggregate {
            key: key.to_string(),
        });
    }
    remaining.insert(
        key,
        Entry {
            monomer,
            n_allocated,
            n_offset,
            n_original,
            edges,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(name: &str) -> MonomerType {
        MonomerType::new(name).unwrap()
    }

    fn leaf(name: &str) -> PropagatorKey {
        PropagatorKey::leaf(m(name), None)
    }

    /// Group of leaf-keyed entries of monomer `S`, one edge each.
    fn group(members: &[(&str, u32)]) -> Group {
        members
            .iter()
            .enumerate()
            .map(|(i, &(name, n))| {
                let key = PropagatorKey::branch(m("S"), vec![KeyChild::new(leaf(name), 1)]);
                let mut entry = Entry::whole(m("S"), n);
                let v = u32::try_from(i).unwrap();
                entry.edges.push(ServedEdge {
                    v: VertexId(100 + v),
                    u: VertexId(v),
                    feed: None,
                });
                (key, entry)
            })
            .collect()
    }

    fn aggregates(group: &Group) -> Vec<(&PropagatorKey, &Entry)> {
        group.iter().filter(|(k, _)| k.is_aggregate()).collect()
    }

    #[test]
    fn lone_member_is_kept_whole() {
        let out = superpose(group(&[("C", 6)]), ChainModel::Continuous).unwrap();
        assert_eq!(out.len(), 1);
        let entry = out.values().next().unwrap();
        assert_eq!((entry.n_allocated, entry.n_offset, entry.n_original), (6, 0, 6));
    }

    #[test]
    fn cascade_merges_from_the_top() {
        // C6, D4, E4, F2: C runs 2 alone, then [C,D,E] runs 2, then the
        // sum with F runs the final 2.
        let out = superpose(
            group(&[("C", 6), ("D", 4), ("E", 4), ("F", 2)]),
            ChainModel::Continuous,
        )
        .unwrap();

        let aggs = aggregates(&out);
        assert_eq!(aggs.len(), 2);
        let (inner, outer) = if aggs[0].0.height() < aggs[1].0.height() {
            (aggs[0], aggs[1])
        } else {
            (aggs[1], aggs[0])
        };
        assert_eq!(
            (inner.1.n_allocated, inner.1.n_offset, inner.1.n_original),
            (2, 2, 6)
        );
        assert_eq!(
            (outer.1.n_allocated, outer.1.n_offset, outer.1.n_original),
            (2, 4, 6)
        );
        assert!(outer.1.is_complete());
        assert!(!inner.1.is_complete());
        assert_eq!(outer.1.edges.len(), 4);
        assert_eq!(outer.0.children()[0].key, *inner.0);

        let plain: BTreeMap<u32, u32> = out
            .iter()
            .filter(|(k, _)| !k.is_aggregate())
            .map(|(_, e)| (e.n_original, e.n_allocated))
            .collect();
        assert_eq!(plain[&6], 2);
        assert_eq!(plain[&4], 0);
        assert_eq!(plain[&2], 0);
    }

    #[test]
    fn continuous_model_keeps_parities_apart() {
        let out = superpose(group(&[("C", 5), ("D", 4)]), ChainModel::Continuous).unwrap();
        assert!(aggregates(&out).is_empty());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn discrete_model_leaves_one_segment_per_member() {
        let out = superpose(group(&[("C", 5), ("D", 4)]), ChainModel::Discrete).unwrap();
        let aggs = aggregates(&out);
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].1.n_allocated, 3);
        assert_eq!(aggs[0].1.n_offset, 2);
        let members: Vec<u32> = out
            .iter()
            .filter(|(k, _)| !k.is_aggregate())
            .map(|(_, e)| e.n_allocated)
            .collect();
        assert_eq!(members, vec![2, 1]);
    }

    #[test]
    fn repeat_counts_plain_edges() {
        let mut entry = Entry::whole(m("A"), 4);
        for v in 0..3 {
            entry.edges.push(ServedEdge {
                v: VertexId(v),
                u: VertexId(9),
                feed: None,
            });
        }
        assert_eq!(entry.repeat(&leaf("A")), 3);
        let agg = PropagatorKey::aggregate(m("A"), vec![KeyChild::new(leaf("A"), 1)]);
        assert_eq!(entry.repeat(&agg), 1);
    }

    #[test]
    fn repeat_counts_one_junction_per_origin() {
        let origin = leaf("Z");
        let mut entry = Entry::whole(m("A"), 4);
        for (v, junction) in [(1, 10), (2, 10), (3, 11), (4, 11)] {
            entry.edges.push(ServedEdge {
                v: VertexId(v),
                u: VertexId(junction),
                feed: Some(Feed {
                    origin: origin.clone(),
                    junction: VertexId(junction),
                }),
            });
        }
        assert_eq!(entry.repeat(&leaf("A")), 2);
    }
}
