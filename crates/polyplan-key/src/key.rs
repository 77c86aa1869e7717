//! The [`PropagatorKey`] tree and its total order.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use polyplan_core::{MonomerType, SeedName};

/// Shape of a key's root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyKind {
    /// A chain end: no upstream blocks, optionally seeded.
    Leaf,
    /// An ordinary junction: the product of its children's end values.
    Branch,
    /// A synthetic node: the weighted sum of its children's values.
    Aggregate,
}

/// One dependency of a key: `key` advanced by `n_segment` segments,
/// counted `n_repeated` times.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyChild {
    /// The upstream propagator.
    pub key: PropagatorKey,
    /// Segment index of `key` that is read.
    pub n_segment: u32,
    /// Multiplicity of this child (always at least 1).
    pub n_repeated: u32,
}

impl KeyChild {
    /// A child read once.
    pub fn new(key: PropagatorKey, n_segment: u32) -> Self {
        Self {
            key,
            n_segment,
            n_repeated: 1,
        }
    }

    /// A child with an explicit multiplicity. Zero is stored as 1.
    pub fn repeated(key: PropagatorKey, n_segment: u32, n_repeated: u32) -> Self {
        Self {
            key,
            n_segment,
            n_repeated: n_repeated.max(1),
        }
    }

    /// Canonical child order: deeper keys first, then [`PropagatorKey`]'s
    /// `Ord`, then segment count, then repeat count.
    ///
    /// Putting the deepest child first makes the number of leading
    /// brackets of the rendered text equal the tree height.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .height()
            .cmp(&self.key.height())
            .then_with(|| self.key.cmp(&other.key))
            .then(self.n_segment.cmp(&other.n_segment))
            .then(self.n_repeated.cmp(&other.n_repeated))
    }

    fn render_into(&self, out: &mut String) {
        out.push_str(self.key.as_str());
        out.push_str(&self.n_segment.to_string());
        if self.n_repeated != 1 {
            out.push(':');
            out.push_str(&self.n_repeated.to_string());
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf { seed: Option<SeedName> },
    Branch { children: Vec<KeyChild> },
    Aggregate { children: Vec<KeyChild> },
}

#[derive(Debug)]
struct Inner {
    node: Node,
    monomer: MonomerType,
    height: u32,
    has_aggregate: bool,
    text: Box<str>,
}

/// Canonical identifier of a propagator computation.
///
/// Cloning is cheap: the tree is shared. Equality and hashing use the
/// cached canonical text, which is injective because monomer and seed
/// names cannot contain key delimiters.
///
/// The total order ([`Ord`]) is height ascending, then the root kind
/// (leaf, branch, aggregate), then seed or children elementwise, then
/// monomer type. It never compares partially built text.
#[derive(Clone)]
pub struct PropagatorKey(Arc<Inner>);

impl PropagatorKey {
    /// A chain-end key, optionally carrying a seed.
    pub fn leaf(monomer: MonomerType, seed: Option<SeedName>) -> Self {
        Self::from_node(Node::Leaf { seed }, monomer)
    }

    /// An ordinary junction key. Children are sorted into canonical
    /// order; an empty child list yields an unseeded leaf.
    pub fn branch(monomer: MonomerType, children: Vec<KeyChild>) -> Self {
        if children.is_empty() {
            return Self::leaf(monomer, None);
        }
        Self::from_node(
            Node::Branch {
                children: canonical(children),
            },
            monomer,
        )
    }

    /// A synthetic aggregate key summing `children`. Children are sorted
    /// into canonical order; an empty child list yields an unseeded leaf.
    pub fn aggregate(monomer: MonomerType, children: Vec<KeyChild>) -> Self {
        if children.is_empty() {
            return Self::leaf(monomer, None);
        }
        Self::from_node(
            Node::Aggregate {
                children: canonical(children),
            },
            monomer,
        )
    }

    fn from_node(node: Node, monomer: MonomerType) -> Self {
        let mut text = String::new();
        let (height, has_aggregate) = match &node {
            Node::Leaf { seed } => {
                if let Some(seed) = seed {
                    text.push('{');
                    text.push_str(seed.as_str());
                    text.push('}');
                }
                (0, false)
            }
            Node::Branch { children } | Node::Aggregate { children } => {
                let (open, close) = match node {
                    Node::Aggregate { .. } => ('[', ']'),
                    _ => ('(', ')'),
                };
                text.push(open);
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        text.push(',');
                    }
                    child.render_into(&mut text);
                }
                text.push(close);
                let height = 1 + children.iter().map(|c| c.key.height()).max().unwrap_or(0);
                let nested = children.iter().any(|c| c.key.contains_aggregate());
                (height, nested || matches!(node, Node::Aggregate { .. }))
            }
        };
        text.push_str(monomer.as_str());
        Self(Arc::new(Inner {
            node,
            monomer,
            height,
            has_aggregate,
            text: text.into_boxed_str(),
        }))
    }

    /// Canonical text.
    pub fn as_str(&self) -> &str {
        &self.0.text
    }

    /// Nesting depth: 0 for leaves, else one more than the deepest child.
    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// Monomer type of the block this propagator runs along.
    pub fn monomer(&self) -> &MonomerType {
        &self.0.monomer
    }

    /// Root shape.
    pub fn kind(&self) -> KeyKind {
        match self.0.node {
            Node::Leaf { .. } => KeyKind::Leaf,
            Node::Branch { .. } => KeyKind::Branch,
            Node::Aggregate { .. } => KeyKind::Aggregate,
        }
    }

    /// Whether the root is a synthetic aggregate.
    pub fn is_aggregate(&self) -> bool {
        matches!(self.0.node, Node::Aggregate { .. })
    }

    /// Whether an aggregate appears anywhere in the tree.
    pub fn contains_aggregate(&self) -> bool {
        self.0.has_aggregate
    }

    /// Seed of a leaf key.
    pub fn seed(&self) -> Option<&SeedName> {
        match &self.0.node {
            Node::Leaf { seed } => seed.as_ref(),
            _ => None,
        }
    }

    /// Direct dependencies in canonical order. Empty for leaves.
    pub fn children(&self) -> &[KeyChild] {
        match &self.0.node {
            Node::Leaf { .. } => &[],
            Node::Branch { children } | Node::Aggregate { children } => children,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self.kind() {
            KeyKind::Leaf => 0,
            KeyKind::Branch => 1,
            KeyKind::Aggregate => 2,
        }
    }
}

fn canonical(mut children: Vec<KeyChild>) -> Vec<KeyChild> {
    children.sort_by(KeyChild::canonical_cmp);
    children
}

impl PartialEq for PropagatorKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.text == other.0.text
    }
}

impl Eq for PropagatorKey {}

impl Hash for PropagatorKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.text.hash(state);
    }
}

impl Ord for PropagatorKey {
    fn cmp(&self, other: &Self) -> Ordering {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Ordering::Equal;
        }
        self.height()
            .cmp(&other.height())
            .then_with(|| self.kind_rank().cmp(&other.kind_rank()))
            .then_with(|| match (&self.0.node, &other.0.node) {
                (Node::Leaf { seed: a }, Node::Leaf { seed: b }) => a.cmp(b),
                (
                    Node::Branch { children: a } | Node::Aggregate { children: a },
                    Node::Branch { children: b } | Node::Aggregate { children: b },
                ) => a
                    .iter()
                    .map(|c| (&c.key, c.n_segment, c.n_repeated))
                    .cmp(b.iter().map(|c| (&c.key, c.n_segment, c.n_repeated))),
                _ => Ordering::Equal,
            })
            .then_with(|| self.monomer().cmp(other.monomer()))
    }
}

impl PartialOrd for PropagatorKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PropagatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for PropagatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropagatorKey").field(&self.as_str()).finish()
    }
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

    #[test]
    fn leaf_text_is_monomer_or_seeded_monomer() {
        assert_eq!(leaf("A").as_str(), "A");
        let seeded = PropagatorKey::leaf(m("B"), Some(SeedName::new("G1").unwrap()));
        assert_eq!(seeded.as_str(), "{G1}B");
        assert_eq!(seeded.height(), 0);
        assert_eq!(seeded.seed().map(SeedName::as_str), Some("G1"));
    }

    #[test]
    fn branch_children_are_sorted_deepest_first() {
        let inner = PropagatorKey::branch(m("B"), vec![KeyChild::new(leaf("A"), 2)]);
        let key = PropagatorKey::branch(
            m("C"),
            vec![KeyChild::new(leaf("A"), 4), KeyChild::new(inner.clone(), 3)],
        );
        assert_eq!(key.as_str(), "((A2)B3,A4)C");
        assert_eq!(key.height(), 2);
        assert_eq!(key.children()[0].key, inner);
    }

    #[test]
    fn child_order_does_not_depend_on_input_order() {
        let a = KeyChild::new(leaf("A"), 4);
        let b = KeyChild::new(leaf("B"), 2);
        let x = PropagatorKey::branch(m("C"), vec![a.clone(), b.clone()]);
        let y = PropagatorKey::branch(m("C"), vec![b, a]);
        assert_eq!(x, y);
        assert_eq!(x.cmp(&y), Ordering::Equal);
    }

    #[test]
    fn repeats_render_only_when_above_one() {
        let agg = PropagatorKey::aggregate(
            m("A"),
            vec![
                KeyChild::repeated(leaf("A"), 0, 3),
                KeyChild::repeated(leaf("A"), 2, 1),
            ],
        );
        assert_eq!(agg.as_str(), "[A0:3,A2]A");
        assert!(agg.is_aggregate());
        assert!(agg.contains_aggregate());
        assert_eq!(agg.kind(), KeyKind::Aggregate);
    }

    #[test]
    fn aggregate_flag_propagates_upward() {
        let agg = PropagatorKey::aggregate(m("A"), vec![KeyChild::new(leaf("A"), 1)]);
        let outer = PropagatorKey::branch(m("B"), vec![KeyChild::new(agg, 2)]);
        assert!(outer.contains_aggregate());
        assert!(!outer.is_aggregate());
        assert_eq!(outer.as_str(), "([A1]A2)B");
    }

    #[test]
    fn order_is_height_first() {
        let shallow = leaf("Z");
        let deep = PropagatorKey::branch(m("A"), vec![KeyChild::new(leaf("A"), 1)]);
        assert!(shallow < deep);
    }

    #[test]
    fn order_ranks_leaf_branch_aggregate_at_equal_height() {
        let kids = || vec![KeyChild::new(leaf("A"), 1)];
        let branch = PropagatorKey::branch(m("A"), kids());
        let agg = PropagatorKey::aggregate(m("A"), kids());
        assert!(branch < agg);
        let seeded = PropagatorKey::leaf(m("A"), Some(SeedName::new("s").unwrap()));
        assert!(leaf("A") < seeded);
    }

    #[test]
    fn order_agrees_with_equality() {
        let a1 = PropagatorKey::branch(m("A"), vec![KeyChild::new(leaf("B"), 3)]);
        let a2 = PropagatorKey::branch(m("A"), vec![KeyChild::new(leaf("B"), 3)]);
        let b = PropagatorKey::branch(m("A"), vec![KeyChild::new(leaf("B"), 4)]);
        assert_eq!(a1.cmp(&a2), Ordering::Equal);
        assert_eq!(a1, a2);
        assert!(a1 < b);
        assert_ne!(a1, b);
    }

    #[test]
    fn empty_children_collapse_to_leaf() {
        assert_eq!(PropagatorKey::branch(m("A"), Vec::new()).kind(), KeyKind::Leaf);
        assert_eq!(PropagatorKey::aggregate(m("A"), Vec::new()).as_str(), "A");
    }
}
