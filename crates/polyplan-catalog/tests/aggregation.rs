//! Sibling aggregation on whole molecules.

use polyplan_catalog::{Catalog, CatalogNode, PlanOptions, Polymer, PolymerInput};
use polyplan_core::{ChainModel, PolymerId};
use polyplan_graph::BlockInput;
use polyplan_test_utils::fixtures::{bond_lengths, star};

const DS: f64 = 0.25;

fn plan(input: &PolymerInput, options: PlanOptions) -> Catalog {
    let polymer = Polymer::build(PolymerId(0), input, DS, &bond_lengths(&["A", "B"])).unwrap();
    let mut catalog = Catalog::new();
    catalog.add_polymer(&polymer, options).unwrap();
    catalog
}

fn plain() -> PlanOptions {
    PlanOptions {
        aggregate: false,
        ..PlanOptions::default()
    }
}

fn synthetic(catalog: &Catalog) -> Vec<&CatalogNode> {
    catalog.nodes().filter(|n| n.key.is_aggregate()).collect()
}

#[test]
fn star_aggregation_reduces_work() {
    let input = star(3, 1.0, 2.0);
    let without = plan(&input, plain());
    let with = plan(&input, PlanOptions::default());

    assert!(synthetic(&without).is_empty());
    let merged = synthetic(&with);
    assert_eq!(merged.len(), 1);
    let arms: u32 = merged[0]
        .dependencies()
        .iter()
        .map(|c| c.n_repeated)
        .sum();
    assert!(arms >= 2);
    assert!(with.total_segment_steps() <= without.total_segment_steps());
}

#[test]
fn synthetic_block_serves_every_member_edge() {
    let catalog = plan(&star(3, 1.0, 2.0), PlanOptions::default());
    let (_, block) = catalog
        .blocks()
        .find(|(k, _)| k.dep_u.is_aggregate())
        .unwrap();
    assert_eq!(block.edges.len(), 4);
    assert_eq!(block.n_repeated, 1);
    assert_eq!(
        (block.n_segment_allocated, block.n_segment_offset, block.n_segment_original),
        (4, 4, 8)
    );
    assert_eq!(block.local_range(4), Some(0..4));
    assert_eq!(block.local_range(8), Some(4..8));
}

/// Three B spacers of lengths 4, 4 and 6 from a center, each ending in a
/// 2-segment A tail. The spacers share `(A2)B` as `dep_v`, so their far
/// ends are aggregated, and every A tail downstream must be re-keyed
/// onto the synthetic node.
fn forked_star() -> PolymerInput {
    PolymerInput::new(
        1.0,
        vec![
            BlockInput::new("B", 1.0, 0, 1),
            BlockInput::new("B", 1.0, 0, 2),
            BlockInput::new("B", 1.5, 0, 3),
            BlockInput::new("A", 0.5, 1, 4),
            BlockInput::new("A", 0.5, 2, 5),
            BlockInput::new("A", 0.5, 3, 6),
        ],
    )
}

#[test]
fn forked_star_keys_before_aggregation() {
    let catalog = plan(&forked_star(), plain());
    let texts: Vec<&str> = catalog.nodes().map(|n| n.key.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "A",
            "(A2)B",
            "((A2)B4,(A2)B4)B",
            "((A2)B4,(A2)B6)B",
            "(((A2)B4,(A2)B4)B6)A",
            "(((A2)B4,(A2)B6)B4)A",
        ]
    );
    assert_eq!(catalog.total_segment_steps(), 2 + 6 + 6 + 4 + 2 + 2);
}

#[test]
fn forked_star_tails_are_rekeyed_onto_the_synthetic_node() {
    let catalog = plan(&forked_star(), PlanOptions::default());
    let agg = "[((A2)B4,(A2)B4)B2,((A2)B4,(A2)B6)B0:2]B";
    let tail = format!("({agg}4)A");

    assert_eq!(catalog.node_by_text(agg).unwrap().max_n_segment, 4);
    assert_eq!(catalog.node_by_text(&tail).unwrap().max_n_segment, 2);
    assert!(catalog.node_by_text("(((A2)B4,(A2)B6)B4)A").is_none());
    assert!(catalog.node_by_text("(((A2)B4,(A2)B4)B6)A").is_none());

    let (_, tails) = catalog
        .blocks()
        .find(|(k, _)| k.dep_u.as_str() == tail)
        .unwrap();
    assert_eq!(tails.edges.len(), 3);
    // The synthetic node already sums all three spacers.
    assert_eq!(tails.n_repeated, 1);
    for (v, u) in &tails.edges {
        assert!(u.0 <= 3 && v.0 >= 4, "tail stored leaving its chain end: ({v},{u})");
    }
    assert_eq!(catalog.total_segment_steps(), 2 + 6 + 2 + 0 + 4 + 2);
}

#[test]
fn every_block_is_served_once_per_segment() {
    for options in [plain(), PlanOptions::default()] {
        let catalog = plan(&forked_star(), options);
        let polymer = Polymer::build(
            PolymerId(0),
            &forked_star(),
            DS,
            &bond_lengths(&["A", "B"]),
        )
        .unwrap();
        for block in polymer.blocks() {
            let total: u32 = catalog
                .blocks_serving(PolymerId(0), block.v, block.u)
                .map(|(_, b)| b.n_segment_allocated)
                .sum();
            assert_eq!(total, block.n_segment, "block {}-{}", block.v, block.u);
        }
    }
}

#[test]
fn discrete_model_merges_across_parities() {
    // Arms of 3 and 2 segments share the leaf `A` as dep_v.
    let input = PolymerInput::new(
        1.0,
        vec![
            BlockInput::new("A", 0.75, 0, 1),
            BlockInput::new("A", 0.5, 0, 2),
        ],
    );
    let continuous = plan(&input, PlanOptions::default());
    assert!(synthetic(&continuous).is_empty());

    let discrete = plan(
        &input,
        PlanOptions {
            model: ChainModel::Discrete,
            aggregate: true,
        },
    );
    let merged = synthetic(&discrete);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].max_n_segment, 1);
    for (key, block) in discrete.blocks() {
        if !key.dep_u.is_aggregate() {
            assert!(block.n_segment_allocated >= 1, "{}", key.dep_u);
        }
    }
}

#[test]
fn polymers_accumulate_in_one_catalog() {
    let bonds = bond_lengths(&["A", "B"]);
    let mut catalog = Catalog::new();
    let first = Polymer::build(PolymerId(0), &star(3, 1.0, 2.0), DS, &bonds).unwrap();
    catalog.add_polymer(&first, PlanOptions::default()).unwrap();
    let before = catalog.to_string();

    let second = Polymer::build(PolymerId(1), &forked_star(), DS, &bonds).unwrap();
    catalog.add_polymer(&second, PlanOptions::default()).unwrap();
    assert_ne!(catalog.to_string(), before);
    assert_eq!(catalog.blocks_of(PolymerId(0)).count(), 3);
    assert_eq!(catalog.blocks_of(PolymerId(1)).count(), 4);
}
