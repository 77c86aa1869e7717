//! End-to-end behaviour of the facade on the reference molecules.

use polyplan::key::grammar;
use polyplan::prelude::*;
use polyplan_test_utils::fixtures::{linear_diblock, random_tree, relabel, star};
use polyplan_test_utils::RecordingStepper;
use proptest::prelude::*;

fn config(ds: f64) -> MixtureConfig {
    MixtureConfig {
        ds,
        ..MixtureConfig::default()
    }
    .with_monomer("A", 1.0)
    .unwrap()
    .with_monomer("B", 1.0)
    .unwrap()
}

fn mixture(ds: f64) -> Mixture {
    Mixture::new(config(ds)).unwrap()
}

fn blocks(edges: &[(i64, i64)]) -> PolymerInput {
    PolymerInput::new(
        1.0,
        edges
            .iter()
            .map(|&(v, u)| BlockInput::new("A", 0.5, v, u))
            .collect(),
    )
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn triangle_is_a_cycle() {
    let mut m = mixture(0.25);
    match m.add_polymer(&blocks(&[(0, 1), (1, 2), (2, 0)])) {
        Err(PlanError::Graph(GraphError::Cycle { .. })) => {}
        other => panic!("expected Cycle, got {other:?}"),
    }
    assert_eq!(m.n_polymers(), 0);
    assert!(m.catalog().is_empty());
}

#[test]
fn detached_block_is_disconnected() {
    let mut m = mixture(0.25);
    match m.add_polymer(&blocks(&[(0, 1), (2, 3)])) {
        Err(PlanError::Graph(GraphError::Disconnected { vertices })) => {
            assert_eq!(vertices, vec![VertexId(2), VertexId(3)]);
        }
        other => panic!("expected Disconnected, got {other:?}"),
    }
}

#[test]
fn failed_addition_leaves_mixture_unchanged() {
    let mut m = mixture(0.25);
    m.add_polymer(&linear_diblock(0.5)).unwrap();
    let before = m.to_string();
    let bad = PolymerInput::new(1.0, vec![BlockInput::new("C", 0.5, 0, 1)]);
    match m.add_polymer(&bad) {
        Err(PlanError::Graph(GraphError::UnknownMonomerType { monomer, .. })) => {
            assert_eq!(monomer, "C");
        }
        other => panic!("expected UnknownMonomerType, got {other:?}"),
    }
    let fractional = PolymerInput::new(1.0, vec![BlockInput::new("A", 0.3, 0, 1)]);
    match m.add_polymer(&fractional) {
        Err(PlanError::Graph(GraphError::NonIntegralSegments { .. })) => {}
        other => panic!("expected NonIntegralSegments, got {other:?}"),
    }
    assert_eq!(m.to_string(), before);
    assert_eq!(m.n_polymers(), 1);
}

#[test]
fn invalid_config_is_rejected() {
    let config = MixtureConfig {
        n_streams: 0,
        ..config(0.25)
    };
    assert_eq!(Mixture::new(config).err(), Some(ConfigError::NoStreams));
}

// ── Reference molecules ─────────────────────────────────────────

#[test]
fn diblock_catalog_and_single_stream_schedule() {
    let mut m = mixture(0.25);
    let id = m.add_polymer(&linear_diblock(0.5)).unwrap();
    assert_eq!(id, PolymerId(0));

    let polymer = m.polymer(id).unwrap();
    assert_eq!(polymer.keys().len(), 4);
    assert_eq!(m.catalog().len(), 4);
    for node in m.catalog().nodes() {
        assert_eq!(node.max_n_segment, 2, "{}", node.key);
        assert_eq!(grammar::height(node.key.as_str()), node.height());
    }

    let plan = m.schedule().unwrap();
    let queue: Vec<&ScheduledNode> = plan.queue(StreamId(0)).collect();
    assert_eq!(queue.len(), 4);
    let finishes: Vec<u64> = queue.iter().map(|n| n.finish).collect();
    assert_eq!(finishes, vec![2, 4, 6, 8]);
    plan.validate(m.catalog()).unwrap();
}

#[test]
fn diblock_essential_blocks() {
    let mut m = mixture(0.25);
    let id = m.add_polymer(&linear_diblock(0.5)).unwrap();
    let a = grammar::parse("A").unwrap();
    let b2a = grammar::parse("(B2)A").unwrap();
    let block = m.block(id, &a, &b2a).unwrap();
    assert_eq!(block.edges, vec![(VertexId(0), VertexId(1))]);
    assert_eq!(block.n_segment_original, 2);

    let serving = m.blocks_for_edge(id, VertexId(2), VertexId(1)).unwrap();
    assert_eq!(serving.len(), 1);
    assert_eq!(serving[0].0.dep_v.as_str(), "B");
    match m.blocks_for_edge(id, VertexId(0), VertexId(2)) {
        Err(PlanError::Catalog(CatalogError::UnknownEdge { .. })) => {}
        other => panic!("expected UnknownEdge, got {other:?}"),
    }
}

#[test]
fn star_aggregation_shrinks_the_work() {
    let mut plain = Mixture::new(MixtureConfig {
        aggregate: false,
        ..config(0.25)
    })
    .unwrap();
    let mut merged = mixture(0.25);
    plain.add_polymer(&star(3, 1.0, 2.0)).unwrap();
    merged.add_polymer(&star(3, 1.0, 2.0)).unwrap();

    assert!(merged.total_segment_steps() <= plain.total_segment_steps());
    let synthetic: Vec<&CatalogNode> = merged
        .catalog()
        .nodes()
        .filter(|n| n.key.kind() == KeyKind::Aggregate)
        .collect();
    assert_eq!(synthetic.len(), 1);
    assert!(synthetic[0].key.as_str().starts_with('['));
    let members: u32 = synthetic[0]
        .dependencies()
        .iter()
        .map(|c| c.n_repeated)
        .sum();
    assert!(members >= 2);
}

#[test]
fn molecules_share_catalog_entries() {
    let mut m = mixture(0.25);
    m.add_polymer(&linear_diblock(0.5)).unwrap();
    let steps = m.total_segment_steps();
    let mut twin = linear_diblock(0.5);
    twin.volume_fraction = 0.5;
    m.add_polymer(&twin).unwrap();
    assert_eq!(m.total_segment_steps(), steps);
    assert_eq!(m.n_polymers(), 2);
    assert!((m.total_volume_fraction() - 1.5).abs() < 1e-12);
}

#[test]
fn seeded_chain_end_gets_its_own_key() {
    let mut m = mixture(0.25);
    m.add_polymer(&linear_diblock(0.5).with_seed(0, "wall")).unwrap();
    let seeded = m
        .catalog()
        .nodes()
        .find(|n| n.key.seed().is_some())
        .unwrap();
    assert_eq!(seeded.key.as_str(), "{wall}A");
    assert_eq!(grammar::seed(seeded.key.as_str()), Some("wall"));
    assert!(m.catalog().node_by_text("({wall}A2)B").is_some());
}

#[test]
fn reference_driver_runs_the_whole_plan() {
    let mut m = mixture(0.25);
    m.add_polymer(&star(3, 1.0, 2.0)).unwrap();
    m.add_polymer(&linear_diblock(0.5)).unwrap();
    let plan = m.schedule_with(2).unwrap();
    let stepper = RecordingStepper::new();
    run_plan(&plan, &stepper).unwrap();
    let advanced: u64 = stepper.jobs().iter().map(|j| u64::from(j.len())).sum();
    assert_eq!(advanced, m.total_segment_steps());
}

#[test]
fn display_summarises_the_mixture() {
    let mut m = mixture(0.25);
    m.add_polymer(&linear_diblock(0.5)).unwrap();
    let text = m.to_string();
    assert!(text.starts_with("mixture: 1 polymers, ds = 0.25, continuous chain, aggregation on"));
    assert!(text.contains("4 propagators, 8 segment steps"));
}

// ── Properties ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn relabeled_molecules_share_every_key(seed in any::<u64>(), n in 1usize..16, shuffle in any::<u64>()) {
        let input = random_tree(seed, n, 4, 0.25);
        let mut m = mixture(0.25);
        m.add_polymer(&input).unwrap();
        let steps = m.total_segment_steps();
        let nodes = m.catalog().len();
        m.add_polymer(&relabel(&input, shuffle)).unwrap();
        prop_assert_eq!(m.catalog().len(), nodes);
        prop_assert_eq!(m.total_segment_steps(), steps);
    }

    #[test]
    fn every_plan_is_feasible(seed in any::<u64>(), n in 1usize..16, streams in 1usize..4) {
        let mut m = mixture(0.25);
        m.add_polymer(&random_tree(seed, n, 4, 0.25)).unwrap();
        let plan = m.schedule_with(streams).unwrap();
        prop_assert!(plan.validate(m.catalog()).is_ok());
    }
}
