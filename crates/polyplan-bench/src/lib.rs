//! Benchmark profiles for the polyplan planner.
//!
//! - [`reference_config`]: two monomer types at `ds = 0.01`, aggregation on
//! - [`bottlebrush`]: a long comb with many identical side chains
//! - [`random_mixture`]: several seeded random trees in one catalog

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use polyplan::prelude::*;
use polyplan_test_utils::fixtures::{comb, random_tree};

/// Contour step shared by every profile.
pub const DS: f64 = 0.01;

/// A/B configuration with unit bond lengths.
pub fn reference_config(aggregate: bool, n_streams: usize) -> Result<MixtureConfig, NameError> {
    MixtureConfig {
        ds: DS,
        aggregate,
        n_streams,
        ..MixtureConfig::default()
    }
    .with_monomer("A", 1.0)?
    .with_monomer("B", 1.0)
}

/// Bottlebrush with `n_teeth` side chains of 20 segments, spaced 10
/// segments apart along the backbone.
pub fn bottlebrush(n_teeth: i64) -> PolymerInput {
    comb(n_teeth, 10.0 * DS, 20.0 * DS)
}

/// Mixture of `n_polymers` random trees of `n_blocks` blocks each.
pub fn random_mixture(
    config: MixtureConfig,
    n_polymers: u64,
    n_blocks: usize,
) -> Result<Mixture, PlanError> {
    let mut mixture = Mixture::new(config)?;
    for seed in 0..n_polymers {
        mixture.add_polymer(&random_tree(seed, n_blocks, 50, DS))?;
    }
    Ok(mixture)
}
