//! Reusable molecule fixtures.
//!
//! - [`linear_diblock`]: A-B chain on vertices 0-1-2.
//! - [`star`]: identical arms plus a core block on one junction.
//! - [`comb`]: a backbone with evenly spaced teeth.
//! - [`random_tree`]: a seeded random tree, with [`relabel`] to shuffle
//!   vertex ids and block order.

use indexmap::IndexMap;
use polyplan_catalog::PolymerInput;
use polyplan_core::MonomerType;
use polyplan_graph::BlockInput;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Unit bond lengths for the given monomer names.
pub fn bond_lengths(names: &[&str]) -> IndexMap<MonomerType, f64> {
    names
        .iter()
        .filter_map(|name| MonomerType::new(name).ok())
        .map(|m| (m, 1.0))
        .collect()
}

/// A(`f`)-B(`1 − f`) on vertices 0-1-2.
pub fn linear_diblock(f: f64) -> PolymerInput {
    PolymerInput::new(
        1.0,
        vec![BlockInput::new("A", f, 0, 1), BlockInput::new("B", 1.0 - f, 1, 2)],
    )
}

/// `n_arms` A arms of `arm_length` and one A core of `core_length`, all
/// joined at vertex 0. Arms end at vertices `1..=n_arms`, the core at
/// `n_arms + 1`.
pub fn star(n_arms: i64, arm_length: f64, core_length: f64) -> PolymerInput {
    let mut blocks: Vec<BlockInput> = (1..=n_arms)
        .map(|i| BlockInput::new("A", arm_length, 0, i))
        .collect();
    blocks.push(BlockInput::new("A", core_length, 0, n_arms + 1));
    PolymerInput::new(1.0, blocks)
}

/// An A backbone of `n_teeth + 1` blocks of `spacing`, with a B tooth of
/// `tooth_length` hanging off each interior backbone vertex.
pub fn comb(n_teeth: i64, spacing: f64, tooth_length: f64) -> PolymerInput {
    let mut blocks: Vec<BlockInput> = (0..=n_teeth)
        .map(|i| BlockInput::new("A", spacing, i, i + 1))
        .collect();
    for i in 1..=n_teeth {
        blocks.push(BlockInput::new("B", tooth_length, i, n_teeth + 1 + i));
    }
    PolymerInput::new(1.0, blocks)
}

fn below(rng: &mut ChaCha8Rng, n: u64) -> u64 {
    rng.next_u64() % n.max(1)
}

/// A random tree of `n_blocks` blocks, each attached to a uniformly
/// chosen earlier vertex, with monomer A or B and 1 to `max_segments`
/// segments of length `ds`.
pub fn random_tree(seed: u64, n_blocks: usize, max_segments: u64, ds: f64) -> PolymerInput {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let blocks = (0..n_blocks)
        .map(|i| {
            let child = i as i64 + 1;
            let parent = below(&mut rng, child as u64) as i64;
            let monomer = if below(&mut rng, 2) == 0 { "A" } else { "B" };
            let n_segment = 1 + below(&mut rng, max_segments);
            BlockInput::new(monomer, n_segment as f64 * ds, parent, child)
        })
        .collect();
    PolymerInput::new(1.0, blocks)
}

/// The same molecule with vertex ids permuted, block order shuffled and
/// each block's endpoints possibly swapped. Seeds follow their vertices.
pub fn relabel(input: &PolymerInput, seed: u64) -> PolymerInput {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let max_vertex = input
        .blocks
        .iter()
        .flat_map(|b| [b.v, b.u])
        .max()
        .unwrap_or(0);
    let mut ids: Vec<i64> = (0..=max_vertex).collect();
    shuffle(&mut ids, &mut rng);
    let map = |v: i64| usize::try_from(v).ok().and_then(|i| ids.get(i)).copied().unwrap_or(v);

    let mut blocks: Vec<BlockInput> = input
        .blocks
        .iter()
        .map(|b| {
            let (v, u) = if below(&mut rng, 2) == 0 {
                (map(b.v), map(b.u))
            } else {
                (map(b.u), map(b.v))
            };
            BlockInput::new(b.monomer_type.clone(), b.contour_length, v, u)
        })
        .collect();
    shuffle(&mut blocks, &mut rng);

    PolymerInput {
        volume_fraction: input.volume_fraction,
        blocks,
        seeds: input
            .seeds
            .iter()
            .map(|(&v, name)| (map(v), name.clone()))
            .collect(),
    }
}

fn shuffle<T>(items: &mut [T], rng: &mut ChaCha8Rng) {
    for i in (1..items.len()).rev() {
        let j = below(rng, i as u64 + 1) as usize;
        items.swap(i, j);
    }
}
