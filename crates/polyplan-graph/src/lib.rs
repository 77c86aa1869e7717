//! Polymer graphs for polyplan.
//!
//! A polymer is given as a list of blocks, each a linear sub-chain of one
//! monomer type joining two vertices. [`PolymerGraph::build`] checks that
//! the blocks form a single tree with well-formed segment counts and
//! exposes the adjacency queries the key builder needs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod graph;

pub use block::{Block, BlockInput};
pub use graph::PolymerGraph;
