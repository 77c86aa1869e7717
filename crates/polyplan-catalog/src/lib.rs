//! Propagator catalog for polyplan.
//!
//! The catalog is the deduplicated set of propagator computations needed
//! by every polymer in a mixture, plus the essential-block table telling
//! the solver which pair of propagators evaluates each block.
//!
//! Adding a polymer runs three stages:
//!
//! 1. every directed edge gets its canonical key ([`Polymer::build`]);
//! 2. each block is filed under its outranking key and, when aggregation
//!    is enabled, siblings sharing that key are merged into synthetic
//!    sum nodes, re-keying everything downstream of a merge;
//! 3. the resulting blocks are registered in the [`Catalog`], which is
//!    checked for dependency closure and segment coverage before the
//!    polymer is committed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod catalog;
pub mod polymer;

mod planner;
mod superpose;

pub use block::{BlockKey, ComputationBlock};
pub use catalog::{Catalog, CatalogNode, PlanOptions};
pub use polymer::{Polymer, PolymerInput};
