//! Core types for the polyplan propagator planner.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! identifiers, validated names and error enums shared by the graph,
//! key, catalog and scheduling crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod monomer;

pub use error::{
    CatalogError, ConfigError, DispatchError, GraphError, KeyError, NameError, ScheduleError,
};
pub use id::{PolymerId, StreamId, VertexId};
pub use monomer::{ChainModel, MonomerType, SeedName};
