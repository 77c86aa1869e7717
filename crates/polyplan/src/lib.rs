//! Polyplan: propagator planning for branched polymer mixtures.
//!
//! Given the molecules of a mixture, polyplan works out the smallest set
//! of chain-propagator computations a field-theoretic solver needs,
//! shares identical sub-chains across molecules, merges sibling
//! computations that can be advanced as one sum, and schedules the
//! result across parallel streams. The numeric propagator step itself is
//! left to the caller.
//!
//! This is the facade crate: it re-exports the sub-crates and adds the
//! [`Mixture`] entry point.
//!
//! # Quick start
//!
//! ```rust
//! use polyplan::prelude::*;
//!
//! let config = MixtureConfig {
//!     ds: 0.25,
//!     ..MixtureConfig::default()
//! }
//! .with_monomer("A", 1.0)?
//! .with_monomer("B", 1.0)?;
//! let mut mixture = Mixture::new(config)?;
//!
//! // A-B diblock with equal halves.
//! let id = mixture.add_polymer(&PolymerInput::new(
//!     1.0,
//!     vec![BlockInput::new("A", 0.5, 0, 1), BlockInput::new("B", 0.5, 1, 2)],
//! ))?;
//! assert_eq!(id, PolymerId(0));
//! assert_eq!(mixture.catalog().len(), 4);
//!
//! let plan = mixture.schedule()?;
//! assert_eq!(plan.makespan(), 8);
//! # Ok::<(), PlanError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `polyplan-core` | IDs, names, chain model, error enums |
//! | [`graph`] | `polyplan-graph` | Block input and polymer graph validation |
//! | [`key`] | `polyplan-key` | Propagator keys, text grammar, key derivation |
//! | [`catalog`] | `polyplan-catalog` | Polymers, catalog, essential blocks, aggregation |
//! | [`schedule`] | `polyplan-schedule` | Stream scheduling and the reference driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod mixture;

pub use config::MixtureConfig;
pub use error::PlanError;
pub use mixture::Mixture;

/// IDs, validated names and error enums (`polyplan-core`).
pub use polyplan_core as types;

/// Block input and polymer graph validation (`polyplan-graph`).
pub use polyplan_graph as graph;

/// Propagator keys and their text grammar (`polyplan-key`).
///
/// [`key::grammar`] reads height, monomer type, seed and dependencies
/// straight from canonical key text.
pub use polyplan_key as key;

/// Polymers, the catalog and essential blocks (`polyplan-catalog`).
pub use polyplan_catalog as catalog;

/// Stream scheduling and plan dispatch (`polyplan-schedule`).
pub use polyplan_schedule as schedule;

/// Common imports for typical polyplan usage.
///
/// ```rust
/// use polyplan::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use polyplan_core::{ChainModel, MonomerType, PolymerId, SeedName, StreamId, VertexId};

    // Errors
    pub use polyplan_core::{
        CatalogError, ConfigError, DispatchError, GraphError, KeyError, NameError, ScheduleError,
    };

    // Input
    pub use polyplan_catalog::PolymerInput;
    pub use polyplan_graph::BlockInput;

    // Keys and catalog
    pub use polyplan_catalog::{BlockKey, Catalog, CatalogNode, ComputationBlock, Polymer};
    pub use polyplan_key::{KeyChild, KeyKind, PropagatorKey};

    // Scheduling
    pub use polyplan_schedule::{
        run_plan, ExecutionPlan, ScheduledNode, SegmentStepper, StreamJob, TimeSlice,
    };

    // Facade
    pub use crate::{Mixture, MixtureConfig, PlanError};
}
