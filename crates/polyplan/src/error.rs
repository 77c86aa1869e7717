//! The facade's umbrella error.

use polyplan_core::{
    CatalogError, ConfigError, DispatchError, GraphError, KeyError, NameError, ScheduleError,
};

/// Any error polyplan can report.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// Invalid mixture configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Invalid monomer or seed name.
    #[error(transparent)]
    Name(#[from] NameError),
    /// A molecule failed validation.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// Malformed key text.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// Catalog construction broke an internal invariant.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Scheduling failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    /// The reference driver failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
