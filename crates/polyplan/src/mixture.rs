//! The [`Mixture`] entry point.

use std::fmt;

use polyplan_catalog::{BlockKey, Catalog, ComputationBlock, Polymer, PolymerInput};
use polyplan_core::{CatalogError, ConfigError, PolymerId, VertexId};
use polyplan_key::PropagatorKey;
use polyplan_schedule::{ExecutionPlan, Scheduler};

use crate::config::MixtureConfig;
use crate::error::PlanError;

/// A set of polymer species sharing one propagator catalog.
///
/// Polymers are added one at a time. Each addition is validated and
/// planned in isolation and only committed if every step succeeds, so a
/// failed [`add_polymer`](Self::add_polymer) leaves the mixture exactly
/// as it was. The catalog and schedules depend only on topology; they
/// can be reused for as many solver iterations as needed.
#[derive(Clone, Debug)]
pub struct Mixture {
    config: MixtureConfig,
    polymers: Vec<Polymer>,
    catalog: Catalog,
}

impl Mixture {
    /// An empty mixture.
    ///
    /// # Errors
    ///
    /// Whatever [`MixtureConfig::validate`] reports.
    pub fn new(config: MixtureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            polymers: Vec::new(),
            catalog: Catalog::new(),
        })
    }

    /// Validate `input`, plan its propagators and merge them into the
    /// catalog. Returns the new polymer's id.
    ///
    /// # Errors
    ///
    /// [`PlanError::Graph`] for invalid input and [`PlanError::Catalog`]
    /// if planning breaks an internal invariant.
    pub fn add_polymer(&mut self, input: &PolymerInput) -> Result<PolymerId, PlanError> {
        let id = PolymerId(u32::try_from(self.polymers.len()).unwrap_or(u32::MAX));
        let polymer = Polymer::build(id, input, self.config.ds, &self.config.bond_lengths)?;
        self.catalog
            .add_polymer(&polymer, self.config.plan_options())?;
        self.polymers.push(polymer);
        Ok(id)
    }

    /// The validated configuration.
    pub fn config(&self) -> &MixtureConfig {
        &self.config
    }

    /// The shared catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Number of polymer species.
    pub fn n_polymers(&self) -> usize {
        self.polymers.len()
    }

    /// All polymers, indexed by [`PolymerId`].
    pub fn polymers(&self) -> &[Polymer] {
        &self.polymers
    }

    /// Polymer `id`.
    pub fn polymer(&self, id: PolymerId) -> Option<&Polymer> {
        self.polymers.get(usize::try_from(id.0).ok()?)
    }

    /// Sum of the volume fractions given so far.
    pub fn total_volume_fraction(&self) -> f64 {
        self.polymers.iter().map(Polymer::volume_fraction).sum()
    }

    /// Essential block of `polymer` evaluated by `dep_v` and `dep_u`.
    pub fn block(
        &self,
        polymer: PolymerId,
        dep_v: &PropagatorKey,
        dep_u: &PropagatorKey,
    ) -> Option<&ComputationBlock> {
        self.catalog.block(&BlockKey {
            polymer,
            dep_v: dep_v.clone(),
            dep_u: dep_u.clone(),
        })
    }

    /// Essential blocks serving the physical block joining `v` and `u`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::UnknownEdge`] if `polymer` has no such block.
    pub fn blocks_for_edge(
        &self,
        polymer: PolymerId,
        v: VertexId,
        u: VertexId,
    ) -> Result<Vec<(&BlockKey, &ComputationBlock)>, PlanError> {
        self.polymer(polymer)
            .and_then(|p| p.block(v, u))
            .ok_or(CatalogError::UnknownEdge { v, u })?;
        Ok(self.catalog.blocks_serving(polymer, v, u).collect())
    }

    /// Total propagator steps the solver runs per iteration.
    pub fn total_segment_steps(&self) -> u64 {
        self.catalog.total_segment_steps()
    }

    /// Schedule the catalog on the configured number of streams.
    pub fn schedule(&self) -> Result<ExecutionPlan, PlanError> {
        self.schedule_with(self.config.n_streams)
    }

    /// Schedule the catalog on `n_streams` streams.
    ///
    /// # Errors
    ///
    /// [`PlanError::Schedule`] if `n_streams` is zero.
    pub fn schedule_with(&self, n_streams: usize) -> Result<ExecutionPlan, PlanError> {
        Ok(Scheduler::new(n_streams)?.plan(&self.catalog)?)
    }
}

impl fmt::Display for Mixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "mixture: {} polymers, ds = {}, {} chain, aggregation {}",
            self.polymers.len(),
            self.config.ds,
            self.config.chain_model,
            if self.config.aggregate { "on" } else { "off" }
        )?;
        for polymer in &self.polymers {
            writeln!(
                f,
                "  polymer {}: phi = {}, {} blocks, {} segments",
                polymer.id(),
                polymer.volume_fraction(),
                polymer.blocks().len(),
                polymer.total_segments()
            )?;
        }
        write!(f, "{}", self.catalog)?;
        write!(f, "{}", self.catalog.block_table())
    }
}
