//! Mixture configuration and validation.

use indexmap::IndexMap;
use polyplan_catalog::PlanOptions;
use polyplan_core::{ChainModel, ConfigError, MonomerType, NameError};

/// Settings shared by every polymer of a [`Mixture`](crate::Mixture).
///
/// Plain data with public fields; [`validate()`](Self::validate) is run
/// once by [`Mixture::new`](crate::Mixture::new).
#[derive(Clone, Debug, PartialEq)]
pub struct MixtureConfig {
    /// Contour step. Every block length must be an integer multiple of
    /// it. Default: 0.01.
    pub ds: f64,
    /// Known monomer types and their statistical segment lengths. A block
    /// of any other type is rejected. Default: empty.
    pub bond_lengths: IndexMap<MonomerType, f64>,
    /// Chain model. Default: continuous.
    pub chain_model: ChainModel,
    /// Merge sibling computations into synthetic nodes. Default: true.
    pub aggregate: bool,
    /// Streams used by [`Mixture::schedule`](crate::Mixture::schedule).
    /// Default: 1.
    pub n_streams: usize,
}

impl Default for MixtureConfig {
    fn default() -> Self {
        Self {
            ds: 0.01,
            bond_lengths: IndexMap::new(),
            chain_model: ChainModel::Continuous,
            aggregate: true,
            n_streams: 1,
        }
    }
}

impl MixtureConfig {
    /// Add or replace a monomer type.
    ///
    /// # Errors
    ///
    /// [`NameError`] if `name` is not a valid monomer name.
    pub fn with_monomer(mut self, name: &str, bond_length: f64) -> Result<Self, NameError> {
        self.bond_lengths.insert(MonomerType::new(name)?, bond_length);
        Ok(self)
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ds.is_finite() && self.ds > 0.0) {
            return Err(ConfigError::InvalidDs { value: self.ds });
        }
        if self.bond_lengths.is_empty() {
            return Err(ConfigError::NoMonomerTypes);
        }
        for (monomer, &value) in &self.bond_lengths {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidBondLength {
                    monomer: monomer.to_string(),
                    value,
                });
            }
        }
        if self.n_streams == 0 {
            return Err(ConfigError::NoStreams);
        }
        Ok(())
    }

    /// Catalog planning options implied by this configuration.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            model: self.chain_model,
            aggregate: self.aggregate,
        }
    }
}
