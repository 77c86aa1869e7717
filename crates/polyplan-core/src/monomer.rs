//! Validated monomer-type and seed names, and the chain model flag.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ConfigError, NameError};

/// Name of a monomer species, e.g. `A` or `PS_block`.
///
/// Monomer names appear verbatim at the end of every propagator key, so
/// they are restricted to ASCII letters and `_`. Digits, brackets and
/// punctuation would make the key text ambiguous.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonomerType(Arc<str>);

impl MonomerType {
    /// Validate and wrap a monomer name.
    pub fn new(name: &str) -> Result<Self, NameError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(NameError::MonomerType(name.to_string()));
        }
        Ok(Self(Arc::from(name)))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonomerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MonomerType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MonomerType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for MonomerType {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Name of an externally supplied initial condition attached to a chain
/// end (a grafting point). Rendered inside `{}` in key text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeedName(Arc<str>);

impl SeedName {
    /// Validate and wrap a seed name.
    ///
    /// Seeds may contain any characters except the key delimiters
    /// `()[]{},:`.
    pub fn new(name: &str) -> Result<Self, NameError> {
        const RESERVED: &[char] = &['(', ')', '[', ']', '{', '}', ',', ':'];
        if name.is_empty() || name.contains(RESERVED) {
            return Err(NameError::Seed(name.to_string()));
        }
        Ok(Self(Arc::from(name)))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discretization model of the polymer chains.
///
/// The only planning difference is how aggregation handles the final
/// segment: the continuous model integrates with parity-dependent
/// quadrature weights, the discrete model needs at least one bond.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChainModel {
    /// Continuous Gaussian chain.
    #[default]
    Continuous,
    /// Discrete bead-spring chain.
    Discrete,
}

impl ChainModel {
    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Discrete => "discrete",
        }
    }
}

impl fmt::Display for ChainModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainModel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "discrete" => Ok(Self::Discrete),
            _ => Err(ConfigError::UnknownChainModel {
                name: s.to_string(),
            }),
        }
    }
}
