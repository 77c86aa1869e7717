//! Canonical propagator keys for polyplan.
//!
//! A propagator key identifies one sub-chain computation: the propagator
//! leaving a vertex along a block, together with everything upstream of
//! it. Two directed edges anywhere in a mixture receive the same key
//! exactly when their upstream subtrees are identical, which is what lets
//! the catalog compute each distinct propagator once.
//!
//! - [`PropagatorKey`] is the source of truth: a shared tree whose
//!   canonical text is cached for hashing and display.
//! - [`grammar`] reads the text form directly (height, monomer type,
//!   dependencies) and parses it back into a tree.
//! - [`KeyBuilder`] derives the key of every directed edge of one
//!   polymer, memoized per molecule.
//!
//! # Text form
//!
//! ```text
//! key    ::= branch? monomer_type
//! branch ::= '(' child (',' child)* ')'     ordinary junction
//!          | '[' child (',' child)* ']'     aggregated sum
//!          | '{' seed_name '}'              seeded chain end
//! child  ::= key segment_count (':' repeat_count)?
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod grammar;
pub mod key;

pub use builder::{DirectedEdge, KeyBuilder};
pub use grammar::TextDependency;
pub use key::{KeyChild, KeyKind, PropagatorKey};
