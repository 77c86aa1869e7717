//! Stream scheduling for polyplan catalogs.
//!
//! [`Scheduler::plan`] layers a [`Catalog`](polyplan_catalog::Catalog) by
//! key height and greedily assigns every node to the stream that frees
//! up first, producing an [`ExecutionPlan`]: a timeline of
//! [`TimeSlice`]s, each telling every busy stream which segment range of
//! which propagator to advance.
//!
//! The plan is a pure description. [`dispatch::run_plan`] is a reference
//! driver that walks it with one worker thread per stream, delegating
//! the numeric step to a caller-supplied [`SegmentStepper`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dispatch;
pub mod plan;
pub mod schedule;

pub use dispatch::{run_plan, SegmentStepper};
pub use plan::{ExecutionPlan, ScheduledNode, StreamJob, TimeSlice};
pub use schedule::Scheduler;
