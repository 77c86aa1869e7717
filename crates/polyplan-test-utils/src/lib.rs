//! Test fixtures and mock steppers for polyplan development.
//!
//! [`fixtures`] builds standard molecule shapes and seeded random trees;
//! [`RecordingStepper`] is a [`SegmentStepper`] that logs every job it
//! receives and can be told to fail on a given key.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Mutex;

use polyplan_schedule::{SegmentStepper, StreamJob};

/// Records every job, optionally failing on one key.
#[derive(Debug, Default)]
pub struct RecordingStepper {
    jobs: Mutex<Vec<StreamJob>>,
    fail_on: Option<String>,
}

impl RecordingStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every job whose key text is `key`.
    pub fn failing_on(key: impl Into<String>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            fail_on: Some(key.into()),
        }
    }

    /// Jobs received so far, in arrival order.
    pub fn jobs(&self) -> Vec<StreamJob> {
        self.jobs.lock().map(|j| j.clone()).unwrap_or_default()
    }
}

impl SegmentStepper for RecordingStepper {
    fn advance(&self, job: &StreamJob) -> Result<(), String> {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.push(job.clone());
        }
        if self.fail_on.as_deref() == Some(job.key.as_str()) {
            return Err(format!("refusing to advance {}", job.key));
        }
        Ok(())
    }
}
