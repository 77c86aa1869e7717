//! Reference driver that walks an [`ExecutionPlan`] on worker threads.
//!
//! Each stream gets one worker fed over a crossbeam channel. For every
//! time slice the driver hands each busy stream its job, then waits for
//! all replies before moving on, so a job never starts before the slice
//! that finished its dependencies has been fully acknowledged. Workers
//! exit when their task channel closes.

use std::thread;

use crossbeam_channel::{Receiver, Sender};
use polyplan_core::DispatchError;

use crate::plan::{ExecutionPlan, StreamJob};

/// Numeric kernel that advances one propagator over a segment range.
///
/// Implementations are shared across all worker threads. Jobs that run
/// in the same slice always name distinct propagators.
pub trait SegmentStepper: Sync {
    /// Advance `job.key` over `job.segment_from..=job.segment_to`. When
    /// [`StreamJob::is_first`] holds the initial value must be set first.
    ///
    /// # Errors
    ///
    /// A human-readable reason; the driver reports it as
    /// [`DispatchError::StepFailed`] and stops.
    fn advance(&self, job: &StreamJob) -> Result<(), String>;
}

impl<F> SegmentStepper for F
where
    F: Fn(&StreamJob) -> Result<(), String> + Sync,
{
    fn advance(&self, job: &StreamJob) -> Result<(), String> {
        self(job)
    }
}

struct Task {
    job: StreamJob,
    reply: Sender<Result<(), DispatchError>>,
}

fn worker_loop(tasks: Receiver<Task>, stepper: &dyn SegmentStepper) {
    while let Ok(task) = tasks.recv() {
        let result = stepper
            .advance(&task.job)
            .map_err(|reason| DispatchError::StepFailed {
                stream: task.job.stream,
                key: task.job.key.to_string(),
                reason,
            });
        let _ = task.reply.send(result);
    }
}

/// Execute `plan` with one worker thread per stream.
///
/// # Errors
///
/// The first [`DispatchError`] of the earliest failing slice. Later
/// slices are not started.
pub fn run_plan(plan: &ExecutionPlan, stepper: &dyn SegmentStepper) -> Result<(), DispatchError> {
    thread::scope(|scope| {
        let mut senders = Vec::with_capacity(plan.n_streams());
        for _ in 0..plan.n_streams() {
            let (tx, rx) = crossbeam_channel::unbounded::<Task>();
            scope.spawn(move || worker_loop(rx, stepper));
            senders.push(tx);
        }

        for slice in plan.slices() {
            tracing::trace!(
                start = slice.start,
                end = slice.end,
                jobs = slice.jobs.len(),
                "dispatching slice"
            );
            let mut pending = Vec::with_capacity(slice.jobs.len());
            for job in &slice.jobs {
                let stream = job.stream;
                let sender = senders
                    .get(stream.index())
                    .ok_or(DispatchError::WorkerLost { stream })?;
                let (reply, done) = crossbeam_channel::bounded(1);
                sender
                    .send(Task {
                        job: job.clone(),
                        reply,
                    })
                    .map_err(|_| DispatchError::WorkerLost { stream })?;
                pending.push((stream, done));
            }
            let mut first_error = None;
            for (stream, done) in pending {
                let result = done
                    .recv()
                    .unwrap_or(Err(DispatchError::WorkerLost { stream }));
                if let Err(e) = result {
                    first_error.get_or_insert(e);
                }
            }
            if let Some(e) = first_error {
                return Err(e);
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use polyplan_catalog::{Catalog, PlanOptions, Polymer, PolymerInput};
    use polyplan_core::{MonomerType, PolymerId};
    use polyplan_graph::BlockInput;

    use crate::schedule::Scheduler;

    fn plan(n_streams: usize) -> ExecutionPlan {
        let bonds = ["A", "B"]
            .into_iter()
            .map(|m| (MonomerType::new(m).unwrap(), 1.0))
            .collect();
        let input = PolymerInput::new(
            1.0,
            vec![BlockInput::new("A", 0.5, 0, 1), BlockInput::new("B", 0.5, 1, 2)],
        );
        let polymer = Polymer::build(PolymerId(0), &input, 0.25, &bonds).unwrap();
        let mut catalog = Catalog::new();
        catalog.add_polymer(&polymer, PlanOptions::default()).unwrap();
        Scheduler::new(n_streams).unwrap().plan(&catalog).unwrap()
    }

    #[test]
    fn every_job_is_run_once() {
        let plan = plan(2);
        let seen = Mutex::new(Vec::new());
        let stepper = |job: &StreamJob| {
            seen.lock()
                .unwrap()
                .push((job.key.to_string(), job.segment_from, job.segment_to));
            Ok::<(), String>(())
        };
        run_plan(&plan, &stepper).unwrap();
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        let expected_jobs: usize = plan.slices().iter().map(|s| s.jobs.len()).sum();
        assert_eq!(seen.len(), expected_jobs);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn stepper_failure_stops_the_run() {
        let plan = plan(1);
        let calls = Mutex::new(0usize);
        let stepper = |job: &StreamJob| {
            *calls.lock().unwrap() += 1;
            if job.key.height() == 1 {
                Err("diverged".to_string())
            } else {
                Ok(())
            }
        };
        match run_plan(&plan, &stepper) {
            Err(DispatchError::StepFailed { reason, .. }) => assert_eq!(reason, "diverged"),
            other => panic!("expected StepFailed, got {other:?}"),
        }
        assert_eq!(*calls.lock().unwrap(), 3);
    }
}
