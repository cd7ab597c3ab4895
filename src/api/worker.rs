//! Background thread computing landmark placements

use crate::algorithms::geo_transform::{place, Placement};
use crate::core::GeodeticPoint;
use crate::store::{LandmarkRequest, RequestTicket};
use crossbeam_channel::{unbounded, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// Placement work tagged with the origin epoch it was computed against
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub ticket: RequestTicket,
    pub request: LandmarkRequest,
    pub origin: GeodeticPoint,
    pub epoch: u64,
    pub max_anchor_distance: f64,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub ticket: RequestTicket,
    pub request: LandmarkRequest,
    pub epoch: u64,
    pub placement: Placement,
}

impl TransformJob {
    pub fn compute(self) -> TransformResult {
        let placement = place(&self.origin, &self.request.location, self.max_anchor_distance);
        TransformResult {
            ticket: self.ticket,
            request: self.request,
            epoch: self.epoch,
            placement,
        }
    }
}

/// Computes placements off the owner thread and posts results back as messages
#[derive(Debug)]
pub struct TransformWorker {
    jobs: Option<Sender<TransformJob>>,
    handle: Option<JoinHandle<()>>,
    submitted: u64,
}

impl TransformWorker {
    /// Start the worker; each result is wrapped by `wrap` and sent to `sink`
    pub fn spawn<M, F>(sink: Sender<M>, wrap: F) -> Self
    where
        M: Send + 'static,
        F: Fn(TransformResult) -> M + Send + 'static,
    {
        let (jobs_tx, jobs_rx) = unbounded::<TransformJob>();
        let handle = thread::spawn(move || {
            for job in jobs_rx.iter() {
                trace!(ticket = %job.ticket, epoch = job.epoch, "Computing placement");
                if sink.send(wrap(job.compute())).is_err() {
                    debug!("Result sink closed, stopping transform worker");
                    break;
                }
            }
        });

        Self {
            jobs: Some(jobs_tx),
            handle: Some(handle),
            submitted: 0,
        }
    }

    /// Queue a job; hands it back when the worker is no longer running
    pub fn submit(&mut self, job: TransformJob) -> Result<(), TransformJob> {
        let Some(jobs) = self.jobs.as_ref() else {
            return Err(job);
        };
        jobs.send(job).map_err(|rejected| rejected.into_inner())?;
        self.submitted += 1;
        Ok(())
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Finish queued jobs and stop the thread
    pub fn shutdown(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TransformWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ContentHandle, Metadata};
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn job(ticket: u64, epoch: u64) -> TransformJob {
        TransformJob {
            ticket: RequestTicket(ticket),
            request: LandmarkRequest::new(Metadata::new(), ContentHandle(ticket), GeodeticPoint::new(45.0003, -75.0)),
            origin: GeodeticPoint::new(45.0, -75.0),
            epoch,
            max_anchor_distance: 80.0,
        }
    }

    #[test]
    fn test_worker_posts_results_in_order() {
        let (tx, rx) = unbounded();
        let mut worker = TransformWorker::spawn(tx, |result| result);

        worker.submit(job(1, 3)).unwrap();
        worker.submit(job(2, 3)).unwrap();
        assert_eq!(worker.submitted(), 2);

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first.ticket, RequestTicket(1));
        assert_eq!(second.ticket, RequestTicket(2));
        assert_eq!(first.epoch, 3);
        assert_relative_eq!(first.placement.distance, 33.36, epsilon = 0.01);
    }

    #[test]
    fn test_submit_after_shutdown_returns_job() {
        let (tx, _rx) = unbounded();
        let mut worker = TransformWorker::spawn(tx, |result| result);
        worker.shutdown();

        let rejected = worker.submit(job(9, 1)).unwrap_err();
        assert_eq!(rejected.ticket, RequestTicket(9));
        assert!(!worker.is_running());
    }
}
