//! Runs a slow progress backend on its own thread.
//!
//! Saves are queued and return at once so a slow server never stalls key
//! handling. Loads go through the same queue and wait for their answer,
//! which puts them behind any pending save of the same slot.

use std::sync::mpsc;
use std::thread;

use crate::store::schema::SlotProgress;
use crate::store::{ProgressBackend, StoreError};

enum Job {
    Save {
        slot: u8,
        progress: SlotProgress,
    },
    Load {
        slot: u8,
        reply: mpsc::Sender<Result<SlotProgress, StoreError>>,
    },
}

pub struct QueuedBackend {
    label: &'static str,
    jobs: Option<mpsc::Sender<Job>>,
    failures: mpsc::Receiver<StoreError>,
    worker: Option<thread::JoinHandle<()>>,
}

impl QueuedBackend {
    pub fn spawn(inner: Box<dyn ProgressBackend + Send>) -> Self {
        let label = inner.label();
        let (jobs, queue) = mpsc::channel::<Job>();
        let (failure_tx, failures) = mpsc::channel();

        let worker = thread::spawn(move || {
            for job in queue {
                match job {
                    Job::Save { slot, progress } => {
                        if let Err(e) = inner.save_progress(slot, &progress) {
                            tracing::warn!(slot, error = %e, "background save failed");
                            let _ = failure_tx.send(e);
                        }
                    }
                    Job::Load { slot, reply } => {
                        let _ = reply.send(inner.load_progress(slot));
                    }
                }
            }
            tracing::debug!("save queue drained");
        });

        Self {
            label,
            jobs: Some(jobs),
            failures,
            worker: Some(worker),
        }
    }

    fn send(&self, job: Job) -> Result<(), StoreError> {
        let jobs = self.jobs.as_ref().ok_or(StoreError::WorkerStopped)?;
        jobs.send(job).map_err(|_| StoreError::WorkerStopped)
    }
}

impl ProgressBackend for QueuedBackend {
    fn label(&self) -> &'static str {
        self.label
    }

    fn load_progress(&self, slot: u8) -> Result<SlotProgress, StoreError> {
        let (reply, answer) = mpsc::channel();
        self.send(Job::Load { slot, reply })?;
        answer.recv().map_err(|_| StoreError::WorkerStopped)?
    }

    fn save_progress(&self, slot: u8, progress: &SlotProgress) -> Result<(), StoreError> {
        self.send(Job::Save {
            slot,
            progress: progress.clone(),
        })
    }

    fn take_failures(&self) -> Vec<StoreError> {
        self.failures.try_iter().collect()
    }
}

impl Drop for QueuedBackend {
    /// Closing the queue lets the worker finish pending saves before exit.
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
