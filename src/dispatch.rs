//! Fixed-size worker pool that renders every job exactly once
//!
//! Jobs sit in a mutex-guarded queue. Each worker thread pops one job at a
//! time, renders it, checks the screenshot exists and records the outcome in
//! its own tally. Tallies are summed after all workers join, so the only
//! state shared during a run is the queue itself.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{error, info};
use serde::{Serialize, Serializer};

use crate::{Error, Job, Renderer, Result};

/// Whether a job produced its screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    Failed { reason: String },
}

/// Result of one attempted job
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    /// `page--screen`
    pub job: String,
    pub output: PathBuf,
    #[serde(flatten)]
    pub status: JobStatus,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}

/// Aggregate result of a dispatch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// Wall-clock time of the whole `dispatch` call
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs")]
    pub elapsed: Duration,
    /// Number of jobs that failed
    pub error_count: usize,
    /// One entry per attempted job, in completion order per worker
    pub outcomes: Vec<JobOutcome>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }

    fn absorb(&mut self, tally: WorkerTally) {
        self.error_count += tally.errors;
        self.outcomes.extend(tally.outcomes);
    }
}

fn as_secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[derive(Default)]
struct WorkerTally {
    errors: usize,
    outcomes: Vec<JobOutcome>,
}

/// Runs jobs across a fixed number of worker threads
pub struct Dispatcher<R> {
    renderer: R,
    output_dir: PathBuf,
    worker_count: usize,
}

impl<R: Renderer> Dispatcher<R> {
    /// Create a dispatcher writing screenshots into `output_dir`.
    ///
    /// `worker_count` must be at least one.
    pub fn new(renderer: R, output_dir: impl Into<PathBuf>, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(Error::Config("worker count must be at least 1".to_string()));
        }
        Ok(Self {
            renderer,
            output_dir: output_dir.into(),
            worker_count,
        })
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Render every job and return once all of them have been attempted.
    ///
    /// Per-job failures are logged and counted; they never abort the batch
    /// and never surface as an error from this call.
    pub fn dispatch(&self, jobs: Vec<Job>) -> DispatchReport {
        let start = Instant::now();
        let threads = self.worker_count.min(jobs.len());
        let queue = Mutex::new(VecDeque::from(jobs));
        let mut report = DispatchReport::default();

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(threads);
            for i in 0..threads {
                let spawned = thread::Builder::new()
                    .name(format!("render-{}", i))
                    .spawn_scoped(s, || self.worker_loop(&queue));
                match spawned {
                    Ok(h) => handles.push(h),
                    Err(e) => error!("failed to spawn render worker {}: {}", i, e),
                }
            }
            for h in handles {
                match h.join() {
                    Ok(tally) => report.absorb(tally),
                    Err(_) => error!("render worker panicked"),
                }
            }
        });

        // Only non-empty if no worker thread could be started at all
        if !queue.lock().unwrap_or_else(PoisonError::into_inner).is_empty() {
            report.absorb(self.worker_loop(&queue));
        }

        report.elapsed = start.elapsed();
        report
    }

    fn worker_loop(&self, queue: &Mutex<VecDeque<Job>>) -> WorkerTally {
        let mut tally = WorkerTally::default();
        loop {
            let next = queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            let Some(job) = next else { break };

            let label = job.label();
            let output = job.output_path(&self.output_dir);
            info!("{}: starting", label);

            let started = Instant::now();
            let result = panic::catch_unwind(AssertUnwindSafe(|| self.run_job(&job, &output)))
                .unwrap_or_else(|p| Err(Error::Other(panic_message(p))));

            let status = match result {
                Ok(()) => {
                    info!("{}: success", label);
                    JobStatus::Succeeded
                }
                Err(e) => {
                    error!("{}: FAILED ({})", label, e);
                    tally.errors += 1;
                    JobStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            tally.outcomes.push(JobOutcome {
                job: label,
                output,
                status,
                elapsed: started.elapsed(),
            });
        }
        tally
    }

    fn run_job(&self, job: &Job, output: &Path) -> Result<()> {
        remove_stale(output)?;
        self.renderer.render(job, output)?;
        if !output.exists() {
            return Err(Error::MissingOutput(output.display().to_string()));
        }
        Ok(())
    }
}

/// Delete a leftover screenshot from an earlier run so it cannot pass the
/// existence check in place of a fresh one.
fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send + 'static>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .map(|m| format!("renderer panicked: {}", m))
        .unwrap_or_else(|| "renderer panicked".to_string())
}
