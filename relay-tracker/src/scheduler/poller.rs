//! Status poller
//!
//! Drives each tracked job through `queued → running → {succeeded | failed}`
//! by querying the control plane. Every job gets its own task with its own
//! cancellation token; tasks never wait on each other and report back only
//! through registry updates.

use chrono::Utc;
use relay_core::domain::job::{Job, JobPatch, JobStatus};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::registry::{Registry, RegistryError};
use crate::repository::StatusRepository;

/// How a job's poll task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    Failed(String),
    TimedOut,
    Cancelled,
}

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<PollOutcome>,
}

/// Spawns and supervises one poll task per tracked job
pub struct StatusPoller {
    registry: Arc<Registry>,
    repository: Arc<dyn StatusRepository>,
    poll_interval: Duration,
    default_max_wait: Duration,
    tasks: Mutex<HashMap<String, PollTask>>,
}

impl StatusPoller {
    /// Creates a new status poller
    pub fn new(
        registry: Arc<Registry>,
        repository: Arc<dyn StatusRepository>,
        poll_interval: Duration,
        default_max_wait: Duration,
    ) -> Self {
        Self {
            registry,
            repository,
            poll_interval,
            default_max_wait,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    fn tasks(&self) -> std::sync::MutexGuard<'_, HashMap<String, PollTask>> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Starts polling the registered job `job_id`
    ///
    /// The deadline is the job's creation time plus its own wait ceiling
    /// (or the poller default). Returns `Ok(false)` if the job is already
    /// terminal or already being watched.
    ///
    /// Tasks that already finished are dropped here, so `wait` returns
    /// `None` for them afterwards; their final state stays in the registry.
    pub fn watch(&self, job_id: &str) -> Result<bool, RegistryError> {
        let job = self.registry.get(job_id)?;
        if job.is_terminal() {
            debug!("Job {} is already {}, not watching", job_id, job.status);
            return Ok(false);
        }

        let mut tasks = self.tasks();
        tasks.retain(|_, t| !t.handle.is_finished());
        if tasks.contains_key(job_id) {
            return Ok(false);
        }

        let max_wait = job
            .max_wait_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_max_wait);
        let deadline = deadline_after(remaining_wait(&job, max_wait));

        let cancel = CancellationToken::new();
        let cycle = PollCycle {
            job_id: job.id.clone(),
            max_wait,
            deadline,
            poll_interval: self.poll_interval,
            registry: Arc::clone(&self.registry),
            repository: Arc::clone(&self.repository),
            cancel: cancel.clone(),
        };

        info!(
            "Watching job {} (interval: {:?}, max wait: {:?})",
            job.id, self.poll_interval, max_wait
        );
        let handle = tokio::spawn(cycle.run());
        tasks.insert(job.id, PollTask { cancel, handle });

        Ok(true)
    }

    /// Starts polling every non-terminal job in the registry
    ///
    /// Used after a restart to resume observing jobs submitted earlier.
    /// Returns how many tasks were started.
    pub fn resume_pending(&self) -> usize {
        let mut started = 0;
        for job in self.registry.pending() {
            match self.watch(&job.id) {
                Ok(true) => started += 1,
                Ok(false) => {}
                Err(e) => warn!("Could not resume job {}: {}", job.id, e),
            }
        }
        if started > 0 {
            info!("Resumed polling for {} job(s)", started);
        }
        started
    }

    pub fn is_watching(&self, job_id: &str) -> bool {
        self.tasks()
            .get(job_id)
            .is_some_and(|t| !t.handle.is_finished())
    }

    /// Stops polling `job_id`; other jobs are unaffected
    ///
    /// The job keeps whatever status it had. Returns `false` if no task
    /// was registered for it.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.tasks().remove(job_id) {
            Some(task) => {
                task.cancel.cancel();
                debug!("Cancelled polling for job {}", job_id);
                true
            }
            None => false,
        }
    }

    /// Stops every poll task
    pub fn cancel_all(&self) {
        let tasks: Vec<(String, PollTask)> = self.tasks().drain().collect();
        for (job_id, task) in tasks {
            task.cancel.cancel();
            debug!("Cancelled polling for job {}", job_id);
        }
    }

    /// Waits for the poll task of `job_id` to finish
    ///
    /// Returns `None` if the job is not being watched.
    pub async fn wait(&self, job_id: &str) -> Option<PollOutcome> {
        let task = self.tasks().remove(job_id)?;
        Some(join(job_id, task.handle).await)
    }

    /// Waits for every poll task currently registered
    pub async fn wait_all(&self) -> Vec<(String, PollOutcome)> {
        let tasks: Vec<(String, PollTask)> = self.tasks().drain().collect();
        let mut outcomes = Vec::with_capacity(tasks.len());
        for (job_id, task) in tasks {
            let outcome = join(&job_id, task.handle).await;
            outcomes.push((job_id, outcome));
        }
        outcomes
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn join(job_id: &str, handle: JoinHandle<PollOutcome>) -> PollOutcome {
    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Poll task for job {} did not complete: {}", job_id, e);
            PollOutcome::Cancelled
        }
    }
}

/// `now + wait`, or a far-future instant when that is not representable
fn deadline_after(wait: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(wait)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Stand-in deadline for wait ceilings too large for `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Time left before `job` exceeds `max_wait`, measured from its creation
fn remaining_wait(job: &Job, max_wait: Duration) -> Duration {
    let elapsed = (Utc::now() - job.created_at).to_std().unwrap_or_default();
    max_wait.saturating_sub(elapsed)
}

/// One job's poll loop
struct PollCycle {
    job_id: String,
    max_wait: Duration,
    deadline: Instant,
    poll_interval: Duration,
    registry: Arc<Registry>,
    repository: Arc<dyn StatusRepository>,
    cancel: CancellationToken,
}

/// What a single wait or query step produced
enum Step<T> {
    Done(T),
    Cancelled,
    Expired,
}

impl PollCycle {
    async fn run(self) -> PollOutcome {
        loop {
            if Instant::now() >= self.deadline {
                return self.time_out();
            }

            let status = match self.step(self.repository.fetch_status(&self.job_id)).await {
                Step::Done(status) => status,
                Step::Cancelled => return PollOutcome::Cancelled,
                Step::Expired => return self.time_out(),
            };

            match status {
                Ok(reply) => match reply.status {
                    JobStatus::Queued | JobStatus::Running => self.record_progress(reply.status),
                    JobStatus::Succeeded => return self.collect_result().await,
                    JobStatus::Failed => {
                        let message = reply
                            .error
                            .filter(|e| !e.trim().is_empty())
                            .unwrap_or_else(|| "Job failed upstream".to_string());
                        return self.finish_failed(message);
                    }
                },
                Err(e) => warn!(
                    "Status check for job {} failed, will retry: {:#}",
                    self.job_id, e
                ),
            }

            match self.pause().await {
                Step::Done(()) => {}
                Step::Cancelled => return PollOutcome::Cancelled,
                Step::Expired => return self.time_out(),
            }
        }
    }

    /// Runs `fut` unless the job is cancelled or its deadline passes first
    async fn step<T>(&self, fut: impl Future<Output = T>) -> Step<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Step::Cancelled,
            result = time::timeout_at(self.deadline, fut) => match result {
                Ok(value) => Step::Done(value),
                Err(_) => Step::Expired,
            },
        }
    }

    /// Sleeps one poll interval, cut short by cancellation or the deadline
    async fn pause(&self) -> Step<()> {
        let wake = Instant::now()
            .checked_add(self.poll_interval)
            .map_or(self.deadline, |wake| wake.min(self.deadline));
        match self.step(time::sleep_until(wake)).await {
            Step::Done(()) if Instant::now() >= self.deadline => Step::Expired,
            other => other,
        }
    }

    fn record_progress(&self, status: JobStatus) {
        match self.registry.update(&self.job_id, &JobPatch::status(status)) {
            Ok(job) => debug!("Job {} is {}", self.job_id, job.status),
            Err(RegistryError::InvalidTransition { from, to, .. }) => {
                debug!(
                    "Ignoring {} report for job {} already {}",
                    to, self.job_id, from
                );
            }
            Err(e) => warn!("Could not record progress of job {}: {}", self.job_id, e),
        }
    }

    /// Fetches the result of a succeeded job, retrying until the deadline
    async fn collect_result(&self) -> PollOutcome {
        loop {
            match self.step(self.repository.fetch_result(&self.job_id)).await {
                Step::Done(Ok(result)) => {
                    self.apply_terminal(&JobPatch::succeeded(result));
                    info!("Job {} succeeded", self.job_id);
                    return PollOutcome::Succeeded;
                }
                Step::Done(Err(e)) => warn!(
                    "Result fetch for job {} failed, will retry: {:#}",
                    self.job_id, e
                ),
                Step::Cancelled => return PollOutcome::Cancelled,
                Step::Expired => return self.result_unavailable(),
            }

            match self.pause().await {
                Step::Done(()) => {}
                Step::Cancelled => return PollOutcome::Cancelled,
                Step::Expired => return self.result_unavailable(),
            }
        }
    }

    fn finish_failed(&self, message: String) -> PollOutcome {
        warn!("Job {} failed: {}", self.job_id, message);
        self.apply_terminal(&JobPatch::failed(message.clone()));
        PollOutcome::Failed(message)
    }

    fn result_unavailable(&self) -> PollOutcome {
        let message = format!(
            "Job succeeded upstream but its result could not be retrieved within {}s",
            self.max_wait.as_secs()
        );
        self.finish_failed(message)
    }

    fn time_out(&self) -> PollOutcome {
        let message = format!(
            "Timed out after {}s waiting for the job to finish",
            self.max_wait.as_secs()
        );
        warn!("Job {}: {}", self.job_id, message);
        self.apply_terminal(&JobPatch::failed(message));
        PollOutcome::TimedOut
    }

    fn apply_terminal(&self, patch: &JobPatch) {
        if let Err(e) = self.registry.update(&self.job_id, patch) {
            error!("Could not record final state of job {}: {}", self.job_id, e);
        }
    }
}
