//! Job scheduler interface.
//!
//! The dispatch core never decides *when* jobs run. It only forwards job
//! management calls to whichever scheduler the host application wires in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::SchedulerResult;

/// The body of a scheduled job.
pub type JobFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// When a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Fire once after the given delay.
    Once(Duration),
    /// Fire repeatedly with the given period.
    Interval(Duration),
    /// Fire on a cron expression.
    Cron(String),
}

/// A job submitted to the scheduler.
#[derive(Clone)]
pub struct JobSpec {
    pub id: String,
    pub trigger: Trigger,
    pub run: JobFn,
}

impl JobSpec {
    /// Creates a job from an async closure.
    pub fn new<F, Fut>(id: impl Into<String>, trigger: Trigger, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            id: id.into(),
            trigger,
            run: Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(f()) }),
        }
    }
}

impl std::fmt::Debug for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSpec")
            .field("id", &self.id)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

/// Public view of a scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub id: String,
    pub trigger: Trigger,
    pub paused: bool,
}

/// Job scheduler collaborator.
#[async_trait]
pub trait Scheduler: Send + Sync + 'static {
    async fn add_job(&self, job: JobSpec) -> SchedulerResult<JobInfo>;

    async fn pause_job(&self, id: &str) -> SchedulerResult<()>;

    async fn resume_job(&self, id: &str) -> SchedulerResult<()>;

    async fn remove_job(&self, id: &str) -> SchedulerResult<()>;

    async fn get_job(&self, id: &str) -> SchedulerResult<Option<JobInfo>>;

    async fn get_jobs(&self) -> SchedulerResult<Vec<JobInfo>>;
}

/// A shared scheduler trait object.
pub type BoxedScheduler = Arc<dyn Scheduler>;
