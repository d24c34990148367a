//! Where a unit of work came from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Request/job metadata supplied by the framework that started a unit of work.
///
/// Only used to choose how an unscoped read is reported: unattended work
/// fails, interactive work is logged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkOrigin {
    /// An interactive request, usually behind an outer authorization layer.
    Interactive {
        /// Request correlation ID, if the web framework assigned one.
        request_id: Option<String>,
    },

    /// An unattended background job.
    BackgroundJob {
        /// The queue the job was taken from.
        queue: String,
        /// The job ID, if the job framework exposes one.
        job_id: Option<String>,
    },

    /// No framework attributed this work. Treated like an interactive request.
    #[default]
    Unattributed,
}

impl WorkOrigin {
    /// An interactive request without a correlation ID.
    pub fn interactive() -> Self {
        WorkOrigin::Interactive { request_id: None }
    }

    /// An interactive request with the given correlation ID.
    pub fn request(request_id: impl Into<String>) -> Self {
        WorkOrigin::Interactive {
            request_id: Some(request_id.into()),
        }
    }

    /// A background job taken from the given queue.
    pub fn background_job(queue: impl Into<String>) -> Self {
        WorkOrigin::BackgroundJob {
            queue: queue.into(),
            job_id: None,
        }
    }

    /// Attaches a job ID. Has no effect on non-job origins.
    pub fn with_job_id(mut self, id: impl Into<String>) -> Self {
        if let WorkOrigin::BackgroundJob { job_id, .. } = &mut self {
            *job_id = Some(id.into());
        }
        self
    }

    /// Returns `true` for background jobs.
    pub fn is_unattended(&self) -> bool {
        matches!(self, WorkOrigin::BackgroundJob { .. })
    }

    /// Returns the job queue, if this is a background job.
    pub fn queue(&self) -> Option<&str> {
        match self {
            WorkOrigin::BackgroundJob { queue, .. } => Some(queue),
            _ => None,
        }
    }

    /// Returns the job ID, if this is a background job run that has one.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            WorkOrigin::BackgroundJob { job_id, .. } => job_id.as_deref(),
            _ => None,
        }
    }

    /// Short label used in log fields.
    pub fn label(&self) -> &'static str {
        match self {
            WorkOrigin::Interactive { .. } => "interactive",
            WorkOrigin::BackgroundJob { .. } => "background_job",
            WorkOrigin::Unattributed => "unattributed",
        }
    }
}

impl fmt::Display for WorkOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkOrigin::Interactive {
                request_id: Some(id),
            } => write!(f, "interactive({})", id),
            WorkOrigin::BackgroundJob { queue, .. } => write!(f, "background_job({})", queue),
            other => write!(f, "{}", other.label()),
        }
    }
}
