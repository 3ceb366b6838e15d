use crate::{CreateJobRequest, JobId, RequestSeq};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the status of `job_id`; the completion must echo `seq`.
    FetchStatus { job_id: JobId, seq: RequestSeq },
    /// Drop every status request still in flight.
    AbortStatusFetches,
    LoadJobs,
    CreateJob(CreateJobRequest),
    CancelJob { job_id: JobId },
    FetchScript { job_id: JobId },
    FetchAssets { job_id: JobId },
    /// Persist the selection so the next run resumes it.
    RememberSelection { job_id: Option<JobId> },
}
