use crate::{
    AssetBundle, CreateJobRequest, FetchFailure, Job, JobId, JobStatusSnapshot, Millis,
    RequestSeq, Script,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User selected a job to observe.
    JobSelected { job_id: JobId, now: Millis },
    /// User asked for an immediate status fetch.
    RefreshClicked,
    /// Timer tick; drives scheduled polls.
    Tick { now: Millis },
    /// A status request completed.
    StatusFetched {
        job_id: JobId,
        seq: RequestSeq,
        result: Result<JobStatusSnapshot, FetchFailure>,
        now: Millis,
    },
    /// The observing view is torn down.
    ViewClosed,
    LoadJobsClicked,
    JobsLoaded(Result<Vec<Job>, FetchFailure>),
    /// User submitted the creation form.
    PromptSubmitted(CreateJobRequest),
    JobCreated {
        result: Result<JobId, FetchFailure>,
        now: Millis,
    },
    /// User asked to cancel the observed job.
    CancelClicked,
    CancelCompleted {
        job_id: JobId,
        result: Result<String, FetchFailure>,
    },
    ScriptRequested,
    ScriptLoaded {
        job_id: JobId,
        result: Result<Script, FetchFailure>,
    },
    AssetsRequested,
    AssetsLoaded {
        job_id: JobId,
        result: Result<AssetBundle, FetchFailure>,
    },
    BannerDismissed,
    /// Fallback for placeholder wiring.
    NoOp,
}
